use std::{sync::Arc, time::Duration};

use tracing::{debug, warn};

use crate::{
    command::{Command, LimitTarget},
    error::ShellError,
    handler::ShellHandler,
};

pub const HELP: &str = "\
Commands:
  group <index> [limit <seconds>]   create or switch to a group, optionally with a time limit
  new <F|B|P|S>                     add a component to the current group
  run [argument]                    run every component of the current group (argument defaults to 5)
  status <component index>          show one component's status
  summary                           show every component of the current group
  limit <index|group> <seconds>     set a component or group time limit
  interactive                       toggle deferred delivery of notifications
  metrics                           print engine metrics
  help                              show this text
  exit                              shut down";

/// Synchronous output of one command.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Reply {
    pub lines: Vec<String>,
    /// The shell should stop reading.
    pub exit: bool,
}

impl Reply {
    fn line(line: impl Into<String>) -> Self {
        Self {
            lines: vec![line.into()],
            exit: false,
        }
    }

    fn lines(lines: Vec<String>) -> Self {
        Self { lines, exit: false }
    }
}

/// Maps shell lines to handler calls and renders their replies.
///
/// Command errors become a single `Error: <message>` line; they never end the shell.
pub struct CommandProcessor<H> {
    handler: Arc<H>,
}

impl<H> CommandProcessor<H>
where
    H: ShellHandler,
{
    pub fn new(handler: Arc<H>) -> Self {
        Self { handler }
    }

    pub async fn process(&self, line: &str) -> Reply {
        if line.trim().is_empty() {
            return Reply::default();
        }

        match line.parse::<Command>() {
            Ok(command) => {
                debug!(?command, "command parsed");
                match self.execute(command).await {
                    Ok(reply) => reply,
                    Err(e) => Reply::line(format!("Error: {e}")),
                }
            }
            Err(e) => Reply::line(format!("Error: {e}")),
        }
    }

    async fn execute(&self, command: Command) -> Result<Reply, ShellError> {
        let h = &self.handler;
        Ok(match command {
            Command::Group { id, limit_secs } => {
                let id = h.switch_group(id).await?;
                let mut lines = vec![format!("Switched to group {id}")];
                if let Some(secs) = limit_secs {
                    h.set_group_limit(Duration::from_secs(secs)).await?;
                    lines.push(format!("Set time limit of {secs} seconds for group {id}"));
                }
                Reply::lines(lines)
            }
            Command::New(symbol) => {
                let (slot, symbol) = h.add_component(symbol).await?;
                Reply::line(format!("Created component {slot} with symbol {symbol}"))
            }
            Command::Run(argument) => {
                let started = h.run(argument).await?;
                let mut lines = Vec::new();
                if let Some(limit) = started.deadline {
                    lines.push(format!("Execution time limit: {} seconds", limit.as_secs()));
                }
                for skipped in &started.report.skipped {
                    warn!(slot = skipped.slot, error = %skipped.error, "component left out of run");
                    lines.push(format!(
                        "Failed to restart component {}: {}",
                        skipped.slot, skipped.error
                    ));
                }
                Reply::lines(lines)
            }
            Command::Status(slot) => {
                let status = h.status(slot).await?;
                Reply::line(format!("Component {slot} status: {status}"))
            }
            Command::Summary => {
                let (id, infos) = h.summary().await?;
                let mut lines = Vec::with_capacity(infos.len() + 1);
                lines.push(format!("Group {id} summary:"));
                lines.extend(infos.iter().map(|i| {
                    format!(
                        "Component {} (Symbol: {}): Status={}, Result={}",
                        i.slot,
                        i.symbol,
                        i.status,
                        i.result_label()
                    )
                }));
                Reply::lines(lines)
            }
            Command::Interactive => {
                let mode = h.toggle_interactive().await;
                let state = if mode.is_deferred() { "ON" } else { "OFF" };
                Reply::line(format!("Interactive mode: {state}"))
            }
            Command::Limit { target, secs } => match target {
                LimitTarget::Group => {
                    let id = h.set_group_limit(Duration::from_secs(secs)).await?;
                    Reply::line(format!("Set time limit of {secs} seconds for group {id}"))
                }
                LimitTarget::Component(slot) => {
                    h.set_component_limit(slot, Duration::from_secs(secs)).await?;
                    Reply::line(format!(
                        "Set time limit of {secs} seconds for component {slot}"
                    ))
                }
            },
            Command::Metrics => {
                let text = h.metrics().await?;
                Reply::lines(text.lines().map(str::to_string).collect())
            }
            Command::Help => Reply::lines(HELP.lines().map(str::to_string).collect()),
            Command::Exit => Reply {
                lines: vec!["Shutting down...".into()],
                exit: true,
            },
            Command::Unknown(word) => Reply::line(format!("Unknown command: {word}")),
        })
    }
}
