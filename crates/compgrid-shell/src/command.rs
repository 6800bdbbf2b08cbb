use std::str::FromStr;

use compgrid_model::{Argument, DEFAULT_ARGUMENT, GroupId, Slot};

use crate::error::ShellError;

pub(crate) const GROUP_USAGE: &str = "group <index> [limit <time in seconds>]";
pub(crate) const NEW_USAGE: &str = "new <component symbol>";
pub(crate) const RUN_USAGE: &str = "run [argument]";
pub(crate) const STATUS_USAGE: &str = "status <component index>";
pub(crate) const LIMIT_USAGE: &str = "limit <component index|group> <time in seconds>";

/// What a `limit` command applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitTarget {
    Group,
    Component(Slot),
}

/// One parsed shell line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Group { id: GroupId, limit_secs: Option<u64> },
    New(char),
    Run(Argument),
    Status(Slot),
    Summary,
    Interactive,
    Limit { target: LimitTarget, secs: u64 },
    Metrics,
    Help,
    Exit,
    /// First word of a line no command matches.
    Unknown(String),
}

impl FromStr for Command {
    type Err = ShellError;

    /// Words are split on whitespace; the command word is case-insensitive.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some(word) = parts.first() else {
            return Ok(Command::Unknown(String::new()));
        };

        match word.to_ascii_lowercase().as_str() {
            "group" => match parts.as_slice() {
                [_, id] => Ok(Command::Group {
                    id: number("group index", id)?,
                    limit_secs: None,
                }),
                [_, id, kw, secs] if kw.eq_ignore_ascii_case("limit") => Ok(Command::Group {
                    id: number("group index", id)?,
                    limit_secs: Some(seconds(secs)?),
                }),
                _ => Err(ShellError::Usage(GROUP_USAGE)),
            },
            "new" => match parts.as_slice() {
                [_, symbol] => symbol
                    .chars()
                    .next()
                    .map(Command::New)
                    .ok_or(ShellError::Usage(NEW_USAGE)),
                _ => Err(ShellError::Usage(NEW_USAGE)),
            },
            "run" => match parts.as_slice() {
                [_] => Ok(Command::Run(DEFAULT_ARGUMENT)),
                [_, arg] => Ok(Command::Run(number("argument", arg)?)),
                _ => Err(ShellError::Usage(RUN_USAGE)),
            },
            "status" => match parts.as_slice() {
                [_, slot] => Ok(Command::Status(number("component index", slot)?)),
                _ => Err(ShellError::Usage(STATUS_USAGE)),
            },
            "limit" => match parts.as_slice() {
                [_, target, secs] => {
                    let target = if target.eq_ignore_ascii_case("group") {
                        LimitTarget::Group
                    } else {
                        LimitTarget::Component(number("component index", target)?)
                    };
                    Ok(Command::Limit {
                        target,
                        secs: seconds(secs)?,
                    })
                }
                _ => Err(ShellError::Usage(LIMIT_USAGE)),
            },
            "summary" => Ok(Command::Summary),
            "interactive" => Ok(Command::Interactive),
            "metrics" => Ok(Command::Metrics),
            "help" | "?" => Ok(Command::Help),
            "exit" | "quit" => Ok(Command::Exit),
            _ => Ok(Command::Unknown(word.to_string())),
        }
    }
}

fn number<T: FromStr>(what: &'static str, value: &str) -> Result<T, ShellError> {
    value.parse().map_err(|_| ShellError::InvalidNumber {
        what,
        value: value.to_string(),
    })
}

fn seconds(value: &str) -> Result<u64, ShellError> {
    match number("time limit", value)? {
        0 => Err(ShellError::ZeroLimit),
        secs => Ok(secs),
    }
}
