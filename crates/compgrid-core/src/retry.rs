use std::time::Duration;

/// Connect-retry policy used when a run (re)opens component channels.
///
/// Delays grow geometrically from `first_delay` by `factor`, capped at `max_delay`.
/// The default is three attempts one second apart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total connect attempts, including the first one.
    pub attempts: u32,
    /// Pause after the first failed attempt.
    pub first_delay: Duration,
    /// Upper bound for any pause.
    pub max_delay: Duration,
    /// Growth factor between consecutive pauses.
    pub factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            first_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(1),
            factor: 1.0,
        }
    }
}

impl RetryPolicy {
    /// `attempts` tries separated by a constant `delay`.
    pub fn fixed(attempts: u32, delay: Duration) -> Self {
        Self {
            attempts,
            first_delay: delay,
            max_delay: delay,
            factor: 1.0,
        }
    }

    /// Pause to take after failed attempt number `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        if exp == 0 || self.factor == 1.0 || !(self.factor.is_finite() && self.factor > 0.0) {
            return self.first_delay.min(self.max_delay);
        }

        let secs = self.first_delay.as_secs_f64() * self.factor.powi(exp);
        if !secs.is_finite() || secs >= self.max_delay.as_secs_f64() {
            return self.max_delay;
        }
        Duration::from_secs_f64(secs.max(0.0))
    }

    /// Attempts actually made; a policy of zero still tries once.
    pub fn effective_attempts(&self) -> u32 {
        self.attempts.max(1)
    }
}
