use std::time::Duration;

use compgrid_model::Symbol;

/// Largest accepted multiplier for [`PacingTable::scaled`].
const MAX_SCALE: f64 = 1_000.0;

/// Simulated cost of one calculation kind.
///
/// Total blocking time for input `n` over `steps` loop iterations is
/// `base + per_input·max(n, 0) + per_step·steps`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pacing {
    pub base: Duration,
    pub per_input: Duration,
    pub per_step: Duration,
}

impl Pacing {
    pub const fn new(base: Duration, per_input: Duration, per_step: Duration) -> Self {
        Self {
            base,
            per_input,
            per_step,
        }
    }

    /// Time spent before the first step.
    pub fn warmup(&self, input: i32) -> Duration {
        let units = u32::try_from(input.max(0)).unwrap_or(0);
        self.base.saturating_add(self.per_input.saturating_mul(units))
    }

    pub fn is_instant(&self) -> bool {
        self.base.is_zero() && self.per_input.is_zero() && self.per_step.is_zero()
    }

    fn scaled(&self, factor: f64) -> Self {
        Self {
            base: self.base.mul_f64(factor),
            per_input: self.per_input.mul_f64(factor),
            per_step: self.per_step.mul_f64(factor),
        }
    }
}

/// Per-kind pacing used by the service.
///
/// The computation deliberately blocks its handler for the paced duration, so that deadlines on the caller side have something to cut off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacingTable {
    pub factorial: Pacing,
    pub fibonacci: Pacing,
    pub primality: Pacing,
    pub square_root: Pacing,
}

impl PacingTable {
    /// Full-length simulated work.
    pub const fn realistic() -> Self {
        Self {
            factorial: Pacing::new(
                Duration::from_secs(5),
                Duration::from_secs(1),
                Duration::from_millis(500),
            ),
            fibonacci: Pacing::new(
                Duration::from_secs(7),
                Duration::ZERO,
                Duration::from_millis(800),
            ),
            primality: Pacing::new(
                Duration::from_secs(6),
                Duration::ZERO,
                Duration::from_secs(1),
            ),
            square_root: Pacing::new(
                Duration::from_secs(8),
                Duration::ZERO,
                Duration::from_millis(500),
            ),
        }
    }

    /// No simulated work at all.
    pub fn instant() -> Self {
        Self::realistic().scaled(0.0)
    }

    /// Realistic pacing multiplied by `factor`.
    ///
    /// Negative or non-finite factors collapse to `0.0`; factors above `1000` are capped.
    pub fn scaled(&self, factor: f64) -> Self {
        let factor = if factor.is_finite() && factor > 0.0 {
            factor.min(MAX_SCALE)
        } else {
            0.0
        };
        Self {
            factorial: self.factorial.scaled(factor),
            fibonacci: self.fibonacci.scaled(factor),
            primality: self.primality.scaled(factor),
            square_root: self.square_root.scaled(factor),
        }
    }

    pub fn with(mut self, symbol: Symbol, pacing: Pacing) -> Self {
        *self.for_symbol_mut(symbol) = pacing;
        self
    }

    pub fn for_symbol(&self, symbol: Symbol) -> &Pacing {
        match symbol {
            Symbol::Factorial => &self.factorial,
            Symbol::Fibonacci => &self.fibonacci,
            Symbol::Primality => &self.primality,
            Symbol::SquareRoot => &self.square_root,
        }
    }

    fn for_symbol_mut(&mut self, symbol: Symbol) -> &mut Pacing {
        match symbol {
            Symbol::Factorial => &mut self.factorial,
            Symbol::Fibonacci => &mut self.fibonacci,
            Symbol::Primality => &mut self.primality,
            Symbol::SquareRoot => &mut self.square_root,
        }
    }
}

impl Default for PacingTable {
    fn default() -> Self {
        Self::realistic()
    }
}
