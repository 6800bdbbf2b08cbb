//! The four calculation strategies.
//!
//! Each strategy is a pure function of its integer input. [`evaluate`] adds the paced blocking delay on top and is meant to run on a blocking thread.

mod pacing;
pub use pacing::{Pacing, PacingTable};

use std::thread;

use compgrid_model::Symbol;

/// Convergence tolerance of the Newton square root.
pub const SQRT_TOLERANCE: f64 = 1e-4;
/// Iteration cap of the Newton square root.
pub const SQRT_MAX_ITERATIONS: u32 = 10;

/// Value of a strategy together with the number of loop steps it took.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub value: f64,
    pub steps: u32,
}

/// Run the strategy for `symbol`, blocking the current thread for the paced duration.
pub fn evaluate(symbol: Symbol, input: i32, pacing: &PacingTable) -> f64 {
    let pace = pacing.for_symbol(symbol);
    pause(pace.warmup(input));

    let Evaluation { value, steps } = compute(symbol, input);
    pause(pace.per_step.saturating_mul(steps));
    value
}

/// Pure dispatch, no pacing.
pub fn compute(symbol: Symbol, input: i32) -> Evaluation {
    match symbol {
        Symbol::Factorial => factorial(input),
        Symbol::Fibonacci => fibonacci(input),
        Symbol::Primality => primality(input),
        Symbol::SquareRoot => square_root(input),
    }
}

/// `1` for `n <= 1`, otherwise `1·2·…·n` (saturates to `inf` past `170!`).
pub fn factorial(n: i32) -> Evaluation {
    let mut value = 1.0_f64;
    let mut steps = 0;
    for i in 1..=n {
        steps += 1;
        value *= f64::from(i);
        if value.is_infinite() {
            steps = n.unsigned_abs();
            break;
        }
    }
    Evaluation { value, steps }
}

/// `n` for `n <= 1`, otherwise the standard recurrence with `F(0) = 0`, `F(1) = 1`.
pub fn fibonacci(n: i32) -> Evaluation {
    if n <= 1 {
        return Evaluation {
            value: f64::from(n),
            steps: 0,
        };
    }
    let (mut prev, mut current) = (0.0_f64, 1.0_f64);
    let mut steps = 0;
    for _ in 2..=n {
        steps += 1;
        let next = prev + current;
        prev = current;
        current = next;
        if current.is_infinite() {
            steps = n.unsigned_abs() - 1;
            break;
        }
    }
    Evaluation {
        value: current,
        steps,
    }
}

/// `1` when `n` is prime, `0` otherwise (including every `n <= 1`).
///
/// Trial division up to `sqrt(n)`; each divisor tried is one step.
pub fn primality(n: i32) -> Evaluation {
    if n <= 1 {
        return Evaluation {
            value: 0.0,
            steps: 0,
        };
    }
    let n = i64::from(n);
    let mut steps = 0;
    let mut divisor = 2_i64;
    while divisor * divisor <= n {
        steps += 1;
        if n % divisor == 0 {
            return Evaluation { value: 0.0, steps };
        }
        divisor += 1;
    }
    Evaluation { value: 1.0, steps }
}

/// `n` itself for `n <= 1`, otherwise Newton's method started at `n`.
///
/// Stops once two successive estimates are within [`SQRT_TOLERANCE`] or after [`SQRT_MAX_ITERATIONS`], returning the last estimate kept.
pub fn square_root(n: i32) -> Evaluation {
    if n <= 1 {
        return Evaluation {
            value: f64::from(n),
            steps: 0,
        };
    }
    let input = f64::from(n);
    let mut x = input;
    let mut steps = 0;
    for _ in 0..SQRT_MAX_ITERATIONS {
        steps += 1;
        let root = 0.5 * (x + input / x);
        if (root - x).abs() < SQRT_TOLERANCE {
            break;
        }
        x = root;
    }
    Evaluation { value: x, steps }
}

fn pause(duration: std::time::Duration) {
    if !duration.is_zero() {
        thread::sleep(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(symbol: Symbol, n: i32) -> f64 {
        compute(symbol, n).value
    }

    #[test]
    fn factorial_contract() {
        assert_eq!(value(Symbol::Factorial, 0), 1.0);
        assert_eq!(value(Symbol::Factorial, 1), 1.0);
        assert_eq!(value(Symbol::Factorial, 2), 2.0);
        assert_eq!(value(Symbol::Factorial, 5), 120.0);
        assert_eq!(value(Symbol::Factorial, 10), 3_628_800.0);
        assert_eq!(value(Symbol::Factorial, -3), 1.0);
    }

    #[test]
    fn factorial_saturates() {
        assert!(value(Symbol::Factorial, 171).is_infinite());
        assert_eq!(factorial(500).steps, 500);
    }

    #[test]
    fn fibonacci_contract() {
        assert_eq!(value(Symbol::Fibonacci, 0), 0.0);
        assert_eq!(value(Symbol::Fibonacci, 1), 1.0);
        assert_eq!(value(Symbol::Fibonacci, 2), 1.0);
        assert_eq!(value(Symbol::Fibonacci, 5), 5.0);
        assert_eq!(value(Symbol::Fibonacci, 10), 55.0);
        assert_eq!(value(Symbol::Fibonacci, -2), -2.0);
        assert_eq!(fibonacci(10).steps, 9);
    }

    #[test]
    fn primality_contract() {
        assert_eq!(value(Symbol::Primality, 0), 0.0);
        assert_eq!(value(Symbol::Primality, 1), 0.0);
        assert_eq!(value(Symbol::Primality, 2), 1.0);
        assert_eq!(value(Symbol::Primality, 5), 1.0);
        assert_eq!(value(Symbol::Primality, 7), 1.0);
        assert_eq!(value(Symbol::Primality, 8), 0.0);
        assert_eq!(value(Symbol::Primality, 10), 0.0);
        assert_eq!(value(Symbol::Primality, -7), 0.0);
        assert_eq!(value(Symbol::Primality, 2_147_483_647), 1.0);
    }

    #[test]
    fn square_root_contract() {
        assert_eq!(value(Symbol::SquareRoot, 0), 0.0);
        assert_eq!(value(Symbol::SquareRoot, 1), 1.0);
        assert!((value(Symbol::SquareRoot, 2) - 2f64.sqrt()).abs() < 1e-4);
        assert!((value(Symbol::SquareRoot, 5) - 5f64.sqrt()).abs() < 1e-4);
        assert!((value(Symbol::SquareRoot, 10) - 10f64.sqrt()).abs() < 1e-4);
    }

    #[test]
    fn square_root_is_capped() {
        assert!(square_root(1_000_000).steps <= SQRT_MAX_ITERATIONS);
    }

    #[test]
    fn evaluate_without_pacing_matches_compute() {
        let table = PacingTable::instant();
        for symbol in Symbol::ALL {
            for n in [0, 1, 2, 5, 10] {
                assert_eq!(evaluate(symbol, n, &table), compute(symbol, n).value);
            }
        }
    }
}
