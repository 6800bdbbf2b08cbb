use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Calculation kind a component is bound to.
///
/// The set is closed: the service matches on it exhaustively, so adding a kind is a compile-time change on both sides of the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Symbol {
    /// `F`: product `1·2·…·n`.
    Factorial,
    /// `B`: `F(0) = 0`, `F(1) = 1`, `F(n) = F(n-1) + F(n-2)`.
    Fibonacci,
    /// `P`: `1` when the input is prime, otherwise `0`.
    Primality,
    /// `S`: Newton's method square root.
    SquareRoot,
}

impl Symbol {
    /// Every recognized kind, in wire-letter order `F`, `B`, `P`, `S`.
    pub const ALL: [Symbol; 4] = [
        Symbol::Factorial,
        Symbol::Fibonacci,
        Symbol::Primality,
        Symbol::SquareRoot,
    ];

    /// Letter used on the wire and in the shell.
    pub fn as_char(&self) -> char {
        match self {
            Symbol::Factorial => 'F',
            Symbol::Fibonacci => 'B',
            Symbol::Primality => 'P',
            Symbol::SquareRoot => 'S',
        }
    }

    /// Human-readable name, used as a metrics label and in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Symbol::Factorial => "factorial",
            Symbol::Fibonacci => "fibonacci",
            Symbol::Primality => "primality",
            Symbol::SquareRoot => "sqrt",
        }
    }

    /// Returns `true` if `c` names one of the four kinds.
    pub fn is_valid(c: char) -> bool {
        Symbol::try_from(c).is_ok()
    }
}

impl TryFrom<char> for Symbol {
    type Error = ModelError;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c {
            'F' => Ok(Symbol::Factorial),
            'B' => Ok(Symbol::Fibonacci),
            'P' => Ok(Symbol::Primality),
            'S' => Ok(Symbol::SquareRoot),
            other => Err(ModelError::InvalidSymbol(other)),
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}
