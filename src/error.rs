use std::fmt;

/// Errors surfaced by fallible constructors and number-theoretic utilities.
///
/// Hot-path kernels do not return errors; their preconditions are
/// `debug_assert!`ed and compiled out in release builds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A constructor precondition was violated (length not a power of two,
    /// modulus out of range or not NTT-friendly, invalid root, ...).
    InvalidArguments(String),
    /// `inv` was called on a value not coprime with the modulus.
    NoInverse { value: u64, modulus: u64 },
    /// The random search for a primitive root exhausted its attempt budget.
    NoPrimitiveRoot { degree: u64, modulus: u64 },
    /// The candidate range contained fewer NTT-friendly primes than requested.
    NotEnoughPrimes { found: usize, count: usize },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidArguments(msg) => write!(f, "invalid arguments: {}", msg),
            Error::NoInverse { value, modulus } => {
                write!(f, "{} has no inverse modulo {}", value, modulus)
            }
            Error::NoPrimitiveRoot { degree, modulus } => {
                write!(
                    f,
                    "no primitive {}-th root of unity found modulo {}",
                    degree, modulus
                )
            }
            Error::NotEnoughPrimes { found, count } => {
                write!(f, "found only {} of {} requested primes", found, count)
            }
        }
    }
}

impl std::error::Error for Error {}
