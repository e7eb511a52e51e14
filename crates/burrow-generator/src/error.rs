use thiserror::Error;

/// Errors returned when constructing a generator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    #[error("invalid code length {length}; expected {min}..={max}")]
    InvalidLength {
        length: usize,
        min: usize,
        max: usize,
    },
    #[error("obfuscation multiplier {0:#x} must be odd")]
    EvenMultiplier(u64),
}
