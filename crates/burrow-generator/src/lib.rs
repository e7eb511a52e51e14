//! Short code generators.
//!
//! A [`Generator`] only produces candidates; it never talks to storage.
//! Uniqueness is either structural ([`SeqGenerator`]) or probabilistic
//! ([`RandomGenerator`]), and in both cases the durable store's uniqueness
//! constraint is the final arbiter.

pub mod error;
pub mod random;
pub mod seq;

pub use error::Error;
pub use random::RandomGenerator;
pub use seq::{Obfuscator, SeqGenerator};

use burrow_core::ShortCode;

/// Trait for generating short codes.
///
/// Implementations are pure generators that don't interact with storage.
///
/// Implementations can vary from simple random generators to
/// distributed ID generators (e.g., Snowflake, UUID, etc.)
pub trait Generator: Send + Sync + 'static {
    type Output: Into<ShortCode>;
    /// Generates a candidate short code.
    ///
    /// Two calls should return different codes with overwhelming probability.
    fn generate(&self) -> Self::Output;
}

/// One of the built-in generators, chosen at startup.
#[derive(Debug)]
pub enum CodeGenerator {
    Random(RandomGenerator),
    Seq(SeqGenerator),
}

impl CodeGenerator {
    /// Next sequence number of a [`SeqGenerator`]; `None` for random codes.
    pub fn seq_position(&self) -> Option<u64> {
        match self {
            CodeGenerator::Random(_) => None,
            CodeGenerator::Seq(generator) => Some(generator.position()),
        }
    }
}

impl Generator for CodeGenerator {
    type Output = ShortCode;

    fn generate(&self) -> ShortCode {
        match self {
            CodeGenerator::Random(generator) => generator.generate(),
            CodeGenerator::Seq(generator) => generator.generate().into(),
        }
    }
}

impl From<RandomGenerator> for CodeGenerator {
    fn from(generator: RandomGenerator) -> Self {
        CodeGenerator::Random(generator)
    }
}

impl From<SeqGenerator> for CodeGenerator {
    fn from(generator: SeqGenerator) -> Self {
        CodeGenerator::Seq(generator)
    }
}
