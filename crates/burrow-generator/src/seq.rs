use crate::error::Error;
use crate::Generator;
use burrow_core::Base58Code;
use std::sync::atomic::{AtomicU64, Ordering};
use typed_builder::TypedBuilder;

const LOWER_40_BITS_MASK: u64 = (1_u64 << 40) - 1;

/// Scrambles a sequence number inside a 40-bit space.
///
/// Multiplying by an odd constant is invertible modulo 2^40 and so is the
/// xor with a fixed mask, so distinct inputs below 2^40 always map to
/// distinct outputs.
#[derive(Debug, Clone, TypedBuilder)]
pub struct Obfuscator {
    #[builder(default = 0x5_DEEC_E66D)]
    multiplier: u64,
    #[builder(default = 0xDEAD_BEEF_CAFE_BABE)]
    mask: u64,
}

impl Obfuscator {
    pub fn multiplier(&self) -> u64 {
        self.multiplier
    }

    pub fn mask(&self) -> u64 {
        self.mask
    }

    pub fn obfuscate(&self, seq: u64) -> [u8; 5] {
        let scrambled = (seq.wrapping_mul(self.multiplier) ^ self.mask) & LOWER_40_BITS_MASK;
        let bytes = scrambled.to_be_bytes();
        [bytes[3], bytes[4], bytes[5], bytes[6], bytes[7]]
    }
}

impl Default for Obfuscator {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Hands out obfuscated, base58-encoded sequence numbers.
///
/// Codes are 5 to 7 characters long and never repeat within one process
/// until the 40-bit counter wraps.
#[derive(Debug)]
pub struct SeqGenerator {
    counter: AtomicU64,
    obfuscator: Obfuscator,
}

impl SeqGenerator {
    pub fn new(obfuscator: Obfuscator) -> Result<Self, Error> {
        Self::with_offset(obfuscator, 0)
    }

    /// Starts counting at `offset`, e.g. to resume after a restart.
    pub fn with_offset(obfuscator: Obfuscator, offset: u64) -> Result<Self, Error> {
        if obfuscator.multiplier % 2 == 0 {
            return Err(Error::EvenMultiplier(obfuscator.multiplier));
        }
        Ok(Self {
            counter: AtomicU64::new(offset),
            obfuscator,
        })
    }

    /// The next sequence number that will be handed out.
    pub fn position(&self) -> u64 {
        self.counter.load(Ordering::Relaxed)
    }
}

impl Generator for SeqGenerator {
    type Output = Base58Code;

    fn generate(&self) -> Base58Code {
        let seq = self.counter.fetch_add(1, Ordering::Relaxed);
        Base58Code::encode(self.obfuscator.obfuscate(seq))
    }
}
