use crate::error::Error;
use crate::Generator;
use burrow_core::base58::ALPHABET;
use burrow_core::shortcode::{MAX_LENGTH, MIN_LENGTH};
use burrow_core::ShortCode;
use rand::Rng;

/// Default code length. 58^7 is about 2.2e12 codes.
pub const DEFAULT_LENGTH: usize = 7;

/// Draws each character of the code uniformly from the base58 alphabet.
///
/// Random codes can collide; callers are expected to detect a collision
/// through the store and ask for another code.
#[derive(Debug, Clone)]
pub struct RandomGenerator {
    length: usize,
}

impl RandomGenerator {
    pub fn new(length: usize) -> Result<Self, Error> {
        if !(MIN_LENGTH..=MAX_LENGTH).contains(&length) {
            return Err(Error::InvalidLength {
                length,
                min: MIN_LENGTH,
                max: MAX_LENGTH,
            });
        }
        Ok(Self { length })
    }

    pub fn length(&self) -> usize {
        self.length
    }
}

impl Default for RandomGenerator {
    fn default() -> Self {
        Self {
            length: DEFAULT_LENGTH,
        }
    }
}

impl Generator for RandomGenerator {
    type Output = ShortCode;

    fn generate(&self) -> ShortCode {
        let mut rng = rand::thread_rng();
        let code: String = (0..self.length)
            .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
            .collect();
        ShortCode::new_unchecked(code)
    }
}
