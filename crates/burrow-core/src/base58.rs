use smol_str::SmolStr;
use std::fmt;

/// Bitcoin's base58 alphabet. No `0`, `O`, `I` or `l`, so codes survive
/// being read aloud or copied by hand.
pub const ALPHABET: &[u8; 58] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Raw bytes rendered as base58, as produced by the sequential generator.
///
/// Every value is a valid [`ShortCode`](crate::ShortCode) as long as the
/// input is between 2 and 23 bytes, which the generators guarantee.
///
/// ```
/// use burrow_core::Base58Code;
///
/// let code = Base58Code::encode([0x00, 0x01]);
/// assert_eq!(code.as_str(), "12");
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Base58Code(SmolStr);

impl Base58Code {
    pub fn encode(bytes: impl AsRef<[u8]>) -> Self {
        Self(SmolStr::new(bs58::encode(bytes).into_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub(crate) fn into_inner(self) -> SmolStr {
        self.0
    }
}

impl fmt::Debug for Base58Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Base58Code({})", self.0)
    }
}

impl fmt::Display for Base58Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
