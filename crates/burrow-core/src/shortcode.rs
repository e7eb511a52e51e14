use crate::base58::Base58Code;
use crate::error::CoreError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smol_str::SmolStr;
use std::fmt;
use std::str::FromStr;

pub const MIN_LENGTH: usize = 3;
pub const MAX_LENGTH: usize = 32;

/// Identifier of a mapping, the last path segment of a short URL.
///
/// Parsed codes are `[A-Za-z0-9_-]{3,32}`. Generated codes skip the check;
/// both kinds compare equal when their text matches.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ShortCode(SmolStr);

impl ShortCode {
    pub fn new(code: impl AsRef<str>) -> Result<Self, CoreError> {
        code.as_ref().parse()
    }

    /// For generator output that is valid by construction.
    pub fn new_unchecked(code: impl AsRef<str>) -> Self {
        Self(SmolStr::new(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `base_url` joined with the code, tolerating a trailing slash.
    pub fn to_url(&self, base_url: &str) -> String {
        let base = base_url.strip_suffix('/').unwrap_or(base_url);
        format!("{base}/{}", self.0)
    }
}

fn is_code_char(c: char) -> bool {
    matches!(c, 'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_')
}

impl FromStr for ShortCode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some((position, found)) = s.char_indices().find(|&(_, c)| !is_code_char(c)) {
            return Err(CoreError::ShortCodeCharacter { found, position });
        }
        // Only ASCII is left, so bytes == chars.
        if !(MIN_LENGTH..=MAX_LENGTH).contains(&s.len()) {
            return Err(CoreError::ShortCodeLength {
                len: s.len(),
                min: MIN_LENGTH,
                max: MAX_LENGTH,
            });
        }
        Ok(Self(SmolStr::new(s)))
    }
}

impl From<Base58Code> for ShortCode {
    fn from(code: Base58Code) -> Self {
        Self(code.into_inner())
    }
}

impl AsRef<str> for ShortCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShortCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for ShortCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ShortCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
