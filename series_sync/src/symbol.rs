//! Instrument identifiers.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::InvalidArgument;

const MAX_LEN: usize = 10;

/// A validated ticker: trimmed, upper-cased, 1 to 10 characters from
/// `A-Z 0-9 . -`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Normalizes and validates `raw`.
    pub fn parse(raw: &str) -> Result<Self, InvalidArgument> {
        let s = raw.trim().to_ascii_uppercase();
        if s.is_empty() {
            return Err(InvalidArgument::new("symbol cannot be empty"));
        }
        if s.len() > MAX_LEN {
            return Err(InvalidArgument::new(format!(
                "symbol '{s}' is longer than {MAX_LEN} characters"
            )));
        }
        if let Some(bad) = s
            .chars()
            .find(|c| !(c.is_ascii_uppercase() || c.is_ascii_digit() || *c == '.' || *c == '-'))
        {
            return Err(InvalidArgument::new(format!(
                "symbol '{s}' contains invalid character '{bad}'"
            )));
        }
        Ok(Self(s))
    }

    /// The normalized ticker.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for Symbol {
    type Err = InvalidArgument;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Symbol {
    type Error = InvalidArgument;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Symbol> for String {
    fn from(value: Symbol) -> Self {
        value.0
    }
}
