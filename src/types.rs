use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Encoding tag carried by every [`crate::file::FileHandle`].
///
/// - `Utf8`: reads are validated; invalid byte sequences fail with
///   [`crate::errors::AssetflowError::Encoding`].
/// - `Binary`: bytes are passed through untouched. Filters that never
///   interpret content (concatenation) declare this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    #[serde(rename = "utf-8", alias = "utf8")]
    Utf8,
    Binary,
}

impl Default for Encoding {
    fn default() -> Self {
        Encoding::Utf8
    }
}

impl Encoding {
    pub fn is_binary(self) -> bool {
        matches!(self, Encoding::Binary)
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encoding::Utf8 => f.write_str("UTF-8"),
            Encoding::Binary => f.write_str("BINARY"),
        }
    }
}

impl FromStr for Encoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(Encoding::Utf8),
            "binary" | "ascii-8bit" => Ok(Encoding::Binary),
            other => Err(format!(
                "invalid encoding: {other} (expected \"utf-8\" or \"binary\")"
            )),
        }
    }
}
