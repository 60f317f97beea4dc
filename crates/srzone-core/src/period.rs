//! Candle period labels.
//!
//! Periods are coarse bucket labels such as `15m` or `1d`. Labels the
//! engine does not know are carried verbatim so that zones can still be
//! computed and stored for them; they only lose period-specific behaviour
//! (boundary scheduling, tailored TTL).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Candle period.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Period {
    M5,
    M15,
    M30,
    H1,
    H4,
    D1,
    /// Any label without dedicated handling.
    Other(String),
}

impl Period {
    /// Canonical label.
    pub fn as_str(&self) -> &str {
        match self {
            Period::M5 => "5m",
            Period::M15 => "15m",
            Period::M30 => "30m",
            Period::H1 => "1h",
            Period::H4 => "4h",
            Period::D1 => "1d",
            Period::Other(label) => label,
        }
    }

    /// Natural candle duration, `None` for unknown labels.
    pub fn duration(&self) -> Option<Duration> {
        let secs = match self {
            Period::M5 => 5 * 60,
            Period::M15 => 15 * 60,
            Period::M30 => 30 * 60,
            Period::H1 => 60 * 60,
            Period::H4 => 4 * 60 * 60,
            Period::D1 => 24 * 60 * 60,
            Period::Other(_) => return None,
        };
        Some(Duration::from_secs(secs))
    }
}

impl From<&str> for Period {
    fn from(label: &str) -> Self {
        match label {
            "5m" => Period::M5,
            "15m" => Period::M15,
            "30m" => Period::M30,
            "1h" => Period::H1,
            "4h" => Period::H4,
            "1d" => Period::D1,
            other => Period::Other(other.to_string()),
        }
    }
}

impl From<String> for Period {
    fn from(label: String) -> Self {
        Period::from(label.as_str())
    }
}

impl From<Period> for String {
    fn from(period: Period) -> Self {
        period.as_str().to_string()
    }
}

impl FromStr for Period {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Period::from(s))
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
