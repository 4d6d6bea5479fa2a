//! ABO/Rh blood groups.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// ABO group combined with the Rh factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BloodType {
    APositive,
    ANegative,
    BPositive,
    BNegative,
    AbPositive,
    AbNegative,
    OPositive,
    ONegative,
}

/// Raised when a blood type label is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown blood type '{0}'")]
pub struct UnknownBloodType(pub String);

impl BloodType {
    /// Conventional label, for example `AB-`.
    pub const fn label(self) -> &'static str {
        match self {
            Self::APositive => "A+",
            Self::ANegative => "A-",
            Self::BPositive => "B+",
            Self::BNegative => "B-",
            Self::AbPositive => "AB+",
            Self::AbNegative => "AB-",
            Self::OPositive => "O+",
            Self::ONegative => "O-",
        }
    }
}

impl FromStr for BloodType {
    type Err = UnknownBloodType;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalised = raw.trim().to_ascii_uppercase();
        let parsed = match normalised.as_str() {
            "A+" => Self::APositive,
            "A-" => Self::ANegative,
            "B+" => Self::BPositive,
            "B-" => Self::BNegative,
            "AB+" => Self::AbPositive,
            "AB-" => Self::AbNegative,
            "O+" => Self::OPositive,
            "O-" => Self::ONegative,
            _ => return Err(UnknownBloodType(raw.to_owned())),
        };
        Ok(parsed)
    }
}

impl fmt::Display for BloodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl TryFrom<String> for BloodType {
    type Error = UnknownBloodType;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BloodType> for String {
    fn from(value: BloodType) -> Self {
        value.label().to_owned()
    }
}
