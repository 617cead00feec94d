// Anomaly type value object

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyType {
    BuddyPunching,
    SharedDevice,
    ImpossibleTravel,
}

impl AnomalyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnomalyType::BuddyPunching => "buddy_punching",
            AnomalyType::SharedDevice => "shared_device",
            AnomalyType::ImpossibleTravel => "impossible_travel",
        }
    }
}

impl fmt::Display for AnomalyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnomalyType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "buddy_punching" => Ok(AnomalyType::BuddyPunching),
            "shared_device" => Ok(AnomalyType::SharedDevice),
            "impossible_travel" => Ok(AnomalyType::ImpossibleTravel),
            other => Err(DomainError::UnknownVariant {
                kind: "anomaly_type",
                value: other.to_string(),
            }),
        }
    }
}
