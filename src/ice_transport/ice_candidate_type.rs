use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// RTCIceCandidateType is the `typ` field of a candidate attribute
/// (<https://tools.ietf.org/html/rfc8445#section-5.1.1>).
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RTCIceCandidateType {
    #[default]
    Host,
    Srflx,
    Prflx,
    Relay,
}

impl RTCIceCandidateType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RTCIceCandidateType::Host => "host",
            RTCIceCandidateType::Srflx => "srflx",
            RTCIceCandidateType::Prflx => "prflx",
            RTCIceCandidateType::Relay => "relay",
        }
    }
}

impl FromStr for RTCIceCandidateType {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        [
            RTCIceCandidateType::Host,
            RTCIceCandidateType::Srflx,
            RTCIceCandidateType::Prflx,
            RTCIceCandidateType::Relay,
        ]
        .into_iter()
        .find(|typ| typ.as_str() == raw)
        .ok_or_else(|| Error::ErrIceCandidateParse(format!("unknown candidate type {raw}")))
    }
}

impl fmt::Display for RTCIceCandidateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
