use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// RTCDtlsFingerprint is a certificate fingerprint as carried by
/// `a=fingerprint:<algorithm> <value>` ([RFC 4572] section 5). The media
/// backend computes it; the engine only relays it.
///
/// [RFC 4572]: https://tools.ietf.org/html/rfc4572#section-5
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RTCDtlsFingerprint {
    /// Hash function name from the 'Hash function Textual Names' registry,
    /// e.g. `sha-256`.
    pub algorithm: String,

    pub value: String,
}

impl FromStr for RTCDtlsFingerprint {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.split(' ').collect::<Vec<&str>>()[..] {
            [algorithm, value] if !algorithm.is_empty() && !value.is_empty() => {
                Ok(RTCDtlsFingerprint {
                    algorithm: algorithm.to_owned(),
                    value: value.to_owned(),
                })
            }
            _ => Err(Error::ErrSessionDescriptionInvalidFingerprint),
        }
    }
}

impl fmt::Display for RTCDtlsFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.algorithm, self.value)
    }
}
