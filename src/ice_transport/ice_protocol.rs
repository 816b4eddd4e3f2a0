use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// RTCIceProtocol is the transport field of a candidate attribute. Remote
/// peers are known to send it upper case, so parsing ignores case.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RTCIceProtocol {
    #[default]
    Udp,
    Tcp,
}

impl FromStr for RTCIceProtocol {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if raw.eq_ignore_ascii_case("udp") {
            Ok(RTCIceProtocol::Udp)
        } else if raw.eq_ignore_ascii_case("tcp") {
            Ok(RTCIceProtocol::Tcp)
        } else {
            Err(Error::ErrIceCandidateParse(format!("unknown transport {raw}")))
        }
    }
}

impl fmt::Display for RTCIceProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RTCIceProtocol::Udp => "udp",
            RTCIceProtocol::Tcp => "tcp",
        })
    }
}
