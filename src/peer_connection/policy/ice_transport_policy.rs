use std::fmt;

use serde::{Deserialize, Serialize};

/// RTCIceTransportPolicy limits which candidates the media backend may use for
/// connectivity checks. The engine hands it over with the configuration and
/// does not filter candidates itself.
///
/// [W3C]: https://w3c.github.io/webrtc-pc/#rtcicetransportpolicy-enum
#[derive(Default, Debug, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RTCIceTransportPolicy {
    /// Any candidate type.
    #[default]
    All,

    /// Only relayed candidates, such as those through a TURN server.
    Relay,
}

impl fmt::Display for RTCIceTransportPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RTCIceTransportPolicy::All => "all",
            RTCIceTransportPolicy::Relay => "relay",
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_ice_transport_policy_json() {
        let policy: RTCIceTransportPolicy = serde_json::from_str(r#""relay""#).unwrap();
        assert_eq!(policy, RTCIceTransportPolicy::Relay);
        assert_eq!(serde_json::to_string(&policy).unwrap(), r#""relay""#);

        assert!(serde_json::from_str::<RTCIceTransportPolicy>(r#""none""#).is_err());
    }

    #[test]
    fn test_ice_transport_policy_default() {
        assert_eq!(RTCIceTransportPolicy::default(), RTCIceTransportPolicy::All);
        assert_eq!(RTCIceTransportPolicy::default().to_string(), "all");
    }
}
