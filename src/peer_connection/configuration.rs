use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::ice_transport::ice_server::RTCIceServer;
use crate::peer_connection::policy::ice_transport_policy::RTCIceTransportPolicy;

/// Defines a set of parameters to configure how the peer-to-peer communication via
/// [`RTCPeerConnection`] is established or re-established. The configuration is
/// handed to the transport factory when the connection is created and is
/// treated as readonly afterwards.
///
/// [`RTCPeerConnection`]: crate::peer_connection::RTCPeerConnection
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RTCConfiguration {
    /// Defines a slice describing servers available to be used by
    /// ICE, such as STUN and TURN servers.
    #[serde(default)]
    pub ice_servers: Vec<RTCIceServer>,

    /// Indicates which candidates the ICE Agent is allowed
    /// to use.
    #[serde(default)]
    pub ice_transport_policy: RTCIceTransportPolicy,
}

impl RTCConfiguration {
    pub(crate) fn validate(&self) -> Result<()> {
        for server in &self.ice_servers {
            server.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_configuration_json() {
        let raw = r#"{"iceServers":[{"urls":["stun:stun.example.org"]}],"iceTransportPolicy":"relay"}"#;
        let config: RTCConfiguration = serde_json::from_str(raw).unwrap();
        assert_eq!(config.ice_servers.len(), 1);
        assert_eq!(config.ice_transport_policy, RTCIceTransportPolicy::Relay);
        assert!(config.validate().is_ok());

        let config: RTCConfiguration = serde_json::from_str("{}").unwrap();
        assert_eq!(config, RTCConfiguration::default());
        assert_eq!(config.ice_transport_policy, RTCIceTransportPolicy::All);
    }

    #[test]
    fn test_configuration_validate() {
        let config = RTCConfiguration {
            ice_servers: vec![RTCIceServer {
                urls: vec!["turn:turn.example.org".to_owned()],
                ..Default::default()
            }],
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(Error::ErrNoTurnCredentials));
    }
}
