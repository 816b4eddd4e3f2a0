use std::fmt;
use std::net::Ipv4Addr;

use ice::candidate::candidate_base::unmarshal_candidate;
use ice::candidate::Candidate;
use ice::tcp_type::TcpType;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::ice_transport::ice_candidate_type::RTCIceCandidateType;
use crate::ice_transport::ice_protocol::RTCIceProtocol;

const CANDIDATE_ATTRIBUTE_PREFIX: &str = "candidate:";
const SDP_ATTRIBUTE_PREFIX: &str = "a=";

/// ICECandidate represents a ice candidate
///
/// ## Specifications
///
/// * [MDN]
/// * [W3C]
///
/// [MDN]: https://developer.mozilla.org/en-US/docs/Web/API/RTCIceCandidate
/// [W3C]: https://w3c.github.io/webrtc-pc/#rtcicecandidate-interface
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RTCIceCandidate {
    pub foundation: String,
    pub priority: u32,
    pub address: String,
    pub protocol: RTCIceProtocol,
    pub port: u16,
    pub typ: RTCIceCandidateType,
    pub component: u16,
    pub related_address: String,
    pub related_port: u16,
    pub tcp_type: String,
}

impl RTCIceCandidate {
    /// unmarshal parses a candidate attribute value. The `a=` and `candidate:`
    /// prefixes are optional.
    pub fn unmarshal(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        let raw = raw.strip_prefix(SDP_ATTRIBUTE_PREFIX).unwrap_or(raw);
        let raw = raw.strip_prefix(CANDIDATE_ATTRIBUTE_PREFIX).unwrap_or(raw);

        let candidate = unmarshal_candidate(raw)
            .map_err(|err| Error::ErrIceCandidateParse(err.to_string()))?;
        RTCIceCandidate::from_ice(&candidate)
    }

    fn from_ice(c: &impl Candidate) -> Result<Self> {
        let (related_address, related_port) = match c.related_address() {
            Some(ra) => (ra.address, ra.port),
            None => (String::new(), 0),
        };
        let tcp_type = match c.tcp_type() {
            TcpType::Unspecified => String::new(),
            tcp_type => tcp_type.to_string(),
        };

        Ok(RTCIceCandidate {
            foundation: c.foundation(),
            priority: c.priority(),
            address: c.address(),
            protocol: c.network_type().network_short().parse()?,
            port: c.port(),
            typ: c.candidate_type().to_string().parse()?,
            component: c.component(),
            related_address,
            related_port,
            tcp_type,
        })
    }

    /// marshal renders the candidate as an attribute value without the
    /// `candidate:` prefix.
    pub fn marshal(&self) -> String {
        let mut val = format!(
            "{} {} {} {} {} {} typ {}",
            self.foundation,
            self.component,
            self.protocol,
            self.priority,
            self.address,
            self.port,
            self.typ
        );

        if !self.related_address.is_empty() {
            val += format!(
                " raddr {} rport {}",
                self.related_address, self.related_port
            )
            .as_str();
        }

        if !self.tcp_type.is_empty() {
            val += format!(" tcptype {}", self.tcp_type).as_str();
        }

        val
    }

    /// is_ipv4 reports whether the candidate address is a literal IPv4 address.
    pub fn is_ipv4(&self) -> bool {
        self.address.parse::<Ipv4Addr>().is_ok()
    }

    /// to_json returns an ICECandidateInit for the media line at `sdp_mline_index`.
    pub fn to_json(&self, sdp_mline_index: u16) -> RTCIceCandidateInit {
        RTCIceCandidateInit {
            candidate: format!("{CANDIDATE_ATTRIBUTE_PREFIX}{}", self.marshal()),
            sdp_mid: Some(sdp_mline_index.to_string()),
            sdp_mline_index: Some(sdp_mline_index),
            username_fragment: None,
        }
    }
}

impl fmt::Display for RTCIceCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}:{}{}",
            self.protocol, self.typ, self.address, self.port, self.related_address,
        )
    }
}

/// ICECandidateInit is used to serialize ice candidates
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RTCIceCandidateInit {
    pub candidate: String,
    pub sdp_mid: Option<String>,
    #[serde(rename = "sdpMLineIndex")]
    pub sdp_mline_index: Option<u16>,
    pub username_fragment: Option<String>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_ice_candidate_serialization() {
        let tests = vec![
            (
                RTCIceCandidateInit {
                    candidate: "candidate:abc123".to_string(),
                    sdp_mid: Some("0".to_string()),
                    sdp_mline_index: Some(0),
                    username_fragment: Some("def".to_string()),
                },
                r#"{"candidate":"candidate:abc123","sdpMid":"0","sdpMLineIndex":0,"usernameFragment":"def"}"#,
            ),
            (
                RTCIceCandidateInit {
                    candidate: "candidate:abc123".to_string(),
                    sdp_mid: None,
                    sdp_mline_index: None,
                    username_fragment: None,
                },
                r#"{"candidate":"candidate:abc123","sdpMid":null,"sdpMLineIndex":null,"usernameFragment":null}"#,
            ),
        ];

        for (candidate_init, expected_string) in tests {
            let result = serde_json::to_string(&candidate_init);
            assert!(result.is_ok(), "testCase: marshal err: {result:?}");
            let candidate_data = result.unwrap();
            assert_eq!(candidate_data, expected_string, "string is not expected");

            let result = serde_json::from_str::<RTCIceCandidateInit>(&candidate_data);
            assert!(result.is_ok(), "testCase: unmarshal err: {result:?}");
            if let Ok(actual_candidate_init) = result {
                assert_eq!(actual_candidate_init, candidate_init);
            }
        }
    }

    #[test]
    fn test_ice_candidate_unmarshal() {
        let tests = vec![
            (
                "candidate:1 1 udp 2130706431 192.168.1.2 53987 typ host",
                RTCIceCandidate {
                    foundation: "1".to_owned(),
                    priority: 2130706431,
                    address: "192.168.1.2".to_owned(),
                    protocol: RTCIceProtocol::Udp,
                    port: 53987,
                    typ: RTCIceCandidateType::Host,
                    component: 1,
                    ..Default::default()
                },
            ),
            (
                "a=candidate:2 2 UDP 1694498815 203.0.113.7 41000 typ srflx raddr 10.0.0.2 rport 5000 generation 0",
                RTCIceCandidate {
                    foundation: "2".to_owned(),
                    priority: 1694498815,
                    address: "203.0.113.7".to_owned(),
                    protocol: RTCIceProtocol::Udp,
                    port: 41000,
                    typ: RTCIceCandidateType::Srflx,
                    component: 2,
                    related_address: "10.0.0.2".to_owned(),
                    related_port: 5000,
                    ..Default::default()
                },
            ),
            (
                "3 1 tcp 1518280447 fe80::1 9 typ host tcptype active",
                RTCIceCandidate {
                    foundation: "3".to_owned(),
                    priority: 1518280447,
                    address: "fe80::1".to_owned(),
                    protocol: RTCIceProtocol::Tcp,
                    port: 9,
                    typ: RTCIceCandidateType::Host,
                    component: 1,
                    tcp_type: "active".to_owned(),
                    ..Default::default()
                },
            ),
        ];

        for (raw, expected) in tests {
            let candidate = RTCIceCandidate::unmarshal(raw).unwrap();
            assert_eq!(candidate, expected, "{raw}");
        }
    }

    #[test]
    fn test_ice_candidate_unmarshal_failure() {
        let tests = vec![
            "",
            "candidate:1 1 udp 2130706431 192.168.1.2 53987 typ",
            "candidate:1 x udp 2130706431 192.168.1.2 53987 typ host",
            "candidate:1 1 sctp 2130706431 192.168.1.2 53987 typ host",
            "candidate:1 1 udp 2130706431 192.168.1.2 99999 typ host",
            "candidate:1 1 udp 2130706431 192.168.1.2 53987 typ bogus",
            "candidate:1 1 udp 2130706431 192.168.1.2 53987 typ srflx raddr 10.0.0.1",
        ];

        for raw in tests {
            let result = RTCIceCandidate::unmarshal(raw);
            assert!(
                matches!(result, Err(Error::ErrIceCandidateParse(_))),
                "{raw}: {result:?}"
            );
        }
    }

    #[test]
    fn test_ice_candidate_marshal() {
        let raw = "4 1 udp 41885439 198.51.100.3 3478 typ relay raddr 203.0.113.7 rport 41000";
        let candidate = RTCIceCandidate::unmarshal(raw).unwrap();
        assert_eq!(candidate.marshal(), raw);
        assert!(candidate.is_ipv4());

        let init = candidate.to_json(1);
        assert_eq!(init.candidate, format!("candidate:{raw}"));
        assert_eq!(init.sdp_mline_index, Some(1));
    }
}
