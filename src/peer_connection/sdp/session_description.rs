use serde::{Deserialize, Serialize};

use super::sdp_type::RTCSdpType;

/// RTCSessionDescription is a description as exchanged with the remote peer:
/// its type plus the SDP text. It serializes to the `{"type", "sdp"}` JSON
/// shape browsers use, so it can go over any signaling channel as is.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RTCSessionDescription {
    #[serde(rename = "type")]
    pub sdp_type: RTCSdpType,

    pub sdp: String,
}

impl RTCSessionDescription {
    pub fn offer(sdp: String) -> RTCSessionDescription {
        RTCSessionDescription {
            sdp_type: RTCSdpType::Offer,
            sdp,
        }
    }

    pub fn answer(sdp: String) -> RTCSessionDescription {
        RTCSessionDescription {
            sdp_type: RTCSdpType::Answer,
            sdp,
        }
    }
}
