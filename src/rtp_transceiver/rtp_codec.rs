use std::fmt;

use serde::{Deserialize, Serialize};

use super::{PayloadType, RTCPFeedback};

/// RTPCodecType determines the type of a codec
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RTPCodecType {
    #[default]
    Unspecified = 0,

    /// RTPCodecTypeAudio indicates this is an audio codec
    #[serde(rename = "audio")]
    Audio = 1,

    /// RTPCodecTypeVideo indicates this is a video codec
    #[serde(rename = "video")]
    Video = 2,
}

impl From<&str> for RTPCodecType {
    fn from(raw: &str) -> Self {
        match raw {
            "audio" => RTPCodecType::Audio,
            "video" => RTPCodecType::Video,
            _ => RTPCodecType::Unspecified,
        }
    }
}

impl fmt::Display for RTPCodecType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            RTPCodecType::Audio => "audio",
            RTPCodecType::Video => "video",
            RTPCodecType::Unspecified => crate::UNSPECIFIED_STR,
        };
        write!(f, "{s}")
    }
}

/// RTPCodecParameters is one payload entry of a media line: the payload type
/// it was negotiated under plus the `rtpmap`, `fmtp` and `rtcp-fb` facts.
/// <https://w3c.github.io/webrtc-pc/#rtcrtpcodecparameters>
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RTCRtpCodecParameters {
    pub encoding_name: String,
    pub payload_type: PayloadType,
    pub clock_rate: u32,
    pub channels: u16,
    pub sdp_fmtp_line: String,
    pub rtcp_feedback: Vec<RTCPFeedback>,
}

impl RTCRtpCodecParameters {
    /// rtpmap attribute value, `<pt> <name>/<clock rate>[/<channels>]`
    pub(crate) fn rtpmap(&self) -> String {
        if self.channels > 0 {
            format!(
                "{} {}/{}/{}",
                self.payload_type, self.encoding_name, self.clock_rate, self.channels
            )
        } else {
            format!(
                "{} {}/{}",
                self.payload_type, self.encoding_name, self.clock_rate
            )
        }
    }
}
