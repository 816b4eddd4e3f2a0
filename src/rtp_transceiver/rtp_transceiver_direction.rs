use std::fmt;

/// RTCRtpTransceiverDirection is the direction attribute of a media line, as
/// seen by the side that wrote the description. A line without one is
/// `sendrecv` (RFC 4566 section 6).
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub enum RTCRtpTransceiverDirection {
    #[default]
    Sendrecv,
    Sendonly,
    Recvonly,
    Inactive,
}

impl RTCRtpTransceiverDirection {
    /// from_attribute maps a property attribute key onto a direction. Keys
    /// that are not directions yield `None`.
    pub(crate) fn from_attribute(key: &str) -> Option<Self> {
        match key {
            "sendrecv" => Some(RTCRtpTransceiverDirection::Sendrecv),
            "sendonly" => Some(RTCRtpTransceiverDirection::Sendonly),
            "recvonly" => Some(RTCRtpTransceiverDirection::Recvonly),
            "inactive" => Some(RTCRtpTransceiverDirection::Inactive),
            _ => None,
        }
    }

    /// has_send reports whether the side advertising this direction sends media.
    pub fn has_send(&self) -> bool {
        matches!(
            self,
            RTCRtpTransceiverDirection::Sendrecv | RTCRtpTransceiverDirection::Sendonly
        )
    }
}

impl fmt::Display for RTCRtpTransceiverDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RTCRtpTransceiverDirection::Sendrecv => "sendrecv",
            RTCRtpTransceiverDirection::Sendonly => "sendonly",
            RTCRtpTransceiverDirection::Recvonly => "recvonly",
            RTCRtpTransceiverDirection::Inactive => "inactive",
        })
    }
}
