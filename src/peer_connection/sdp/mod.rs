#[cfg(test)]
mod sdp_test;

pub mod codec;
pub mod sdp_type;
pub mod session_description;

use smol_str::SmolStr;

use crate::dtls_transport::dtls_fingerprint::RTCDtlsFingerprint;
use crate::dtls_transport::dtls_role::DTLSRole;
use crate::ice_transport::ice_candidate::RTCIceCandidate;
use crate::media_stream::SourceHandle;
use crate::rtp_transceiver::rtp_codec::{RTCRtpCodecParameters, RTPCodecType};
use crate::rtp_transceiver::rtp_transceiver_direction::RTCRtpTransceiverDirection;

pub(crate) const UNSPECIFIED_ADDRESS: &str = "0.0.0.0";

const INITIAL_SESSION_VERSION: u64 = 1;

/// TrackRef ties a media line to the track it carries.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct TrackRef {
    /// Stream the track belongs to. Lines without one are legacy/ungrouped.
    pub stream_id: Option<SmolStr>,
    pub track_id: SmolStr,
}

#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct RtcpInfo {
    pub mux: bool,
    pub address: Option<String>,
    pub port: Option<u16>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct DtlsInfo {
    pub setup: DTLSRole,
    pub fingerprint: Option<RTCDtlsFingerprint>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct IceInfo {
    pub ufrag: Option<String>,
    pub password: Option<String>,
    pub candidates: Vec<RTCIceCandidate>,
    pub gathering_done: bool,
}

impl IceInfo {
    pub fn has_credentials(&self) -> bool {
        self.ufrag.is_some() && self.password.is_some()
    }
}

/// MediaLine is one negotiated audio or video flow, identified by its
/// position in the owning [`SessionModel`].
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct MediaLine {
    pub kind: RTPCodecType,
    pub track: Option<TrackRef>,
    pub direction: RTCRtpTransceiverDirection,
    pub payloads: Vec<RTCRtpCodecParameters>,
    pub rtcp: RtcpInfo,
    pub dtls: DtlsInfo,
    pub ice: IceInfo,
    pub ssrcs: Vec<u32>,
    pub cname: Option<String>,
    pub address: Option<String>,
    pub port: u16,
    /// Local source the backend sends on this line. Never serialized.
    pub source: Option<SourceHandle>,
}

impl MediaLine {
    pub(crate) fn new(kind: RTPCodecType) -> Self {
        MediaLine {
            kind,
            direction: RTCRtpTransceiverDirection::Sendrecv,
            ..Default::default()
        }
    }

    pub fn track_id(&self) -> Option<&SmolStr> {
        self.track.as_ref().map(|t| &t.track_id)
    }

    pub fn stream_id(&self) -> Option<&SmolStr> {
        self.track.as_ref().and_then(|t| t.stream_id.as_ref())
    }

    /// is_complete reports whether the line has every fact the backend must
    /// supply before a local description can be applied.
    pub fn is_complete(&self) -> bool {
        self.dtls.fingerprint.is_some()
            && self.ice.has_credentials()
            && !self.ssrcs.is_empty()
            && self.cname.is_some()
    }

    pub(crate) fn has_unspecified_address(&self) -> bool {
        self.address
            .as_deref()
            .map_or(true, |address| address == UNSPECIFIED_ADDRESS)
    }
}

/// SessionOrigin is the `o=` identity of a description. The id is fixed for
/// the life of a session and the version grows with every new description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOrigin {
    pub username: String,
    pub session_id: u64,
    pub session_version: u64,
    pub address: String,
}

impl SessionOrigin {
    /// new starts a session with a random 63 bit id.
    pub fn new() -> Self {
        SessionOrigin {
            username: "-".to_owned(),
            session_id: rand::random::<u64>() & (u64::MAX >> 1),
            session_version: INITIAL_SESSION_VERSION,
            address: UNSPECIFIED_ADDRESS.to_owned(),
        }
    }

    /// next keeps the session id and bumps the version.
    pub(crate) fn next(&self) -> Self {
        SessionOrigin {
            session_version: self.session_version.wrapping_add(1),
            ..self.clone()
        }
    }
}

impl Default for SessionOrigin {
    fn default() -> Self {
        Self::new()
    }
}

/// SessionModel is the in-memory form of a local or remote session
/// description. Line order is significant and stable.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct SessionModel {
    pub origin: SessionOrigin,
    pub media_lines: Vec<MediaLine>,
}

impl SessionModel {
    /// next_revision copies the model under the same session with a newer
    /// version.
    pub(crate) fn next_revision(&self) -> Self {
        SessionModel {
            origin: self.origin.next(),
            media_lines: self.media_lines.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.media_lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.media_lines.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.media_lines.iter().all(MediaLine::is_complete)
    }
}
