use std::io::Cursor;

use sdp::description::common::Address;
use sdp::description::media::MediaDescription;
use sdp::description::session::SessionDescription;
use smol_str::SmolStr;

use super::{MediaLine, SessionModel, SessionOrigin, TrackRef};
use crate::dtls_transport::dtls_fingerprint::RTCDtlsFingerprint;
use crate::dtls_transport::dtls_role::DTLSRole;
use crate::error::{Error, Result};
use crate::ice_transport::ice_candidate::RTCIceCandidate;
use crate::rtp_transceiver::rtp_codec::{RTCRtpCodecParameters, RTPCodecType};
use crate::rtp_transceiver::rtp_transceiver_direction::RTCRtpTransceiverDirection;
use crate::rtp_transceiver::{PayloadType, RTCPFeedback};

const ATTR_KEY_RTCP_FB: &str = "rtcp-fb";
const ATTR_KEY_RTCP_MUX: &str = "rtcp-mux";
const ATTR_KEY_RTCP: &str = "rtcp";
const ATTR_KEY_SETUP: &str = "setup";
const ATTR_KEY_FINGERPRINT: &str = "fingerprint";
const ATTR_KEY_ICE_UFRAG: &str = "ice-ufrag";
const ATTR_KEY_ICE_PWD: &str = "ice-pwd";
const ATTR_KEY_CANDIDATE: &str = "candidate";
const ATTR_KEY_END_OF_CANDIDATES: &str = "end-of-candidates";
const ATTR_KEY_SSRC: &str = "ssrc";
const ATTR_KEY_MSID: &str = "msid";

/// Payload type of an `rtcp-fb` attribute that applies to every payload.
const RTCP_FB_WILDCARD: &str = "* ";

const SSRC_CNAME_PREFIX: &str = "cname:";
const SSRC_MSID_PREFIX: &str = "msid:";

/// Stream id JSEP uses for a track that belongs to no stream.
const MSID_NO_STREAM: &str = "-";

/// Port and format placed on a media line with no usable payloads.
const REJECTED_PORT: isize = 0;
const REJECTED_FORMAT: &str = "0";

/// SessionDescriptionCodec turns description text into a [`SessionModel`] and
/// back. It is the only place that knows the wire format.
pub trait SessionDescriptionCodec: Send + Sync {
    fn parse(&self, sdp: &str) -> Result<SessionModel>;

    fn generate(&self, model: &SessionModel) -> String;

    /// parse_candidate reads a single candidate attribute as signaled by the
    /// remote peer.
    fn parse_candidate(&self, raw: &str) -> Result<RTCIceCandidate> {
        RTCIceCandidate::unmarshal(raw)
    }
}

/// SdpCodec is the [`SessionDescriptionCodec`] built on the `sdp` crate.
#[derive(Default, Debug, Copy, Clone)]
pub struct SdpCodec;

impl SessionDescriptionCodec for SdpCodec {
    fn parse(&self, sdp: &str) -> Result<SessionModel> {
        let mut reader = Cursor::new(sdp.as_bytes());
        let desc = SessionDescription::unmarshal(&mut reader)?;

        let session = SessionDefaults {
            fingerprint: desc
                .attribute(ATTR_KEY_FINGERPRINT)
                .map(|f| f.parse::<RTCDtlsFingerprint>())
                .transpose()?,
            ufrag: desc.attribute(ATTR_KEY_ICE_UFRAG).cloned(),
            password: desc.attribute(ATTR_KEY_ICE_PWD).cloned(),
        };

        let mut model = SessionModel {
            origin: SessionOrigin {
                username: desc.origin.username.clone(),
                session_id: desc.origin.session_id,
                session_version: desc.origin.session_version,
                address: desc.origin.unicast_address.clone(),
            },
            media_lines: Vec::with_capacity(desc.media_descriptions.len()),
        };
        for media in &desc.media_descriptions {
            model.media_lines.push(parse_media_line(media, &session)?);
        }

        Ok(model)
    }

    fn generate(&self, model: &SessionModel) -> String {
        let mut desc = SessionDescription::new_jsep_session_description(false);
        desc.origin.username = model.origin.username.clone();
        desc.origin.session_id = model.origin.session_id;
        desc.origin.session_version = model.origin.session_version;
        if model.origin.address.contains(':') {
            desc.origin.address_type = "IP6".to_owned();
        }
        desc.origin.unicast_address = model.origin.address.clone();
        for line in &model.media_lines {
            desc = desc.with_media(generate_media_line(line));
        }
        desc.marshal()
    }
}

/// Session level attributes media lines inherit when they carry none.
struct SessionDefaults {
    fingerprint: Option<RTCDtlsFingerprint>,
    ufrag: Option<String>,
    password: Option<String>,
}

fn parse_media_line(media: &MediaDescription, session: &SessionDefaults) -> Result<MediaLine> {
    let kind = RTPCodecType::from(media.media_name.media.as_str());
    if kind == RTPCodecType::Unspecified {
        return Err(Error::ErrUnsupportedMediaKind(
            media.media_name.media.clone(),
        ));
    }

    let mut line = MediaLine::new(kind);
    line.port = u16::try_from(media.media_name.port.value)
        .map_err(|_| Error::ErrSessionDescriptionInvalidAttribute("port".to_owned()))?;
    line.address = media
        .connection_information
        .as_ref()
        .and_then(|c| c.address.as_ref())
        .map(|a| a.address.clone());

    line.payloads = codecs_from_media_description(media);

    let mut msid = None;
    let mut ssrc_msid = None;

    for attr in &media.attributes {
        let value = attr.value.as_deref().unwrap_or_default();
        match attr.key.as_str() {
            ATTR_KEY_RTCP_MUX => line.rtcp.mux = true,
            ATTR_KEY_RTCP => {
                let mut fields = value.split_whitespace();
                let port = fields
                    .next()
                    .and_then(|p| p.parse::<u16>().ok())
                    .ok_or_else(|| invalid_attribute(ATTR_KEY_RTCP))?;
                line.rtcp.port = Some(port);
                // <nettype> <addrtype> <connection-address>
                line.rtcp.address = fields.nth(2).map(str::to_owned);
            }
            ATTR_KEY_SETUP => line.dtls.setup = DTLSRole::from(value),
            ATTR_KEY_FINGERPRINT => line.dtls.fingerprint = Some(value.parse()?),
            ATTR_KEY_ICE_UFRAG => line.ice.ufrag = Some(value.to_owned()),
            ATTR_KEY_ICE_PWD => line.ice.password = Some(value.to_owned()),
            ATTR_KEY_CANDIDATE => line.ice.candidates.push(RTCIceCandidate::unmarshal(value)?),
            ATTR_KEY_END_OF_CANDIDATES => line.ice.gathering_done = true,
            ATTR_KEY_SSRC => {
                let (ssrc, rest) = value.split_once(' ').unwrap_or((value, ""));
                let ssrc = ssrc
                    .parse::<u32>()
                    .map_err(|_| invalid_attribute(ATTR_KEY_SSRC))?;
                if !line.ssrcs.contains(&ssrc) {
                    line.ssrcs.push(ssrc);
                }
                if let Some(cname) = rest.strip_prefix(SSRC_CNAME_PREFIX) {
                    line.cname = Some(cname.to_owned());
                } else if let Some(value) = rest.strip_prefix(SSRC_MSID_PREFIX) {
                    ssrc_msid = parse_msid(value);
                }
            }
            ATTR_KEY_MSID => msid = parse_msid(value),
            key => {
                if let Some(direction) = RTCRtpTransceiverDirection::from_attribute(key) {
                    line.direction = direction;
                }
            }
        }
    }

    line.track = msid.or(ssrc_msid);

    if line.dtls.fingerprint.is_none() {
        line.dtls.fingerprint = session.fingerprint.clone();
    }
    if line.ice.ufrag.is_none() {
        line.ice.ufrag = session.ufrag.clone();
    }
    if line.ice.password.is_none() {
        line.ice.password = session.password.clone();
    }

    Ok(line)
}

fn generate_media_line(line: &MediaLine) -> MediaDescription {
    let mut media = MediaDescription::new_jsep_media_description(line.kind.to_string(), vec![]);

    if line.payloads.is_empty() {
        media.media_name.port.value = REJECTED_PORT;
        media.media_name.formats.push(REJECTED_FORMAT.to_owned());
    } else if line.port != 0 {
        media.media_name.port.value = line.port as isize;
    }

    if let Some(address) = &line.address {
        if let Some(connection) = media.connection_information.as_mut() {
            if address.contains(':') {
                connection.address_type = "IP6".to_owned();
            }
            connection.address = Some(Address {
                address: address.clone(),
                ttl: None,
                range: None,
            });
        }
    }

    if let (Some(port), Some(address)) = (line.rtcp.port, &line.rtcp.address) {
        let address_type = if address.contains(':') { "IP6" } else { "IP4" };
        media = media.with_value_attribute(
            ATTR_KEY_RTCP.to_owned(),
            format!("{port} IN {address_type} {address}"),
        );
    }

    if let (Some(ufrag), Some(password)) = (&line.ice.ufrag, &line.ice.password) {
        media = media.with_ice_credentials(ufrag.clone(), password.clone());
    }

    if let Some(fingerprint) = &line.dtls.fingerprint {
        media = media.with_fingerprint(fingerprint.algorithm.clone(), fingerprint.value.clone());
    }

    if line.dtls.setup != DTLSRole::Unspecified {
        media = media.with_value_attribute(ATTR_KEY_SETUP.to_owned(), line.dtls.setup.to_string());
    }

    media = media.with_property_attribute(line.direction.to_string());

    if line.rtcp.mux {
        media = media.with_property_attribute(ATTR_KEY_RTCP_MUX.to_owned());
    }

    for codec in &line.payloads {
        media = media.with_codec(
            codec.payload_type,
            codec.encoding_name.clone(),
            codec.clock_rate,
            codec.channels,
            codec.sdp_fmtp_line.clone(),
        );
        for feedback in &codec.rtcp_feedback {
            media = media.with_value_attribute(
                ATTR_KEY_RTCP_FB.to_owned(),
                format!("{} {}", codec.payload_type, feedback.marshal()),
            );
        }
    }

    for ssrc in &line.ssrcs {
        if let Some(cname) = &line.cname {
            media = media.with_value_attribute(
                ATTR_KEY_SSRC.to_owned(),
                format!("{ssrc} {SSRC_CNAME_PREFIX}{cname}"),
            );
        }
        if let Some(track) = &line.track {
            if let Some(stream_id) = &track.stream_id {
                media = media.with_value_attribute(
                    ATTR_KEY_SSRC.to_owned(),
                    format!("{ssrc} {SSRC_MSID_PREFIX}{stream_id} {}", track.track_id),
                );
            }
        }
    }

    if let Some(track) = &line.track {
        let stream_id = track
            .stream_id
            .as_ref()
            .map_or(MSID_NO_STREAM, |s| s.as_str());
        media = media.with_value_attribute(
            ATTR_KEY_MSID.to_owned(),
            format!("{stream_id} {}", track.track_id),
        );
    }

    for candidate in &line.ice.candidates {
        media = media.with_candidate(candidate.marshal());
    }

    if line.ice.gathering_done {
        media = media.with_property_attribute(ATTR_KEY_END_OF_CANDIDATES.to_owned());
    }

    media
}

fn invalid_attribute(key: &str) -> Error {
    Error::ErrSessionDescriptionInvalidAttribute(key.to_owned())
}

/// codecs_from_media_description reads the payloads of `media` in format
/// order. Formats without an rtpmap are skipped.
fn codecs_from_media_description(media: &MediaDescription) -> Vec<RTCRtpCodecParameters> {
    let s = SessionDescription {
        media_descriptions: vec![media.clone()],
        ..Default::default()
    };

    let wildcard_feedback: Vec<RTCPFeedback> = media
        .attributes
        .iter()
        .filter(|a| a.key == ATTR_KEY_RTCP_FB)
        .filter_map(|a| a.value.as_deref()?.strip_prefix(RTCP_FB_WILDCARD))
        .map(rtcp_feedback_from_str)
        .collect();

    let mut out = vec![];
    for format in &media.media_name.formats {
        let Ok(payload_type) = format.parse::<PayloadType>() else {
            log::debug!("skipping non-numeric format {format}");
            continue;
        };
        let codec = match s.get_codec_for_payload_type(payload_type) {
            Ok(codec) if !codec.name.is_empty() => codec,
            _ => {
                log::debug!("skipping payload type {payload_type} without rtpmap");
                continue;
            }
        };

        let mut rtcp_feedback = wildcard_feedback.clone();
        rtcp_feedback.extend(codec.rtcp_feedback.iter().map(|raw| rtcp_feedback_from_str(raw)));

        out.push(RTCRtpCodecParameters {
            encoding_name: codec.name,
            payload_type,
            clock_rate: codec.clock_rate,
            channels: codec.encoding_parameters.parse::<u16>().unwrap_or(0),
            sdp_fmtp_line: codec.fmtp,
            rtcp_feedback,
        });
    }

    out
}

/// `<type> [<parameter>]`
fn rtcp_feedback_from_str(raw: &str) -> RTCPFeedback {
    match raw.split_once(' ') {
        Some((typ, parameter)) => RTCPFeedback::new(typ, parameter),
        None => RTCPFeedback::new(raw, ""),
    }
}

/// `<stream id> <track id>`, where a `-` stream id means no stream.
fn parse_msid(value: &str) -> Option<TrackRef> {
    let mut fields = value.split_whitespace();
    let stream_id = fields.next()?;
    let track_id = fields.next().unwrap_or(stream_id);

    Some(TrackRef {
        stream_id: (stream_id != MSID_NO_STREAM).then(|| SmolStr::new(stream_id)),
        track_id: SmolStr::new(track_id),
    })
}
