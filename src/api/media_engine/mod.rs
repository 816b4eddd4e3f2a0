#[cfg(test)]
mod media_engine_test;

use crate::error::{Error, Result};
use crate::rtp_transceiver::rtp_codec::{RTCRtpCodecParameters, RTPCodecType};
use crate::rtp_transceiver::{RTCPFeedback, TYPE_RTCP_FB_CCM, TYPE_RTCP_FB_NACK};

/// ENCODING_OPUS Opus encoding name.
/// Note: Matching should be case insensitive.
pub const ENCODING_OPUS: &str = "OPUS";
/// ENCODING_PCMA PCMA encoding name.
/// Note: Matching should be case insensitive.
pub const ENCODING_PCMA: &str = "PCMA";
/// ENCODING_PCMU PCMU encoding name.
/// Note: Matching should be case insensitive.
pub const ENCODING_PCMU: &str = "PCMU";
/// ENCODING_H264 H264 encoding name.
/// Note: Matching should be case insensitive.
pub const ENCODING_H264: &str = "H264";
/// ENCODING_VP8 VP8 encoding name.
/// Note: Matching should be case insensitive.
pub const ENCODING_VP8: &str = "VP8";

/// A MediaEngine defines the codecs supported by a PeerConnection. New
/// offer lines carry its payloads, and remote payloads it does not know are
/// dropped when a remote description is applied.
#[derive(Default, Debug, Clone)]
pub struct MediaEngine {
    pub(crate) video_codecs: Vec<RTCRtpCodecParameters>,
    pub(crate) audio_codecs: Vec<RTCRtpCodecParameters>,
}

impl MediaEngine {
    /// register_default_codecs registers OPUS, PCMA and PCMU for audio and
    /// H264 and VP8 for video.
    pub fn register_default_codecs(&mut self) -> Result<()> {
        for codec in [
            (ENCODING_OPUS, 111, 48000, 2),
            (ENCODING_PCMA, 8, 8000, 1),
            (ENCODING_PCMU, 0, 8000, 1),
        ]
        .into_iter()
        .map(|(encoding_name, payload_type, clock_rate, channels)| RTCRtpCodecParameters {
            encoding_name: encoding_name.to_owned(),
            payload_type,
            clock_rate,
            channels,
            ..Default::default()
        }) {
            self.register_codec(codec, RTPCodecType::Audio)?;
        }

        let video_rtcp_feedback = vec![
            RTCPFeedback::new(TYPE_RTCP_FB_CCM, "fir"),
            RTCPFeedback::new(TYPE_RTCP_FB_NACK, "pli"),
        ];
        for codec in [(ENCODING_H264, 103), (ENCODING_VP8, 100)].into_iter().map(
            |(encoding_name, payload_type)| RTCRtpCodecParameters {
                encoding_name: encoding_name.to_owned(),
                payload_type,
                clock_rate: 90000,
                rtcp_feedback: video_rtcp_feedback.clone(),
                ..Default::default()
            },
        ) {
            self.register_codec(codec, RTPCodecType::Video)?;
        }

        Ok(())
    }

    /// register_codec adds codec to the MediaEngine.
    /// These are the list of codecs supported by this PeerConnection.
    pub fn register_codec(
        &mut self,
        codec: RTCRtpCodecParameters,
        typ: RTPCodecType,
    ) -> Result<()> {
        let codecs = match typ {
            RTPCodecType::Audio => &mut self.audio_codecs,
            RTPCodecType::Video => &mut self.video_codecs,
            RTPCodecType::Unspecified => {
                return Err(Error::ErrUnsupportedMediaKind(typ.to_string()))
            }
        };

        if let Some(existing) = codecs
            .iter_mut()
            .find(|c| c.payload_type == codec.payload_type)
        {
            *existing = codec;
        } else {
            codecs.push(codec);
        }

        Ok(())
    }

    /// codecs returns the payloads registered for `typ`, in preference order.
    pub fn codecs(&self, typ: RTPCodecType) -> &[RTCRtpCodecParameters] {
        match typ {
            RTPCodecType::Audio => &self.audio_codecs,
            RTPCodecType::Video => &self.video_codecs,
            RTPCodecType::Unspecified => &[],
        }
    }

    /// is_supported matches encoding names case-insensitively.
    pub fn is_supported(&self, typ: RTPCodecType, encoding_name: &str) -> bool {
        self.codecs(typ)
            .iter()
            .any(|c| c.encoding_name.eq_ignore_ascii_case(encoding_name))
    }

    /// filter_supported keeps the payloads whose encoding the engine knows,
    /// preserving their order and negotiated payload types.
    pub(crate) fn filter_supported(
        &self,
        typ: RTPCodecType,
        payloads: &[RTCRtpCodecParameters],
    ) -> Vec<RTCRtpCodecParameters> {
        payloads
            .iter()
            .filter(|p| {
                let supported = self.is_supported(typ, &p.encoding_name);
                if !supported {
                    log::debug!("dropping unsupported {typ} payload {}", p.rtpmap());
                }
                supported
            })
            .cloned()
            .collect()
    }
}
