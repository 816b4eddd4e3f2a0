use serde::{Deserialize, Serialize};

/// AnswerOptions structure describes the options used to control the answer
/// creation process.
#[derive(Default, Debug, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
pub struct RTCAnswerOptions {}

/// OfferOptions structure describes the options used to control the offer
/// creation process
///
/// ## Specifications
///
/// * [W3C]
///
/// [W3C]: https://w3c.github.io/webrtc-pc/#legacy-configuration-extensions
#[derive(Default, Debug, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RTCOfferOptions {
    /// number of audio media lines the offer should be able to receive on,
    /// counting lines that already exist.
    pub offer_to_receive_audio: u16,

    /// number of video media lines the offer should be able to receive on,
    /// counting lines that already exist.
    pub offer_to_receive_video: u16,
}
