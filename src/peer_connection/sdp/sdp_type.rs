use std::fmt;

use serde::{Deserialize, Serialize};

/// RTCSdpType is the `type` of a session description. Only offers and
/// answers take part in negotiation; `Unspecified` marks a description that
/// arrived without a usable type and is rejected before it is queued.
#[derive(Default, Debug, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RTCSdpType {
    #[default]
    Unspecified,

    Offer,

    Answer,
}

impl fmt::Display for RTCSdpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RTCSdpType::Offer => "offer",
            RTCSdpType::Answer => "answer",
            RTCSdpType::Unspecified => crate::UNSPECIFIED_STR,
        })
    }
}
