use std::fmt;

use crate::error::{Error, Result};
use crate::peer_connection::sdp::sdp_type::RTCSdpType;

/// StateChangeOp is the side a description is applied to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum StateChangeOp {
    SetLocal,
    SetRemote,
}

/// RTCSignalingState is the stage of the offer/answer exchange. It is kept
/// in an atomic as its `u8` discriminant so the handle can read it without
/// waiting on the negotiation driver.
///
/// [W3C]: https://w3c.github.io/webrtc-pc/#dom-peerconnection-signaling-state
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum RTCSignalingState {
    /// No exchange in progress. Also the initial state.
    #[default]
    Stable,

    /// A local offer has been applied and awaits the remote answer.
    HaveLocalOffer,

    /// A remote offer has been applied and awaits the local answer.
    HaveRemoteOffer,

    /// The connection was closed. Nothing leaves this state.
    Closed,
}

impl From<u8> for RTCSignalingState {
    fn from(v: u8) -> Self {
        match v {
            1 => RTCSignalingState::HaveLocalOffer,
            2 => RTCSignalingState::HaveRemoteOffer,
            3 => RTCSignalingState::Closed,
            _ => RTCSignalingState::Stable,
        }
    }
}

impl fmt::Display for RTCSignalingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RTCSignalingState::Stable => "stable",
            RTCSignalingState::HaveLocalOffer => "have-local-offer",
            RTCSignalingState::HaveRemoteOffer => "have-remote-offer",
            RTCSignalingState::Closed => "closed",
        })
    }
}

/// (current state, operation, description type) -> next state
const SIGNALING_TRANSITIONS: [(
    RTCSignalingState,
    StateChangeOp,
    RTCSdpType,
    RTCSignalingState,
); 6] = [
    (
        RTCSignalingState::Stable,
        StateChangeOp::SetLocal,
        RTCSdpType::Offer,
        RTCSignalingState::HaveLocalOffer,
    ),
    (
        RTCSignalingState::Stable,
        StateChangeOp::SetRemote,
        RTCSdpType::Offer,
        RTCSignalingState::HaveRemoteOffer,
    ),
    (
        RTCSignalingState::HaveLocalOffer,
        StateChangeOp::SetLocal,
        RTCSdpType::Offer,
        RTCSignalingState::HaveLocalOffer,
    ),
    (
        RTCSignalingState::HaveLocalOffer,
        StateChangeOp::SetRemote,
        RTCSdpType::Answer,
        RTCSignalingState::Stable,
    ),
    (
        RTCSignalingState::HaveRemoteOffer,
        StateChangeOp::SetLocal,
        RTCSdpType::Answer,
        RTCSignalingState::Stable,
    ),
    (
        RTCSignalingState::HaveRemoteOffer,
        StateChangeOp::SetRemote,
        RTCSdpType::Offer,
        RTCSignalingState::HaveRemoteOffer,
    ),
];

/// check_next_signaling_state looks up the state that applying a description
/// of `sdp_type` via `op` leads to from `cur`.
pub(crate) fn check_next_signaling_state(
    cur: RTCSignalingState,
    op: StateChangeOp,
    sdp_type: RTCSdpType,
) -> Result<RTCSignalingState> {
    if cur == RTCSignalingState::Closed {
        return Err(Error::ErrConnectionClosed);
    }

    SIGNALING_TRANSITIONS
        .iter()
        .find(|(from, o, t, _)| *from == cur && *o == op && *t == sdp_type)
        .map(|(_, _, _, next)| *next)
        .ok_or(Error::ErrSignalingStateProposedTransitionInvalid {
            from: cur,
            applying: sdp_type,
            is_local: op == StateChangeOp::SetLocal,
        })
}
