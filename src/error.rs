use std::fmt;

use thiserror::Error;
use tokio::sync::mpsc::error::SendError as MpscSendError;

use crate::peer_connection::sdp::sdp_type::RTCSdpType;
use crate::peer_connection::signaling_state::RTCSignalingState;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, PartialEq)]
#[non_exhaustive]
pub enum Error {
    /// ErrConnectionClosed indicates an operation executed after connection
    /// has already been closed.
    #[error("connection closed")]
    ErrConnectionClosed,

    /// ErrNoRemoteDescription indicates that an operation was rejected because
    /// the remote description is not set
    #[error("remote description not set")]
    ErrNoRemoteDescription,

    #[error(
        "invalid proposed signaling state transition from {} applying {} {}",
        from,
        if *is_local { "local" } else {  "remote" },
        applying
    )]
    ErrSignalingStateProposedTransitionInvalid {
        from: RTCSignalingState,
        applying: RTCSdpType,
        is_local: bool,
    },

    /// ErrSessionDescriptionMissingType indicates a description whose type is
    /// neither offer nor answer.
    #[error("session description type must be offer or answer")]
    ErrSessionDescriptionMissingType,

    #[error("failed to parse ICE candidate: {0}")]
    ErrIceCandidateParse(String),

    /// ErrNoMatchingMediaLine indicates a candidate whose media line index is
    /// missing or out of range for the remote description.
    #[error("no matching media line for index {}", .0.map_or_else(|| "(none)".to_owned(), |i| i.to_string()))]
    ErrNoMatchingMediaLine(Option<u16>),

    /// ErrMediaLineRemoved indicates a description that drops media lines the
    /// connection already negotiated.
    #[error("media line count must not decrease: expected at least {expected}, got {got}")]
    ErrMediaLineRemoved { expected: usize, got: usize },

    #[error("unsupported media kind {0}")]
    ErrUnsupportedMediaKind(String),

    #[error("fingerprint must have algorithm and value separated by a space")]
    ErrSessionDescriptionInvalidFingerprint,

    #[error("invalid {0} attribute")]
    ErrSessionDescriptionInvalidAttribute(String),

    /// ErrNoTurnCredentials indicates that a TURN server URL was provided
    /// without required credentials.
    #[error("turn server credentials required")]
    ErrNoTurnCredentials,

    #[error("invalid ICE server url: {0}")]
    ErrInvalidIceServerUrl(String),

    /// ErrOperationDropped indicates the negotiation driver went away before
    /// the queued operation resolved.
    #[error("operation dropped before completion")]
    ErrOperationDropped,

    #[error("{0}")]
    Sdp(#[from] sdp::Error),
    #[error("mpsc send: {0}")]
    MpscSend(String),
    #[error("parse url: {0}")]
    ParseUrl(#[from] url::ParseError),
}

/// ErrorKind is the coarse classification callers branch on.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Operation attempted on a closed connection, or one that needs a remote
    /// description before any was set.
    InvalidState,
    /// Description type illegal for the current signaling state.
    InvalidTransition,
    /// Candidate or description text that cannot be interpreted.
    MalformedInput,
    /// Caller supplied value that failed validation.
    InvalidArgument,
    /// The negotiation driver is gone.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            ErrorKind::InvalidState => "InvalidState",
            ErrorKind::InvalidTransition => "InvalidTransition",
            ErrorKind::MalformedInput => "MalformedInput",
            ErrorKind::InvalidArgument => "InvalidArgument",
            ErrorKind::Internal => "Internal",
        };
        write!(f, "{s}")
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ErrConnectionClosed | Error::ErrNoRemoteDescription => ErrorKind::InvalidState,
            Error::ErrSignalingStateProposedTransitionInvalid { .. } => {
                ErrorKind::InvalidTransition
            }
            Error::ErrIceCandidateParse(_)
            | Error::ErrNoMatchingMediaLine(_)
            | Error::ErrMediaLineRemoved { .. }
            | Error::ErrUnsupportedMediaKind(_)
            | Error::ErrSessionDescriptionInvalidFingerprint
            | Error::ErrSessionDescriptionInvalidAttribute(_)
            | Error::Sdp(_) => ErrorKind::MalformedInput,
            Error::ErrSessionDescriptionMissingType
            | Error::ErrNoTurnCredentials
            | Error::ErrInvalidIceServerUrl(_)
            | Error::ParseUrl(_) => ErrorKind::InvalidArgument,
            Error::ErrOperationDropped | Error::MpscSend(_) => ErrorKind::Internal,
        }
    }
}

// Because Tokio SendError is parameterized, we sadly lose the backtrace.
impl<T> From<MpscSendError<T>> for Error {
    fn from(e: MpscSendError<T>) -> Self {
        Error::MpscSend(e.to_string())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_error_kind() {
        let tests = vec![
            (Error::ErrConnectionClosed, ErrorKind::InvalidState),
            (Error::ErrNoRemoteDescription, ErrorKind::InvalidState),
            (
                Error::ErrSignalingStateProposedTransitionInvalid {
                    from: RTCSignalingState::HaveLocalOffer,
                    applying: RTCSdpType::Offer,
                    is_local: false,
                },
                ErrorKind::InvalidTransition,
            ),
            (
                Error::ErrIceCandidateParse("x".to_owned()),
                ErrorKind::MalformedInput,
            ),
            (Error::ErrNoMatchingMediaLine(Some(3)), ErrorKind::MalformedInput),
            (Error::ErrNoMatchingMediaLine(None), ErrorKind::MalformedInput),
            (Error::ErrNoTurnCredentials, ErrorKind::InvalidArgument),
            (Error::ErrOperationDropped, ErrorKind::Internal),
        ];

        for (err, kind) in tests {
            assert_eq!(err.kind(), kind, "{err}");
        }
    }

    #[test]
    fn test_transition_error_names_state() {
        let err = Error::ErrSignalingStateProposedTransitionInvalid {
            from: RTCSignalingState::HaveLocalOffer,
            applying: RTCSdpType::Offer,
            is_local: false,
        };
        assert_eq!(
            err.to_string(),
            "invalid proposed signaling state transition from have-local-offer applying remote offer"
        );
    }
}
