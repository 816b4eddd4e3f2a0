use std::fmt;

/// RTCIceGatheringState summarizes candidate gathering across every local
/// media line of a peer connection.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u8)]
pub enum RTCIceGatheringState {
    /// No local media line exists yet.
    #[default]
    New,

    /// Some local media line has not reported gathering done.
    Gathering,

    /// Every local media line reported gathering done and the local
    /// description is complete.
    Complete,
}

impl From<u8> for RTCIceGatheringState {
    fn from(v: u8) -> Self {
        match v {
            1 => RTCIceGatheringState::Gathering,
            2 => RTCIceGatheringState::Complete,
            _ => RTCIceGatheringState::New,
        }
    }
}

impl fmt::Display for RTCIceGatheringState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RTCIceGatheringState::New => "new",
            RTCIceGatheringState::Gathering => "gathering",
            RTCIceGatheringState::Complete => "complete",
        })
    }
}
