use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::ice_transport::ice_candidate::RTCIceCandidateInit;
use crate::ice_transport::ice_gathering_state::RTCIceGatheringState;
use crate::media_stream::MediaStream;
use crate::peer_connection::signaling_state::RTCSignalingState;

/// RTCPeerConnectionIceEvent carries a local candidate, or `None` once
/// gathering has completed for the current local description.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct RTCPeerConnectionIceEvent {
    pub candidate: Option<RTCIceCandidateInit>,
}

/// PeerConnectionEventHandler receives the events of one peer connection, in
/// the order they were raised. Every method defaults to doing nothing.
#[async_trait]
pub trait PeerConnectionEventHandler: Send + Sync {
    /// on_negotiation_needed fires when local tracks and the negotiated media
    /// lines diverge while the connection is stable and idle.
    async fn on_negotiation_needed(&self) {}

    async fn on_ice_candidate(&self, _event: RTCPeerConnectionIceEvent) {}

    async fn on_signaling_state_change(&self, _state: RTCSignalingState) {}

    async fn on_ice_gathering_state_change(&self, _state: RTCIceGatheringState) {}

    /// on_add_stream fires once a group of remote media lines has sources.
    async fn on_add_stream(&self, _stream: MediaStream) {}

    async fn on_remove_stream(&self, _stream: MediaStream) {}
}

#[derive(Debug, Clone)]
pub(crate) enum PeerConnectionEvent {
    NegotiationNeeded,
    IceCandidate(RTCPeerConnectionIceEvent),
    SignalingStateChange(RTCSignalingState),
    IceGatheringStateChange(RTCIceGatheringState),
    AddStream(MediaStream),
    RemoveStream(MediaStream),
}

impl PeerConnectionEvent {
    fn name(&self) -> &'static str {
        match self {
            PeerConnectionEvent::NegotiationNeeded => "negotiationneeded",
            PeerConnectionEvent::IceCandidate(_) => "icecandidate",
            PeerConnectionEvent::SignalingStateChange(_) => "signalingstatechange",
            PeerConnectionEvent::IceGatheringStateChange(_) => "icegatheringstatechange",
            PeerConnectionEvent::AddStream(_) => "addstream",
            PeerConnectionEvent::RemoveStream(_) => "removestream",
        }
    }

    async fn dispatch(self, handler: &dyn PeerConnectionEventHandler) {
        match self {
            PeerConnectionEvent::NegotiationNeeded => handler.on_negotiation_needed().await,
            PeerConnectionEvent::IceCandidate(event) => handler.on_ice_candidate(event).await,
            PeerConnectionEvent::SignalingStateChange(state) => {
                handler.on_signaling_state_change(state).await
            }
            PeerConnectionEvent::IceGatheringStateChange(state) => {
                handler.on_ice_gathering_state_change(state).await
            }
            PeerConnectionEvent::AddStream(stream) => handler.on_add_stream(stream).await,
            PeerConnectionEvent::RemoveStream(stream) => handler.on_remove_stream(stream).await,
        }
    }
}

/// run_event_dispatcher delivers events one at a time. Each handler call runs
/// in its own task so a panicking handler is reported and skipped.
pub(crate) async fn run_event_dispatcher(
    handler: Arc<dyn PeerConnectionEventHandler>,
    mut events: mpsc::UnboundedReceiver<PeerConnectionEvent>,
) {
    while let Some(event) = events.recv().await {
        let name = event.name();
        let handler = Arc::clone(&handler);
        let result = tokio::spawn(async move { event.dispatch(handler.as_ref()).await }).await;
        if let Err(err) = result {
            log::error!("{name} handler failed: {err}");
        }
    }
    log::trace!("event dispatcher stopped");
}
