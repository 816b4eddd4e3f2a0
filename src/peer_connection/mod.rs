
pub(crate) mod completion;
pub mod configuration;
pub(crate) mod description_builder;
pub mod event_handler;
pub mod offer_answer_options;
pub(crate) mod operation;
pub(crate) mod peer_connection_internal;
pub mod policy;
pub(crate) mod remote_source;
pub mod sdp;
pub mod signaling_state;

use std::sync::Arc;

use rand::Rng;
use smol_str::SmolStr;
use tokio::sync::{mpsc, oneshot};

use crate::api::media_engine::MediaEngine;
use crate::api::API;
use crate::error::{Error, Result};
use crate::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use crate::ice_transport::ice_gathering_state::RTCIceGatheringState;
use crate::media_stream::{MediaStream, MediaStreamTrack};
use crate::peer_connection::completion::CompletionTracker;
use crate::peer_connection::configuration::RTCConfiguration;
use crate::peer_connection::description_builder::{build_answer, build_offer, track_infos};
use crate::peer_connection::event_handler::{
    run_event_dispatcher, PeerConnectionEvent, PeerConnectionEventHandler,
    RTCPeerConnectionIceEvent,
};
use crate::peer_connection::offer_answer_options::{RTCAnswerOptions, RTCOfferOptions};
use crate::peer_connection::operation::{Operation, Operations};
use crate::peer_connection::remote_source::RemoteSourceDemuxer;
use crate::peer_connection::sdp::codec::SessionDescriptionCodec;
use crate::peer_connection::sdp::sdp_type::RTCSdpType;
use crate::peer_connection::sdp::session_description::RTCSessionDescription;
use crate::peer_connection::sdp::{MediaLine, SessionModel};
use crate::peer_connection::signaling_state::{
    check_next_signaling_state, RTCSignalingState, StateChangeOp,
};
use crate::transport::{TransportAdapter, TransportEvents};
use peer_connection_internal::*;

const RUNES_ALPHA: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// math_rand_alpha generates a mathmatical random alphabet sequence of the requested length.
pub fn math_rand_alpha(n: usize) -> String {
    let mut rng = rand::rng();

    let rand_string: String = (0..n)
        .map(|_| {
            let idx = rng.random_range(0..RUNES_ALPHA.len());
            RUNES_ALPHA[idx] as char
        })
        .collect();

    rand_string
}

/// RTCPeerConnection negotiates media lines with a remote peer on behalf of a
/// media backend. Negotiation operations are queued and run one at a time in
/// the order they were called; the backend's reports are folded in between.
///
/// Dropping the handle stops the negotiation driver.
pub struct RTCPeerConnection {
    configuration: RTCConfiguration,
    shared: Arc<SharedState>,
    driver: mpsc::UnboundedSender<DriverMessage>,
}

impl RTCPeerConnection {
    pub(crate) fn new<F>(
        api: &API,
        configuration: RTCConfiguration,
        handler: Arc<dyn PeerConnectionEventHandler>,
        make_transport: F,
    ) -> Result<Self>
    where
        F: FnOnce(&RTCConfiguration, TransportEvents) -> Arc<dyn TransportAdapter>,
    {
        configuration.validate()?;

        let (driver_tx, driver_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let transport = make_transport(&configuration, TransportEvents::new(driver_tx.downgrade()));
        let shared = Arc::new(SharedState::new());
        let internal = PeerConnectionInternal::new(
            api,
            Arc::clone(&shared),
            transport,
            events_tx,
            driver_tx.downgrade(),
        );

        tokio::spawn(internal.run(driver_rx));
        tokio::spawn(run_event_dispatcher(handler, events_rx));

        Ok(RTCPeerConnection {
            configuration,
            shared,
            driver: driver_tx,
        })
    }

    /// enqueue appends an operation to the negotiation queue and waits for
    /// its result.
    async fn enqueue<T, F>(&self, description: &'static str, changes_state: bool, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PeerConnectionInternal, oneshot::Sender<Result<T>>) + Send + 'static,
    {
        if self.shared.is_closed() {
            return Err(Error::ErrConnectionClosed);
        }

        let (tx, rx) = oneshot::channel();
        self.driver.send(DriverMessage::Enqueue(Operation::new(
            move |pc| op(pc, tx),
            description,
            changes_state,
        )))?;
        rx.await.map_err(|_| Error::ErrOperationDropped)?
    }

    /// query runs `f` on the driver outside the operation queue.
    async fn query<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PeerConnectionInternal) -> T + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.driver.send(DriverMessage::Run(Box::new(move |pc| {
            let _ = tx.send(f(pc));
        })))?;
        rx.await.map_err(|_| Error::ErrOperationDropped)
    }

    /// create_offer builds an offer from the current local description and
    /// the local streams. Nothing is applied until set_local_description.
    pub async fn create_offer(
        &self,
        options: Option<RTCOfferOptions>,
    ) -> Result<RTCSessionDescription> {
        let options = options.unwrap_or_default();
        self.enqueue("create_offer", false, move |pc, tx| {
            pc.create_offer(options, tx)
        })
        .await
    }

    /// create_answer builds an answer to the current remote description.
    pub async fn create_answer(
        &self,
        options: Option<RTCAnswerOptions>,
    ) -> Result<RTCSessionDescription> {
        let options = options.unwrap_or_default();
        self.enqueue("create_answer", false, move |pc, tx| {
            pc.create_answer(options, tx)
        })
        .await
    }

    /// set_local_description applies a local description. When it introduces
    /// new media lines the call resolves only once the backend has supplied
    /// fingerprints, ICE credentials, SSRCs and cnames for every line.
    pub async fn set_local_description(&self, desc: RTCSessionDescription) -> Result<()> {
        if desc.sdp_type == RTCSdpType::Unspecified {
            return Err(Error::ErrSessionDescriptionMissingType);
        }
        self.enqueue("set_local_description", true, move |pc, tx| {
            pc.set_local_description(desc, tx)
        })
        .await
    }

    pub async fn set_remote_description(&self, desc: RTCSessionDescription) -> Result<()> {
        if desc.sdp_type == RTCSdpType::Unspecified {
            return Err(Error::ErrSessionDescriptionMissingType);
        }
        self.enqueue("set_remote_description", true, move |pc, tx| {
            pc.set_remote_description(desc, tx)
        })
        .await
    }

    /// add_ice_candidate accepts a remote candidate for the media line at
    /// `sdp_mline_index`, which must name a line of the remote description.
    pub async fn add_ice_candidate(&self, candidate: RTCIceCandidateInit) -> Result<()> {
        self.enqueue("add_ice_candidate", false, move |pc, tx| {
            pc.add_ice_candidate(candidate, tx)
        })
        .await
    }

    /// close ends the connection. Operations still queued fail, as does one
    /// waiting on the backend. Calling it again does nothing.
    pub fn close(&self) {
        if !self.shared.close() {
            return;
        }
        if let Err(err) = self.driver.send(DriverMessage::Close) {
            log::trace!("negotiation driver already stopped: {err}");
        }
    }

    pub fn signaling_state(&self) -> RTCSignalingState {
        self.shared.signaling_state()
    }

    pub fn ice_gathering_state(&self) -> RTCIceGatheringState {
        self.shared.ice_gathering_state()
    }

    /// get_configuration returns the configuration the connection was created
    /// with.
    pub fn get_configuration(&self) -> &RTCConfiguration {
        &self.configuration
    }

    /// local_description renders the live local description, including
    /// anything the backend has reported since it was applied.
    pub async fn local_description(&self) -> Option<RTCSessionDescription> {
        self.query(|pc| pc.local_description()).await.ok().flatten()
    }

    pub async fn remote_description(&self) -> Option<RTCSessionDescription> {
        self.query(|pc| pc.remote_description()).await.ok().flatten()
    }

    /// add_stream adds a local stream to be sent on the next negotiation.
    /// A stream whose id is already known is ignored.
    pub async fn add_stream(&self, stream: MediaStream) -> Result<()> {
        if self.shared.is_closed() {
            return Err(Error::ErrConnectionClosed);
        }
        self.query(move |pc| pc.add_stream(stream)).await
    }

    pub async fn remove_stream(&self, stream_id: &str) -> Result<()> {
        if self.shared.is_closed() {
            return Err(Error::ErrConnectionClosed);
        }
        let stream_id = SmolStr::new(stream_id);
        self.query(move |pc| pc.remove_stream(&stream_id)).await
    }

    pub async fn local_streams(&self) -> Vec<MediaStream> {
        self.query(|pc| pc.local_streams()).await.unwrap_or_default()
    }

    pub async fn remote_streams(&self) -> Vec<MediaStream> {
        self.query(|pc| pc.remote_streams()).await.unwrap_or_default()
    }

    /// stream_by_id looks a stream up among local streams, then remote ones.
    pub async fn stream_by_id(&self, stream_id: &str) -> Option<MediaStream> {
        let stream_id = SmolStr::new(stream_id);
        self.query(move |pc| pc.stream_by_id(&stream_id))
            .await
            .ok()
            .flatten()
    }
}
