use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use portable_atomic::{AtomicBool, AtomicU8};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

use super::*;
use crate::transport::TransportEvent;

/// SharedState is the part of a peer connection the handle reads without a
/// round trip through the driver.
pub(crate) struct SharedState {
    is_closed: AtomicBool,
    signaling_state: AtomicU8,
    ice_gathering_state: AtomicU8,
}

impl SharedState {
    pub(crate) fn new() -> Self {
        SharedState {
            is_closed: AtomicBool::new(false),
            signaling_state: AtomicU8::new(RTCSignalingState::Stable as u8),
            ice_gathering_state: AtomicU8::new(RTCIceGatheringState::New as u8),
        }
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.is_closed.load(Ordering::SeqCst)
    }

    /// close marks the connection closed. It returns false if it already was.
    pub(crate) fn close(&self) -> bool {
        if self.is_closed.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.signaling_state
            .store(RTCSignalingState::Closed as u8, Ordering::SeqCst);
        true
    }

    pub(crate) fn signaling_state(&self) -> RTCSignalingState {
        self.signaling_state.load(Ordering::SeqCst).into()
    }

    pub(crate) fn ice_gathering_state(&self) -> RTCIceGatheringState {
        self.ice_gathering_state.load(Ordering::SeqCst).into()
    }
}

pub(crate) type DriverFn = Box<dyn FnOnce(&mut PeerConnectionInternal) + Send + 'static>;

/// DriverMessage is everything the negotiation driver reacts to.
pub(crate) enum DriverMessage {
    /// Append a negotiation operation to the queue.
    Enqueue(Operation<PeerConnectionInternal>),
    /// Run a closure against the state right away, outside the queue.
    Run(DriverFn),
    Close,
    CheckNegotiationNeeded,
    NegotiationNeededTimer,
    Transport(TransportEvent),
}

/// PendingCompletion is a set-local operation waiting for the backend to fill
/// in the local description.
struct PendingCompletion {
    target: RTCSignalingState,
    result: oneshot::Sender<Result<()>>,
}

/// PeerConnectionInternal owns every piece of mutable negotiation state. It
/// lives inside the driver task and is only touched from there.
pub(crate) struct PeerConnectionInternal {
    shared: Arc<SharedState>,
    media_engine: Arc<MediaEngine>,
    codec: Arc<dyn SessionDescriptionCodec>,
    transport: Arc<dyn TransportAdapter>,
    events: mpsc::UnboundedSender<PeerConnectionEvent>,
    driver: mpsc::WeakUnboundedSender<DriverMessage>,

    ops: Operations<PeerConnectionInternal>,
    pending: Option<PendingCompletion>,
    completion: CompletionTracker,

    local: Option<SessionModel>,
    local_type: RTCSdpType,
    remote: Option<SessionModel>,
    remote_type: RTCSdpType,
    remote_sources: RemoteSourceDemuxer,

    local_streams: Vec<MediaStream>,
    remote_streams: Vec<MediaStream>,

    gathering_done_reported: bool,
    negotiation_needed_pending: bool,
}

impl PeerConnectionInternal {
    pub(crate) fn new(
        api: &API,
        shared: Arc<SharedState>,
        transport: Arc<dyn TransportAdapter>,
        events: mpsc::UnboundedSender<PeerConnectionEvent>,
        driver: mpsc::WeakUnboundedSender<DriverMessage>,
    ) -> Self {
        PeerConnectionInternal {
            shared,
            media_engine: Arc::clone(&api.media_engine),
            codec: Arc::clone(&api.codec),
            transport,
            events,
            driver,
            ops: Operations::new(),
            pending: None,
            completion: CompletionTracker::default(),
            local: None,
            local_type: RTCSdpType::Unspecified,
            remote: None,
            remote_type: RTCSdpType::Unspecified,
            remote_sources: RemoteSourceDemuxer::new(),
            local_streams: vec![],
            remote_streams: vec![],
            gathering_done_reported: false,
            negotiation_needed_pending: false,
        }
    }

    /// run is the driver loop. Scheduled operations run before the next
    /// message is taken, so an operation started by one message runs ahead
    /// of anything queued behind it.
    pub(crate) async fn run(mut self, mut rx: mpsc::UnboundedReceiver<DriverMessage>) {
        loop {
            while let Some(op) = self.ops.take_scheduled() {
                op(&mut self);
            }

            let Some(msg) = rx.recv().await else {
                break;
            };
            self.handle_message(msg);
        }
        log::trace!("negotiation driver stopped");
    }

    fn handle_message(&mut self, msg: DriverMessage) {
        match msg {
            DriverMessage::Enqueue(op) => self.ops.enqueue(op),
            DriverMessage::Run(f) => f(self),
            DriverMessage::Close => self.close(),
            DriverMessage::CheckNegotiationNeeded => self.maybe_negotiation_needed(),
            DriverMessage::NegotiationNeededTimer => {
                self.negotiation_needed_pending = false;
                if self.signaling_state() == RTCSignalingState::Stable {
                    self.emit(PeerConnectionEvent::NegotiationNeeded);
                }
            }
            DriverMessage::Transport(event) => self.handle_transport_event(event),
        }
    }

    fn signaling_state(&self) -> RTCSignalingState {
        self.shared.signaling_state()
    }

    fn emit(&self, event: PeerConnectionEvent) {
        if let Err(err) = self.events.send(event) {
            log::trace!("event dispatcher stopped, dropping {:?}", err.0);
        }
    }

    /// post queues a message for a later turn of the driver loop.
    fn post(&self, msg: DriverMessage) {
        if let Some(tx) = self.driver.upgrade() {
            let _ = tx.send(msg);
        }
    }

    /// complete_operation retires the current operation, then runs
    /// `callback`. A panicking callback is logged and leaves the queue intact.
    fn complete_operation(&mut self, callback: impl FnOnce(&mut Self)) {
        let drained = self.ops.complete();

        if let Err(panic) = panic::catch_unwind(AssertUnwindSafe(|| callback(self))) {
            log::error!(
                "operation completion callback panicked: {}",
                panic_message(panic.as_ref())
            );
        }

        if drained {
            self.maybe_negotiation_needed();
        }
    }

    fn resolve<T: Send + 'static>(&mut self, tx: oneshot::Sender<Result<T>>, value: T) {
        self.complete_operation(move |_| {
            let _ = tx.send(Ok(value));
        });
    }

    fn reject<T: Send + 'static>(&mut self, tx: oneshot::Sender<Result<T>>, err: Error) {
        log::debug!("operation failed: {err}");
        self.complete_operation(move |_| {
            let _ = tx.send(Err(err));
        });
    }

    fn commit_signaling_state(&mut self, next: RTCSignalingState) {
        let prev = self.shared.signaling_state.fetch_update(
            Ordering::SeqCst,
            Ordering::SeqCst,
            |cur| (cur != RTCSignalingState::Closed as u8).then_some(next as u8),
        );
        match prev {
            Ok(prev) if RTCSignalingState::from(prev) != next => {
                log::info!("signaling state changed to {next}");
                self.emit(PeerConnectionEvent::SignalingStateChange(next));
            }
            Ok(_) => {}
            Err(_) => log::debug!("connection closed, not entering {next}"),
        }
    }

    fn refresh_ice_gathering_state(&mut self) {
        let next = match &self.local {
            Some(local) if !local.is_empty() => {
                if self.gathering_done_reported {
                    RTCIceGatheringState::Complete
                } else {
                    RTCIceGatheringState::Gathering
                }
            }
            _ => RTCIceGatheringState::New,
        };
        let prev: RTCIceGatheringState = self
            .shared
            .ice_gathering_state
            .swap(next as u8, Ordering::SeqCst)
            .into();
        if prev != next {
            log::debug!("ice gathering state changed to {next}");
            self.emit(PeerConnectionEvent::IceGatheringStateChange(next));
        }
    }

    pub(crate) fn create_offer(
        &mut self,
        options: RTCOfferOptions,
        tx: oneshot::Sender<Result<RTCSessionDescription>>,
    ) {
        if self.shared.is_closed() {
            return self.reject(tx, Error::ErrConnectionClosed);
        }

        let offer = build_offer(
            self.local.as_ref(),
            track_infos(&self.local_streams),
            &self.media_engine,
            &options,
        );
        let sdp = self.codec.generate(&offer);
        self.resolve(tx, RTCSessionDescription::offer(sdp));
    }

    pub(crate) fn create_answer(
        &mut self,
        _options: RTCAnswerOptions,
        tx: oneshot::Sender<Result<RTCSessionDescription>>,
    ) {
        if self.shared.is_closed() {
            return self.reject(tx, Error::ErrConnectionClosed);
        }

        match build_answer(
            self.local.as_ref(),
            self.remote.as_ref(),
            track_infos(&self.local_streams),
        ) {
            Ok(answer) => {
                let sdp = self.codec.generate(&answer);
                self.resolve(tx, RTCSessionDescription::answer(sdp));
            }
            Err(err) => self.reject(tx, err),
        }
    }

    pub(crate) fn set_local_description(
        &mut self,
        desc: RTCSessionDescription,
        tx: oneshot::Sender<Result<()>>,
    ) {
        let next = match check_next_signaling_state(
            self.signaling_state(),
            StateChangeOp::SetLocal,
            desc.sdp_type,
        ) {
            Ok(next) => next,
            Err(err) => return self.reject(tx, err),
        };
        let model = match self.codec.parse(&desc.sdp) {
            Ok(model) => model,
            Err(err) => return self.reject(tx, err),
        };

        let previous = self.local.as_ref().map_or(0, SessionModel::len);
        if model.len() < previous {
            return self.reject(
                tx,
                Error::ErrMediaLineRemoved {
                    expected: previous,
                    got: model.len(),
                },
            );
        }
        let has_new_lines = model.len() > previous;
        let is_initiator = desc.sdp_type == RTCSdpType::Offer;

        self.completion.reset(&model);
        self.gathering_done_reported = false;
        self.local_type = desc.sdp_type;
        let local = self.local.insert(model);

        if has_new_lines {
            self.transport.prepare_to_receive(local, is_initiator);
        }
        if let Some(remote) = &self.remote {
            self.transport.prepare_to_send(remote, is_initiator);
        }
        self.refresh_ice_gathering_state();

        if has_new_lines {
            self.pending = Some(PendingCompletion {
                target: next,
                result: tx,
            });
            if self.completion.is_complete() {
                self.fire_pending_completion();
            }
        } else {
            self.complete_operation(move |pc| {
                pc.commit_signaling_state(next);
                let _ = tx.send(Ok(()));
            });
        }
        self.maybe_gathering_done();
    }

    fn fire_pending_completion(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        self.complete_operation(move |pc| {
            pc.commit_signaling_state(pending.target);
            let _ = pending.result.send(Ok(()));
        });
    }

    pub(crate) fn set_remote_description(
        &mut self,
        desc: RTCSessionDescription,
        tx: oneshot::Sender<Result<()>>,
    ) {
        let next = match check_next_signaling_state(
            self.signaling_state(),
            StateChangeOp::SetRemote,
            desc.sdp_type,
        ) {
            Ok(next) => next,
            Err(err) => return self.reject(tx, err),
        };
        let mut model = match self.codec.parse(&desc.sdp) {
            Ok(model) => model,
            Err(err) => return self.reject(tx, err),
        };

        let previous = self.remote.as_ref().map_or(0, SessionModel::len);
        if model.len() < previous {
            return self.reject(
                tx,
                Error::ErrMediaLineRemoved {
                    expected: previous,
                    got: model.len(),
                },
            );
        }

        for (i, line) in model.media_lines.iter_mut().enumerate() {
            if !line.ice.has_credentials() {
                log::warn!("remote media line {i} is missing ICE credentials");
            }
            line.payloads = self.media_engine.filter_supported(line.kind, &line.payloads);
        }
        attach_local_sources(&mut model, &self.local_streams);

        self.remote_sources.accept_remote(&model);
        self.remote_type = desc.sdp_type;
        let is_initiator = desc.sdp_type == RTCSdpType::Answer;
        let remote = self.remote.insert(model);
        self.transport.prepare_to_send(remote, is_initiator);
        self.drop_stale_remote_streams();

        self.complete_operation(move |pc| {
            pc.commit_signaling_state(next);
            let _ = tx.send(Ok(()));
        });
    }

    pub(crate) fn add_ice_candidate(
        &mut self,
        candidate: RTCIceCandidateInit,
        tx: oneshot::Sender<Result<()>>,
    ) {
        if self.shared.is_closed() {
            return self.reject(tx, Error::ErrConnectionClosed);
        }
        let Some(remote_len) = self.remote.as_ref().map(SessionModel::len) else {
            return self.reject(tx, Error::ErrNoRemoteDescription);
        };
        let parsed = match self.codec.parse_candidate(&candidate.candidate) {
            Ok(parsed) => parsed,
            Err(err) => return self.reject(tx, err),
        };
        let index = match candidate.sdp_mline_index {
            Some(index) if usize::from(index) < remote_len => usize::from(index),
            index => return self.reject(tx, Error::ErrNoMatchingMediaLine(index)),
        };

        if let Some(line) = line_mut(&mut self.remote, index) {
            line.ice.candidates.push(parsed.clone());
            self.transport.add_remote_candidate(
                &parsed,
                index,
                line.ice.ufrag.as_deref(),
                line.ice.password.as_deref(),
            );
        }
        self.resolve(tx, ());
    }

    fn close(&mut self) {
        log::info!("signaling state changed to {}", RTCSignalingState::Closed);
        self.emit(PeerConnectionEvent::SignalingStateChange(
            RTCSignalingState::Closed,
        ));

        if let Some(pending) = self.pending.take() {
            self.complete_operation(move |_| {
                let _ = pending.result.send(Err(Error::ErrConnectionClosed));
            });
        }
    }

    pub(crate) fn add_stream(&mut self, stream: MediaStream) {
        let known = self
            .local_streams
            .iter()
            .chain(&self.remote_streams)
            .any(|s| s.id == stream.id);
        if known {
            log::debug!("stream {} already added", stream.id);
            return;
        }
        self.local_streams.push(stream);
        self.post(DriverMessage::CheckNegotiationNeeded);
    }

    pub(crate) fn remove_stream(&mut self, stream_id: &str) {
        let before = self.local_streams.len();
        self.local_streams.retain(|s| s.id != stream_id);
        if self.local_streams.len() != before {
            self.post(DriverMessage::CheckNegotiationNeeded);
        }
    }

    pub(crate) fn local_streams(&self) -> Vec<MediaStream> {
        self.local_streams.clone()
    }

    pub(crate) fn remote_streams(&self) -> Vec<MediaStream> {
        self.remote_streams.clone()
    }

    pub(crate) fn stream_by_id(&self, stream_id: &str) -> Option<MediaStream> {
        self.local_streams
            .iter()
            .chain(&self.remote_streams)
            .find(|s| s.id == stream_id)
            .cloned()
    }

    pub(crate) fn local_description(&self) -> Option<RTCSessionDescription> {
        self.local.as_ref().map(|local| RTCSessionDescription {
            sdp_type: self.local_type,
            sdp: self.codec.generate(local),
        })
    }

    pub(crate) fn remote_description(&self) -> Option<RTCSessionDescription> {
        self.remote.as_ref().map(|remote| RTCSessionDescription {
            sdp_type: self.remote_type,
            sdp: self.codec.generate(remote),
        })
    }

    /// maybe_negotiation_needed arms the negotiation-needed timer when the
    /// connection is stable and idle and local tracks diverge from the lines.
    fn maybe_negotiation_needed(&mut self) {
        if self.negotiation_needed_pending
            || !self.ops.is_empty()
            || self.signaling_state() != RTCSignalingState::Stable
        {
            return;
        }
        if !self.is_negotiation_needed() {
            return;
        }

        self.negotiation_needed_pending = true;
        self.post(DriverMessage::NegotiationNeededTimer);
    }

    fn is_negotiation_needed(&self) -> bool {
        let lines = self
            .local
            .as_ref()
            .map_or(&[][..], |local| local.media_lines.as_slice());
        let track_ids: Vec<&SmolStr> = self
            .local_streams
            .iter()
            .flat_map(|s| s.tracks.iter().map(|t| &t.id))
            .collect();

        let unsent_track = track_ids
            .iter()
            .any(|id| !lines.iter().any(|line| line.track_id() == Some(*id)));
        let stale_line = lines
            .iter()
            .filter_map(MediaLine::track_id)
            .any(|id| !track_ids.contains(&id));

        unsent_track || stale_line
    }

    /// maybe_gathering_done reports the end of candidates once per local
    /// description.
    fn maybe_gathering_done(&mut self) {
        if self.gathering_done_reported {
            return;
        }
        let Some(local) = &self.local else {
            return;
        };
        if local.is_empty()
            || !local.media_lines.iter().all(|line| line.ice.gathering_done)
            || !local.is_complete()
        {
            return;
        }

        self.gathering_done_reported = true;
        self.refresh_ice_gathering_state();
        self.emit(PeerConnectionEvent::IceCandidate(
            RTCPeerConnectionIceEvent { candidate: None },
        ));
    }

    fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::SsrcAssigned {
                line_index,
                ssrc,
                cname,
            } => {
                let Some(line) = line_mut(&mut self.local, line_index) else {
                    log::warn!("ssrc for unknown local media line {line_index}");
                    return;
                };
                if !line.ssrcs.contains(&ssrc) {
                    line.ssrcs.push(ssrc);
                }
                line.cname = Some(cname);

                if self.completion.update(line_index, line) {
                    self.fire_pending_completion();
                }
                self.maybe_gathering_done();
            }
            TransportEvent::DtlsFingerprint {
                line_index,
                fingerprint,
            } => {
                let Some(line) = line_mut(&mut self.local, line_index) else {
                    log::warn!("fingerprint for unknown local media line {line_index}");
                    return;
                };
                line.dtls.fingerprint = Some(fingerprint);

                if self.completion.update(line_index, line) {
                    self.fire_pending_completion();
                }
                self.maybe_gathering_done();
            }
            TransportEvent::IceCandidate {
                line_index,
                candidate,
                ufrag,
                password,
            } => self.add_local_candidate(line_index, candidate, ufrag, password),
            TransportEvent::GatheringDone { line_index } => {
                let Some(line) = line_mut(&mut self.local, line_index) else {
                    log::warn!("gathering done for unknown local media line {line_index}");
                    return;
                };
                line.ice.gathering_done = true;
                self.maybe_gathering_done();
            }
            TransportEvent::RemoteSource { line_index, source } => {
                let Some(remote) = &self.remote else {
                    log::warn!("remote source {source:?} before any remote description");
                    return;
                };
                let streams = self.remote_sources.on_source(line_index, source, remote);
                for stream in streams {
                    log::debug!("remote stream {} ready", stream.id);
                    match self.remote_streams.iter_mut().find(|s| s.id == stream.id) {
                        Some(known) => known.merge_tracks(&stream.tracks),
                        None => self.remote_streams.push(stream.clone()),
                    }
                    self.emit(PeerConnectionEvent::AddStream(stream));
                }
            }
        }
    }

    fn add_local_candidate(
        &mut self,
        line_index: usize,
        candidate: RTCIceCandidate,
        ufrag: String,
        password: String,
    ) {
        let Some(line) = line_mut(&mut self.local, line_index) else {
            log::warn!("candidate for unknown local media line {line_index}");
            return;
        };

        if !line.ice.has_credentials() {
            line.ice.ufrag = Some(ufrag);
            line.ice.password = Some(password);
        }
        if candidate.is_ipv4() {
            if candidate.component == 1 {
                if line.has_unspecified_address() {
                    line.address = Some(candidate.address.clone());
                    line.port = candidate.port;
                }
            } else if line.rtcp.address.is_none() || line.rtcp.port.is_none() {
                line.rtcp.address = Some(candidate.address.clone());
                line.rtcp.port = Some(candidate.port);
            }
        }
        line.ice.candidates.push(candidate.clone());

        let became_complete = self.completion.update(line_index, line);
        if !self.completion.is_complete() {
            return;
        }
        if became_complete && self.pending.is_some() {
            self.fire_pending_completion();
            self.maybe_gathering_done();
        } else {
            let index = u16::try_from(line_index).unwrap_or(u16::MAX);
            self.emit(PeerConnectionEvent::IceCandidate(
                RTCPeerConnectionIceEvent {
                    candidate: Some(candidate.to_json(index)),
                },
            ));
        }
    }

    /// drop_stale_remote_streams removes remote streams the current remote
    /// description no longer references.
    fn drop_stale_remote_streams(&mut self) {
        let Some(remote) = &self.remote else {
            return;
        };
        let legacy_id = self.remote_sources.legacy_stream_id();
        let (kept, removed): (Vec<MediaStream>, Vec<MediaStream>) =
            std::mem::take(&mut self.remote_streams)
                .into_iter()
                .partition(|stream| {
                    remote.media_lines.iter().any(|line| match line.stream_id() {
                        Some(id) => *id == stream.id,
                        None => stream.id == *legacy_id,
                    })
                });
        self.remote_streams = kept;

        for stream in removed {
            log::debug!("remote stream {} removed", stream.id);
            self.emit(PeerConnectionEvent::RemoveStream(stream));
        }
    }
}

fn line_mut(model: &mut Option<SessionModel>, index: usize) -> Option<&mut MediaLine> {
    model.as_mut().and_then(|m| m.media_lines.get_mut(index))
}

/// attach_local_sources gives each remote line the source of a local track of
/// the same kind, each track used once.
fn attach_local_sources(remote: &mut SessionModel, local_streams: &[MediaStream]) {
    let mut tracks: Vec<&MediaStreamTrack> =
        local_streams.iter().flat_map(|s| s.tracks.iter()).collect();
    for line in &mut remote.media_lines {
        if let Some(pos) = tracks.iter().position(|t| t.kind == line.kind) {
            line.source = tracks.remove(pos).source;
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}
