use tokio::sync::mpsc;

use crate::dtls_transport::dtls_fingerprint::RTCDtlsFingerprint;
use crate::ice_transport::ice_candidate::RTCIceCandidate;
use crate::media_stream::SourceHandle;
use crate::peer_connection::peer_connection_internal::DriverMessage;
use crate::peer_connection::sdp::SessionModel;

/// TransportAdapter is the media backend a peer connection drives. Calls are
/// made from the negotiation driver and must not block; results come back
/// through the [`TransportEvents`] handle the adapter was created with.
pub trait TransportAdapter: Send + Sync {
    /// prepare_to_receive asks the backend to set up receiving for every line
    /// of the local description. The backend answers with SSRC, fingerprint,
    /// candidate and gathering-done events.
    fn prepare_to_receive(&self, local: &SessionModel, is_initiator: bool);

    /// prepare_to_send asks the backend to send the attached local sources
    /// towards the remote description.
    fn prepare_to_send(&self, remote: &SessionModel, is_initiator: bool);

    fn add_remote_candidate(
        &self,
        candidate: &RTCIceCandidate,
        line_index: usize,
        ufrag: Option<&str>,
        password: Option<&str>,
    );
}

#[derive(Debug, Clone)]
pub(crate) enum TransportEvent {
    SsrcAssigned {
        line_index: usize,
        ssrc: u32,
        cname: String,
    },
    DtlsFingerprint {
        line_index: usize,
        fingerprint: RTCDtlsFingerprint,
    },
    IceCandidate {
        line_index: usize,
        candidate: RTCIceCandidate,
        ufrag: String,
        password: String,
    },
    GatheringDone {
        line_index: usize,
    },
    RemoteSource {
        line_index: usize,
        source: SourceHandle,
    },
}

/// TransportEvents is the backend's way back into a peer connection. It may
/// be cloned and used from any thread; every event is folded in by the
/// negotiation driver in arrival order. Events sent after the connection is
/// gone are dropped.
#[derive(Clone)]
pub struct TransportEvents {
    tx: mpsc::WeakUnboundedSender<DriverMessage>,
}

impl TransportEvents {
    pub(crate) fn new(tx: mpsc::WeakUnboundedSender<DriverMessage>) -> Self {
        TransportEvents { tx }
    }

    fn send(&self, event: TransportEvent) {
        let Some(tx) = self.tx.upgrade() else {
            log::trace!("peer connection gone, dropping {event:?}");
            return;
        };
        if let Err(err) = tx.send(DriverMessage::Transport(event)) {
            log::trace!("negotiation driver stopped: {err}");
        }
    }

    pub fn on_ssrc_assigned(&self, line_index: usize, ssrc: u32, cname: &str) {
        self.send(TransportEvent::SsrcAssigned {
            line_index,
            ssrc,
            cname: cname.to_owned(),
        });
    }

    pub fn on_dtls_fingerprint(&self, line_index: usize, fingerprint: RTCDtlsFingerprint) {
        self.send(TransportEvent::DtlsFingerprint {
            line_index,
            fingerprint,
        });
    }

    /// on_ice_candidate reports a local candidate together with the ICE
    /// credentials of the line it was gathered for.
    pub fn on_ice_candidate(
        &self,
        line_index: usize,
        candidate: RTCIceCandidate,
        ufrag: &str,
        password: &str,
    ) {
        self.send(TransportEvent::IceCandidate {
            line_index,
            candidate,
            ufrag: ufrag.to_owned(),
            password: password.to_owned(),
        });
    }

    pub fn on_gathering_done(&self, line_index: usize) {
        self.send(TransportEvent::GatheringDone { line_index });
    }

    /// on_remote_source reports the decoded source for a remote media line.
    pub fn on_remote_source(&self, line_index: usize, source: SourceHandle) {
        self.send(TransportEvent::RemoteSource { line_index, source });
    }
}
