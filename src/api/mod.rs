#[cfg(test)]
mod api_test;

pub mod media_engine;

use std::sync::Arc;

use media_engine::*;

use crate::error::Result;
use crate::peer_connection::configuration::RTCConfiguration;
use crate::peer_connection::event_handler::PeerConnectionEventHandler;
use crate::peer_connection::sdp::codec::{SdpCodec, SessionDescriptionCodec};
use crate::peer_connection::RTCPeerConnection;
use crate::rtp_transceiver::rtp_codec::{RTCRtpCodecParameters, RTPCodecType};
use crate::transport::{TransportAdapter, TransportEvents};

/// API bundles what every peer connection it creates shares: the codecs it
/// offers and accepts, and the session description codec.
pub struct API {
    pub(crate) media_engine: Arc<MediaEngine>,
    pub(crate) codec: Arc<dyn SessionDescriptionCodec>,
}

impl API {
    /// new_peer_connection creates a new RTCPeerConnection. `make_transport`
    /// builds the media backend, handing it the events handle it reports back
    /// through. Must be called from within a tokio runtime.
    pub async fn new_peer_connection<F>(
        &self,
        configuration: RTCConfiguration,
        handler: Arc<dyn PeerConnectionEventHandler>,
        make_transport: F,
    ) -> Result<RTCPeerConnection>
    where
        F: FnOnce(&RTCConfiguration, TransportEvents) -> Arc<dyn TransportAdapter>,
    {
        RTCPeerConnection::new(self, configuration, handler, make_transport)
    }

    pub fn media_engine(&self) -> &MediaEngine {
        &self.media_engine
    }
}

#[derive(Default)]
pub struct APIBuilder {
    media_engine: Option<MediaEngine>,
    codec: Option<Arc<dyn SessionDescriptionCodec>>,
}

impl APIBuilder {
    pub fn new() -> Self {
        APIBuilder::default()
    }

    /// build creates the API. Without a MediaEngine, one with the default
    /// codecs is used.
    pub fn build(mut self) -> Result<API> {
        let media_engine = match self.media_engine.take() {
            Some(media_engine) => media_engine,
            None => {
                let mut media_engine = MediaEngine::default();
                media_engine.register_default_codecs()?;
                media_engine
            }
        };

        Ok(API {
            media_engine: Arc::new(media_engine),
            codec: self.codec.take().unwrap_or_else(|| Arc::new(SdpCodec)),
        })
    }

    /// with_media_engine allows providing a MediaEngine to the API.
    /// Every PeerConnection created by the API shares it.
    pub fn with_media_engine(mut self, media_engine: MediaEngine) -> Self {
        self.media_engine = Some(media_engine);
        self
    }

    /// with_codec registers one more codec on top of the current engine,
    /// starting from the defaults if no engine was provided.
    pub fn with_codec(mut self, codec: RTCRtpCodecParameters, typ: RTPCodecType) -> Result<Self> {
        let mut media_engine = match self.media_engine.take() {
            Some(media_engine) => media_engine,
            None => {
                let mut media_engine = MediaEngine::default();
                media_engine.register_default_codecs()?;
                media_engine
            }
        };
        media_engine.register_codec(codec, typ)?;
        self.media_engine = Some(media_engine);
        Ok(self)
    }

    /// with_session_description_codec replaces the SDP codec used to parse
    /// and render descriptions.
    pub fn with_session_description_codec(
        mut self,
        codec: Arc<dyn SessionDescriptionCodec>,
    ) -> Self {
        self.codec = Some(codec);
        self
    }
}
