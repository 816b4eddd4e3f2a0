use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::peer_connection::math_rand_alpha;
use crate::rtp_transceiver::rtp_codec::RTPCodecType;

const GENERATED_ID_LEN: usize = 16;

/// SourceHandle is the backend's opaque reference to a media source, either a
/// local capture device or a decoded remote flow.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceHandle(pub u64);

/// MediaStreamTrack is a single audio or video track, local or remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaStreamTrack {
    pub id: SmolStr,
    pub kind: RTPCodecType,
    pub label: String,
    pub source: Option<SourceHandle>,
}

impl MediaStreamTrack {
    /// new creates a track with a generated id.
    pub fn new(kind: RTPCodecType, label: &str, source: Option<SourceHandle>) -> Self {
        MediaStreamTrack {
            id: SmolStr::new(math_rand_alpha(GENERATED_ID_LEN)),
            kind,
            label: label.to_owned(),
            source,
        }
    }

    pub(crate) fn remote(id: Option<&SmolStr>, kind: RTPCodecType, source: SourceHandle) -> Self {
        MediaStreamTrack {
            id: id
                .cloned()
                .unwrap_or_else(|| SmolStr::new(math_rand_alpha(GENERATED_ID_LEN))),
            kind,
            label: format!("Remote {kind} source"),
            source: Some(source),
        }
    }
}

/// MediaStream groups tracks that are synchronized together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaStream {
    pub id: SmolStr,
    pub tracks: Vec<MediaStreamTrack>,
}

impl MediaStream {
    /// new creates a stream with a generated id.
    pub fn new(tracks: Vec<MediaStreamTrack>) -> Self {
        Self::with_id(SmolStr::new(math_rand_alpha(GENERATED_ID_LEN)), tracks)
    }

    pub fn with_id(id: SmolStr, tracks: Vec<MediaStreamTrack>) -> Self {
        MediaStream { id, tracks }
    }

    pub fn audio_tracks(&self) -> impl Iterator<Item = &MediaStreamTrack> {
        self.tracks
            .iter()
            .filter(|t| t.kind == RTPCodecType::Audio)
    }

    pub fn video_tracks(&self) -> impl Iterator<Item = &MediaStreamTrack> {
        self.tracks
            .iter()
            .filter(|t| t.kind == RTPCodecType::Video)
    }

    pub fn track_by_id(&self, id: &str) -> Option<&MediaStreamTrack> {
        self.tracks.iter().find(|t| t.id == id)
    }

    /// merge_tracks folds `tracks` into the stream. A track whose id is
    /// already present replaces it, others are appended.
    pub(crate) fn merge_tracks(&mut self, tracks: &[MediaStreamTrack]) {
        for track in tracks {
            match self.tracks.iter_mut().find(|t| t.id == track.id) {
                Some(known) => *known = track.clone(),
                None => self.tracks.push(track.clone()),
            }
        }
    }
}
