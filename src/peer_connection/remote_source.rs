use smol_str::SmolStr;

use crate::media_stream::{MediaStream, MediaStreamTrack, SourceHandle};
use crate::peer_connection::math_rand_alpha;
use crate::peer_connection::sdp::SessionModel;

const LEGACY_STREAM_ID_LEN: usize = 16;

/// RemoteSourceStatus tracks the backend source for one remote media line.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct RemoteSourceStatus {
    /// The remote intends to send on this line.
    pub source_expected: bool,
    pub source: Option<SourceHandle>,
    /// A source arrived since the line was last emitted in a stream.
    pub is_updated: bool,
}

/// RemoteSourceDemuxer turns per line source notifications into grouped
/// remote streams. It holds one status per remote media line.
#[derive(Debug)]
pub(crate) struct RemoteSourceDemuxer {
    statuses: Vec<RemoteSourceStatus>,
    /// Stream id used for lines without one, stable for the connection.
    legacy_stream_id: SmolStr,
}

impl RemoteSourceDemuxer {
    pub(crate) fn new() -> Self {
        RemoteSourceDemuxer {
            statuses: vec![],
            legacy_stream_id: SmolStr::new(math_rand_alpha(LEGACY_STREAM_ID_LEN)),
        }
    }

    pub(crate) fn legacy_stream_id(&self) -> &SmolStr {
        &self.legacy_stream_id
    }

    /// accept_remote refreshes expectations from a newly applied remote
    /// description and extends the statuses for appended lines.
    pub(crate) fn accept_remote(&mut self, remote: &SessionModel) {
        for (i, line) in remote.media_lines.iter().enumerate() {
            let source_expected = line.direction.has_send();
            match self.statuses.get_mut(i) {
                Some(status) => status.source_expected = source_expected,
                None => self.statuses.push(RemoteSourceStatus {
                    source_expected,
                    ..Default::default()
                }),
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn statuses(&self) -> &[RemoteSourceStatus] {
        &self.statuses
    }

    /// on_source records `source` for line `index`. Once every expected line
    /// has a source, the updated lines are emitted grouped by stream id, in
    /// order of first appearance, with ungrouped lines forming a last group.
    pub(crate) fn on_source(
        &mut self,
        index: usize,
        source: SourceHandle,
        remote: &SessionModel,
    ) -> Vec<MediaStream> {
        let Some(status) = self.statuses.get_mut(index) else {
            log::warn!("remote source for unknown media line {index}");
            return vec![];
        };
        status.source = Some(source);
        status.is_updated = true;

        if self
            .statuses
            .iter()
            .any(|s| s.source_expected && s.source.is_none())
        {
            return vec![];
        }

        let mut groups: Vec<(SmolStr, Vec<MediaStreamTrack>)> = vec![];
        let mut legacy: Vec<MediaStreamTrack> = vec![];

        for (status, line) in self.statuses.iter_mut().zip(&remote.media_lines) {
            if !status.is_updated {
                continue;
            }
            let Some(source) = status.source else {
                continue;
            };
            status.is_updated = false;

            let track = MediaStreamTrack::remote(line.track_id(), line.kind, source);
            match line.stream_id() {
                Some(stream_id) => match groups.iter_mut().find(|(id, _)| id == stream_id) {
                    Some((_, tracks)) => tracks.push(track),
                    None => groups.push((stream_id.clone(), vec![track])),
                },
                None => legacy.push(track),
            }
        }

        let mut streams: Vec<MediaStream> = groups
            .into_iter()
            .map(|(id, tracks)| MediaStream::with_id(id, tracks))
            .collect();
        if !legacy.is_empty() {
            streams.push(MediaStream::with_id(self.legacy_stream_id.clone(), legacy));
        }

        streams
    }
}
