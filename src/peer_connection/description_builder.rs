use crate::api::media_engine::MediaEngine;
use crate::dtls_transport::dtls_role::{DTLSRole, DEFAULT_DTLS_ROLE_OFFER};
use crate::error::{Error, Result};
use crate::media_stream::MediaStream;
use crate::peer_connection::offer_answer_options::RTCOfferOptions;
use crate::peer_connection::sdp::{MediaLine, SessionModel, TrackRef};
use crate::rtp_transceiver::rtp_codec::RTPCodecType;
use crate::rtp_transceiver::rtp_transceiver_direction::RTCRtpTransceiverDirection;

/// TrackInfo is a local track as the builder sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TrackInfo {
    pub(crate) kind: RTPCodecType,
    pub(crate) track: TrackRef,
}

/// track_infos flattens `streams` into track infos, stream by stream.
pub(crate) fn track_infos(streams: &[MediaStream]) -> Vec<TrackInfo> {
    streams
        .iter()
        .flat_map(|stream| {
            stream.tracks.iter().map(|track| TrackInfo {
                kind: track.kind,
                track: TrackRef {
                    stream_id: Some(stream.id.clone()),
                    track_id: track.id.clone(),
                },
            })
        })
        .collect()
}

/// update_lines_with_tracks keeps lines whose track is still local, detaches
/// the others, then hands free lines to unplaced tracks of the same kind.
/// Lines left without a track only receive. Tracks that found no line are
/// returned.
fn update_lines_with_tracks(lines: &mut [MediaLine], mut tracks: Vec<TrackInfo>) -> Vec<TrackInfo> {
    for line in lines.iter_mut() {
        let matched = line
            .track_id()
            .and_then(|id| tracks.iter().position(|t| &t.track.track_id == id));
        match matched {
            Some(pos) => {
                tracks.remove(pos);
            }
            None => line.track = None,
        }
    }

    for line in lines.iter_mut().filter(|line| line.track.is_none()) {
        match tracks.iter().position(|t| t.kind == line.kind) {
            Some(pos) => {
                let info = tracks.remove(pos);
                line.track = Some(info.track);
                line.direction = RTCRtpTransceiverDirection::Sendrecv;
            }
            None => line.direction = RTCRtpTransceiverDirection::Recvonly,
        }
    }

    tracks
}

fn new_offer_line(kind: RTPCodecType, media_engine: &MediaEngine) -> MediaLine {
    let mut line = MediaLine::new(kind);
    line.payloads = media_engine.codecs(kind).to_vec();
    line.rtcp.mux = true;
    line.dtls.setup = DEFAULT_DTLS_ROLE_OFFER;
    line
}

/// build_offer derives an offer from the current local model and the local
/// tracks. Existing lines keep their position.
pub(crate) fn build_offer(
    current: Option<&SessionModel>,
    tracks: Vec<TrackInfo>,
    media_engine: &MediaEngine,
    options: &RTCOfferOptions,
) -> SessionModel {
    let mut snapshot = current.map(SessionModel::next_revision).unwrap_or_default();

    let unplaced = update_lines_with_tracks(&mut snapshot.media_lines, tracks);
    for info in unplaced {
        let mut line = new_offer_line(info.kind, media_engine);
        line.track = Some(info.track);
        snapshot.media_lines.push(line);
    }

    for (kind, wanted) in [
        (RTPCodecType::Audio, options.offer_to_receive_audio),
        (RTPCodecType::Video, options.offer_to_receive_video),
    ] {
        let present = snapshot
            .media_lines
            .iter()
            .filter(|line| line.kind == kind)
            .count();
        for _ in present..usize::from(wanted) {
            let mut line = new_offer_line(kind, media_engine);
            line.direction = RTCRtpTransceiverDirection::Recvonly;
            snapshot.media_lines.push(line);
        }
    }

    snapshot
}

/// build_answer derives an answer mirroring every line of `remote`.
pub(crate) fn build_answer(
    current: Option<&SessionModel>,
    remote: Option<&SessionModel>,
    tracks: Vec<TrackInfo>,
) -> Result<SessionModel> {
    let remote = remote.ok_or(Error::ErrNoRemoteDescription)?;
    let mut snapshot = current.map(SessionModel::next_revision).unwrap_or_default();

    for (i, remote_line) in remote.media_lines.iter().enumerate() {
        if i == snapshot.media_lines.len() {
            let mut line = MediaLine::new(remote_line.kind);
            line.dtls.setup = DTLSRole::answer_role(remote_line.dtls.setup);
            snapshot.media_lines.push(line);
        }
        let line = &mut snapshot.media_lines[i];

        line.payloads = remote_line.payloads.clone();
        line.rtcp.mux = remote_line.rtcp.mux;
        if line.dtls.setup == DTLSRole::Actpass {
            line.dtls.setup = DTLSRole::Passive;
        }
    }

    let unplaced = update_lines_with_tracks(&mut snapshot.media_lines, tracks);
    if !unplaced.is_empty() {
        log::debug!("{} local track(s) left out of the answer", unplaced.len());
    }

    Ok(snapshot)
}

#[cfg(test)]
mod test {
    use smol_str::SmolStr;

    use super::*;
    use crate::media_stream::MediaStreamTrack;

    fn media_engine() -> MediaEngine {
        let mut m = MediaEngine::default();
        m.register_default_codecs().unwrap();
        m
    }

    fn info(kind: RTPCodecType, stream_id: &str, track_id: &str) -> TrackInfo {
        TrackInfo {
            kind,
            track: TrackRef {
                stream_id: Some(SmolStr::new(stream_id)),
                track_id: SmolStr::new(track_id),
            },
        }
    }

    fn remote_line(kind: RTPCodecType, setup: DTLSRole) -> MediaLine {
        let mut line = MediaLine::new(kind);
        line.dtls.setup = setup;
        line.rtcp.mux = true;
        line.payloads = media_engine().codecs(kind)[..1].to_vec();
        line
    }

    #[test]
    fn test_track_infos() {
        let audio = MediaStreamTrack::new(RTPCodecType::Audio, "mic", None);
        let stream = MediaStream::with_id(SmolStr::new("s1"), vec![audio.clone()]);
        let infos = track_infos(&[stream]);
        assert_eq!(infos, vec![info(RTPCodecType::Audio, "s1", &audio.id)]);
    }

    #[test]
    fn test_offer_appends_new_tracks() {
        let m = media_engine();
        let offer = build_offer(
            None,
            vec![
                info(RTPCodecType::Audio, "s1", "a1"),
                info(RTPCodecType::Video, "s1", "v1"),
            ],
            &m,
            &RTCOfferOptions::default(),
        );

        assert_eq!(offer.len(), 2);
        let audio = &offer.media_lines[0];
        assert_eq!(audio.kind, RTPCodecType::Audio);
        assert_eq!(audio.track_id().map(|id| id.as_str()), Some("a1"));
        assert_eq!(audio.stream_id().map(|id| id.as_str()), Some("s1"));
        assert_eq!(audio.direction, RTCRtpTransceiverDirection::Sendrecv);
        assert_eq!(audio.dtls.setup, DTLSRole::Actpass);
        assert!(audio.rtcp.mux);
        assert_eq!(audio.payloads, m.codecs(RTPCodecType::Audio));
        assert_eq!(offer.media_lines[1].payloads, m.codecs(RTPCodecType::Video));
    }

    #[test]
    fn test_offer_keeps_positions_and_detaches() {
        let m = media_engine();
        let first = build_offer(
            None,
            vec![
                info(RTPCodecType::Audio, "s1", "a1"),
                info(RTPCodecType::Video, "s1", "v1"),
            ],
            &m,
            &RTCOfferOptions::default(),
        );

        // a1 is gone, v1 stays, a2 reuses the free audio line
        let second = build_offer(
            Some(&first),
            vec![
                info(RTPCodecType::Video, "s1", "v1"),
                info(RTPCodecType::Audio, "s2", "a2"),
            ],
            &m,
            &RTCOfferOptions::default(),
        );
        assert_eq!(second.len(), 2);
        assert_eq!(second.origin.session_id, first.origin.session_id);
        assert_eq!(
            second.origin.session_version,
            first.origin.session_version + 1
        );
        assert_eq!(second.media_lines[0].track_id().map(|id| id.as_str()), Some("a2"));
        assert_eq!(second.media_lines[1].track_id().map(|id| id.as_str()), Some("v1"));

        // with no tracks the lines stay as receive-only placeholders
        let third = build_offer(Some(&second), vec![], &m, &RTCOfferOptions::default());
        assert_eq!(third.len(), 2);
        for line in &third.media_lines {
            assert!(line.track.is_none());
            assert_eq!(line.direction, RTCRtpTransceiverDirection::Recvonly);
        }
    }

    #[test]
    fn test_offer_to_receive_shortfall() {
        let m = media_engine();
        let options = RTCOfferOptions {
            offer_to_receive_audio: 1,
            offer_to_receive_video: 2,
        };
        let offer = build_offer(
            None,
            vec![info(RTPCodecType::Audio, "s1", "a1")],
            &m,
            &options,
        );

        let kinds: Vec<(RTPCodecType, RTCRtpTransceiverDirection)> = offer
            .media_lines
            .iter()
            .map(|line| (line.kind, line.direction))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (RTPCodecType::Audio, RTCRtpTransceiverDirection::Sendrecv),
                (RTPCodecType::Video, RTCRtpTransceiverDirection::Recvonly),
                (RTPCodecType::Video, RTCRtpTransceiverDirection::Recvonly),
            ]
        );

        // a second offer with the same options appends nothing
        let again = build_offer(
            Some(&offer),
            vec![info(RTPCodecType::Audio, "s1", "a1")],
            &m,
            &options,
        );
        assert_eq!(again.len(), 3);
    }

    #[test]
    fn test_answer_without_remote() {
        let err = build_answer(None, None, vec![]).unwrap_err();
        assert_eq!(err, Error::ErrNoRemoteDescription);
        assert_eq!(err.kind(), crate::error::ErrorKind::InvalidState);
    }

    #[test]
    fn test_answer_mirrors_remote() {
        let mut remote = SessionModel {
            media_lines: vec![
                remote_line(RTPCodecType::Audio, DTLSRole::Actpass),
                remote_line(RTPCodecType::Video, DTLSRole::Actpass),
            ],
            ..Default::default()
        };
        remote.media_lines[1].rtcp.mux = false;

        let answer = build_answer(
            None,
            Some(&remote),
            vec![
                info(RTPCodecType::Audio, "s1", "a1"),
                info(RTPCodecType::Audio, "s1", "a2"),
            ],
        )
        .unwrap();

        assert_eq!(answer.len(), 2);
        assert_eq!(answer.media_lines[0].payloads, remote.media_lines[0].payloads);
        assert!(answer.media_lines[0].rtcp.mux);
        assert!(!answer.media_lines[1].rtcp.mux);
        assert_eq!(answer.media_lines[0].track_id().map(|id| id.as_str()), Some("a1"));
        assert_eq!(
            answer.media_lines[1].direction,
            RTCRtpTransceiverDirection::Recvonly
        );
    }

    #[test]
    fn test_offer_answer_dtls_roles_complement() {
        let m = media_engine();
        let offer = build_offer(
            None,
            vec![
                info(RTPCodecType::Audio, "s1", "a1"),
                info(RTPCodecType::Video, "s1", "v1"),
            ],
            &m,
            &RTCOfferOptions::default(),
        );
        assert!(offer
            .media_lines
            .iter()
            .all(|line| line.dtls.setup == DTLSRole::Actpass));

        let tests = vec![
            (DTLSRole::Actpass, DTLSRole::Passive),
            (DTLSRole::Active, DTLSRole::Passive),
            (DTLSRole::Passive, DTLSRole::Active),
        ];
        for (remote_role, expected) in tests {
            let mut remote = offer.clone();
            for line in &mut remote.media_lines {
                line.dtls.setup = remote_role;
            }
            let answer = build_answer(
                None,
                Some(&remote),
                vec![
                    info(RTPCodecType::Audio, "s2", "a2"),
                    info(RTPCodecType::Video, "s2", "v2"),
                ],
            )
            .unwrap();
            assert_eq!(answer.len(), 2);
            for line in &answer.media_lines {
                assert_eq!(line.dtls.setup, expected, "remote {remote_role}");
            }
        }
    }

    #[test]
    fn test_answer_resolves_local_actpass() {
        let remote = SessionModel {
            media_lines: vec![remote_line(RTPCodecType::Audio, DTLSRole::Active)],
            ..Default::default()
        };
        let mut current = SessionModel {
            media_lines: vec![MediaLine::new(RTPCodecType::Audio)],
            ..Default::default()
        };
        current.media_lines[0].dtls.setup = DTLSRole::Actpass;

        let answer = build_answer(Some(&current), Some(&remote), vec![]).unwrap();
        assert_eq!(answer.media_lines[0].dtls.setup, DTLSRole::Passive);
    }
}
