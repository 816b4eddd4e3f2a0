use super::codec::{SdpCodec, SessionDescriptionCodec};
use super::*;
use crate::error::{Error, ErrorKind};
use crate::ice_transport::ice_candidate_type::RTCIceCandidateType;
use crate::rtp_transceiver::RTCPFeedback;

fn remote_offer() -> String {
    [
        "v=0",
        "o=- 4596489990601351948 2 IN IP4 127.0.0.1",
        "s=-",
        "t=0 0",
        "a=fingerprint:sha-256 AB:CD:EF",
        "m=audio 9 UDP/TLS/RTP/SAVPF 111 0",
        "c=IN IP4 0.0.0.0",
        "a=rtcp:9 IN IP4 0.0.0.0",
        "a=ice-ufrag:uFrag",
        "a=ice-pwd:pAssWord",
        "a=setup:actpass",
        "a=sendrecv",
        "a=rtcp-mux",
        "a=rtpmap:111 opus/48000/2",
        "a=fmtp:111 minptime=10",
        "a=rtpmap:0 PCMU/8000",
        "a=ssrc:1001 cname:remote",
        "a=ssrc:1001 msid:s1 a1",
        "a=candidate:1 1 udp 2130706431 192.168.1.2 53987 typ host",
        "m=video 9 UDP/TLS/RTP/SAVPF 100 101",
        "c=IN IP4 0.0.0.0",
        "a=ice-ufrag:uFrag",
        "a=ice-pwd:pAssWord",
        "a=setup:passive",
        "a=recvonly",
        "a=rtpmap:100 VP8/90000",
        "a=rtcp-fb:100 ccm fir",
        "a=rtcp-fb:* nack pli",
        "a=msid:- v1",
        "a=end-of-candidates",
        "",
    ]
    .join("\r\n")
}

#[test]
fn test_parse_remote_offer() -> Result<(), Error> {
    let model = SdpCodec.parse(&remote_offer())?;
    assert_eq!(model.len(), 2);
    assert_eq!(
        model.origin,
        SessionOrigin {
            username: "-".to_owned(),
            session_id: 4596489990601351948,
            session_version: 2,
            address: "127.0.0.1".to_owned(),
        }
    );

    let audio = &model.media_lines[0];
    assert_eq!(audio.kind, RTPCodecType::Audio);
    assert_eq!(audio.direction, RTCRtpTransceiverDirection::Sendrecv);
    assert!(audio.rtcp.mux);
    assert_eq!(audio.rtcp.port, Some(9));
    assert_eq!(audio.rtcp.address.as_deref(), Some("0.0.0.0"));
    assert_eq!(audio.dtls.setup, DTLSRole::Actpass);
    assert_eq!(
        audio.dtls.fingerprint,
        Some(RTCDtlsFingerprint {
            algorithm: "sha-256".to_owned(),
            value: "AB:CD:EF".to_owned(),
        })
    );
    assert_eq!(audio.ice.ufrag.as_deref(), Some("uFrag"));
    assert_eq!(audio.ice.password.as_deref(), Some("pAssWord"));
    assert_eq!(audio.ice.candidates.len(), 1);
    assert_eq!(audio.ice.candidates[0].typ, RTCIceCandidateType::Host);
    assert!(!audio.ice.gathering_done);
    assert_eq!(audio.ssrcs, vec![1001]);
    assert_eq!(audio.cname.as_deref(), Some("remote"));
    assert_eq!(audio.stream_id().map(|s| s.as_str()), Some("s1"));
    assert_eq!(audio.track_id().map(|s| s.as_str()), Some("a1"));
    assert!(audio.has_unspecified_address());

    let names: Vec<&str> = audio
        .payloads
        .iter()
        .map(|p| p.encoding_name.as_str())
        .collect();
    assert_eq!(names, vec!["opus", "PCMU"]);
    assert_eq!(audio.payloads[0].channels, 2);
    assert_eq!(audio.payloads[0].sdp_fmtp_line, "minptime=10");
    assert_eq!(audio.payloads[1].payload_type, 0);
    assert_eq!(audio.payloads[1].channels, 0);

    let video = &model.media_lines[1];
    assert_eq!(video.kind, RTPCodecType::Video);
    assert_eq!(video.direction, RTCRtpTransceiverDirection::Recvonly);
    assert!(!video.rtcp.mux);
    assert_eq!(video.dtls.setup, DTLSRole::Passive);
    // session level fingerprint is inherited
    assert_eq!(video.dtls.fingerprint, audio.dtls.fingerprint);
    assert!(video.ice.gathering_done);
    assert_eq!(video.stream_id(), None);
    assert_eq!(video.track_id().map(|s| s.as_str()), Some("v1"));
    // 101 has no rtpmap
    assert_eq!(video.payloads.len(), 1);
    assert_eq!(
        video.payloads[0].rtcp_feedback,
        vec![
            RTCPFeedback::new("nack", "pli"),
            RTCPFeedback::new("ccm", "fir"),
        ]
    );
    assert!(!video.is_complete());

    Ok(())
}

#[test]
fn test_generate_then_parse() -> Result<(), Error> {
    let mut audio = MediaLine::new(RTPCodecType::Audio);
    audio.track = Some(TrackRef {
        stream_id: Some(SmolStr::new("stream")),
        track_id: SmolStr::new("audio-track"),
    });
    audio.payloads = vec![RTCRtpCodecParameters {
        encoding_name: "opus".to_owned(),
        payload_type: 111,
        clock_rate: 48000,
        channels: 2,
        ..Default::default()
    }];
    audio.rtcp = RtcpInfo {
        mux: true,
        address: Some("192.168.1.2".to_owned()),
        port: Some(5001),
    };
    audio.dtls = DtlsInfo {
        setup: DTLSRole::Actpass,
        fingerprint: Some(RTCDtlsFingerprint {
            algorithm: "sha-256".to_owned(),
            value: "01:02".to_owned(),
        }),
    };
    audio.ice = IceInfo {
        ufrag: Some("ufrag".to_owned()),
        password: Some("password".to_owned()),
        candidates: vec![RTCIceCandidate::unmarshal(
            "1 1 udp 2130706431 192.168.1.2 5000 typ host",
        )?],
        gathering_done: true,
    };
    audio.ssrcs = vec![42];
    audio.cname = Some("cname".to_owned());
    audio.address = Some("192.168.1.2".to_owned());
    audio.port = 5000;
    assert!(audio.is_complete());

    let mut video = MediaLine::new(RTPCodecType::Video);
    video.direction = RTCRtpTransceiverDirection::Recvonly;
    video.payloads = vec![RTCRtpCodecParameters {
        encoding_name: "VP8".to_owned(),
        payload_type: 100,
        clock_rate: 90000,
        rtcp_feedback: vec![RTCPFeedback::new("nack", "pli")],
        ..Default::default()
    }];
    video.dtls.setup = DTLSRole::Actpass;
    video.address = Some("0.0.0.0".to_owned());
    video.port = 9;

    let model = SessionModel {
        media_lines: vec![audio, video],
        ..Default::default()
    };

    let sdp = SdpCodec.generate(&model);
    assert!(sdp.contains("a=msid:stream audio-track"));
    assert!(sdp.contains("a=ssrc:42 cname:cname"));
    assert!(sdp.contains("a=end-of-candidates"));

    let parsed = SdpCodec.parse(&sdp)?;
    assert_eq!(parsed, model);

    Ok(())
}

#[test]
fn test_generate_keeps_origin() -> Result<(), Error> {
    let model = SdpCodec.parse(&remote_offer())?;

    let sdp = SdpCodec.generate(&model);
    assert!(sdp.contains("o=- 4596489990601351948 2 IN IP4 127.0.0.1"));
    assert_eq!(SdpCodec.generate(&model), sdp);

    let next = model.next_revision();
    assert_eq!(next.origin.session_id, model.origin.session_id);
    assert!(SdpCodec
        .generate(&next)
        .contains("o=- 4596489990601351948 3 IN IP4 127.0.0.1"));
    Ok(())
}

#[test]
fn test_generate_line_without_payloads() -> Result<(), Error> {
    let mut line = MediaLine::new(RTPCodecType::Video);
    line.direction = RTCRtpTransceiverDirection::Inactive;
    let model = SessionModel {
        media_lines: vec![line],
        ..Default::default()
    };

    let sdp = SdpCodec.generate(&model);
    assert!(sdp.contains("m=video 0 UDP/TLS/RTP/SAVPF 0"));

    let parsed = SdpCodec.parse(&sdp)?;
    assert_eq!(parsed.len(), 1);
    assert!(parsed.media_lines[0].payloads.is_empty());
    assert_eq!(parsed.media_lines[0].port, 0);
    assert_eq!(
        parsed.media_lines[0].direction,
        RTCRtpTransceiverDirection::Inactive
    );

    Ok(())
}

#[test]
fn test_generate_empty_model() -> Result<(), Error> {
    let sdp = SdpCodec.generate(&SessionModel::default());
    let parsed = SdpCodec.parse(&sdp)?;
    assert!(parsed.is_empty());
    Ok(())
}

#[test]
fn test_parse_failures() {
    let application = [
        "v=0",
        "o=- 1 2 IN IP4 127.0.0.1",
        "s=-",
        "t=0 0",
        "m=application 9 UDP/DTLS/SCTP webrtc-datachannel",
        "c=IN IP4 0.0.0.0",
        "",
    ]
    .join("\r\n");

    let bad_fingerprint = [
        "v=0",
        "o=- 1 2 IN IP4 127.0.0.1",
        "s=-",
        "t=0 0",
        "m=audio 9 UDP/TLS/RTP/SAVPF 0",
        "a=fingerprint:sha-256",
        "",
    ]
    .join("\r\n");

    let bad_candidate = [
        "v=0",
        "o=- 1 2 IN IP4 127.0.0.1",
        "s=-",
        "t=0 0",
        "m=audio 9 UDP/TLS/RTP/SAVPF 0",
        "a=candidate:1 1 udp",
        "",
    ]
    .join("\r\n");

    let tests = vec![
        ("not sdp", "hello".to_owned()),
        ("application", application),
        ("bad fingerprint", bad_fingerprint),
        ("bad candidate", bad_candidate),
    ];

    for (name, sdp) in tests {
        let result = SdpCodec.parse(&sdp);
        match result {
            Err(err) => assert_eq!(err.kind(), ErrorKind::MalformedInput, "{name}: {err}"),
            Ok(model) => panic!("{name}: expected error, got {model:?}"),
        }
    }
}

#[test]
fn test_parse_candidate_prefixes() -> Result<(), Error> {
    let tests = vec![
        "a=candidate:1 1 udp 2130706431 10.0.0.1 5000 typ host",
        "candidate:1 1 udp 2130706431 10.0.0.1 5000 typ host",
        "1 1 udp 2130706431 10.0.0.1 5000 typ host",
    ];

    for raw in tests {
        let candidate = SdpCodec.parse_candidate(raw)?;
        assert_eq!(candidate.address, "10.0.0.1", "{raw}");
        assert_eq!(candidate.port, 5000, "{raw}");
    }

    Ok(())
}
