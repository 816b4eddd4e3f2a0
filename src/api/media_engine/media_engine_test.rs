use super::*;

#[test]
fn test_register_default_codecs() -> Result<()> {
    let mut m = MediaEngine::default();
    m.register_default_codecs()?;

    let audio: Vec<(&str, u8, u32, u16)> = m
        .codecs(RTPCodecType::Audio)
        .iter()
        .map(|c| {
            (
                c.encoding_name.as_str(),
                c.payload_type,
                c.clock_rate,
                c.channels,
            )
        })
        .collect();
    assert_eq!(
        audio,
        vec![
            (ENCODING_OPUS, 111, 48000, 2),
            (ENCODING_PCMA, 8, 8000, 1),
            (ENCODING_PCMU, 0, 8000, 1),
        ]
    );

    let video = m.codecs(RTPCodecType::Video);
    assert_eq!(video.len(), 2);
    assert_eq!(video[0].encoding_name, ENCODING_H264);
    assert_eq!(video[0].payload_type, 103);
    assert_eq!(video[1].encoding_name, ENCODING_VP8);
    assert_eq!(video[1].payload_type, 100);
    for codec in video {
        assert_eq!(codec.clock_rate, 90000);
        assert_eq!(
            codec.rtcp_feedback,
            vec![
                RTCPFeedback::new(TYPE_RTCP_FB_CCM, "fir"),
                RTCPFeedback::new(TYPE_RTCP_FB_NACK, "pli"),
            ]
        );
    }

    assert!(m.codecs(RTPCodecType::Unspecified).is_empty());

    Ok(())
}

#[test]
fn test_register_codec_replaces_payload_type() -> Result<()> {
    let mut m = MediaEngine::default();
    m.register_default_codecs()?;
    m.register_codec(
        RTCRtpCodecParameters {
            encoding_name: "G722".to_owned(),
            payload_type: 8,
            clock_rate: 8000,
            ..Default::default()
        },
        RTPCodecType::Audio,
    )?;

    assert_eq!(m.codecs(RTPCodecType::Audio).len(), 3);
    assert!(m.is_supported(RTPCodecType::Audio, "g722"));
    assert!(!m.is_supported(RTPCodecType::Audio, ENCODING_PCMA));

    let result = m.register_codec(RTCRtpCodecParameters::default(), RTPCodecType::Unspecified);
    assert!(result.is_err());

    Ok(())
}

#[test]
fn test_filter_supported_payloads() -> Result<()> {
    let mut m = MediaEngine::default();
    m.register_default_codecs()?;

    let remote = vec![
        RTCRtpCodecParameters {
            encoding_name: "opus".to_owned(),
            payload_type: 109,
            clock_rate: 48000,
            channels: 2,
            ..Default::default()
        },
        RTCRtpCodecParameters {
            encoding_name: "ISAC".to_owned(),
            payload_type: 103,
            clock_rate: 16000,
            ..Default::default()
        },
        RTCRtpCodecParameters {
            encoding_name: "pcmu".to_owned(),
            payload_type: 0,
            clock_rate: 8000,
            ..Default::default()
        },
    ];

    let filtered = m.filter_supported(RTPCodecType::Audio, &remote);
    assert_eq!(filtered, vec![remote[0].clone(), remote[2].clone()]);
    assert!(m.filter_supported(RTPCodecType::Video, &remote).is_empty());

    Ok(())
}
