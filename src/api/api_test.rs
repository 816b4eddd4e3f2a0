use super::*;
use crate::error::ErrorKind;

#[test]
fn test_api_builder_defaults() -> Result<()> {
    let api = APIBuilder::new().build()?;
    assert_eq!(api.media_engine().codecs(RTPCodecType::Audio).len(), 3);
    assert_eq!(api.media_engine().codecs(RTPCodecType::Video).len(), 2);
    Ok(())
}

#[test]
fn test_api_builder_with_media_engine() -> Result<()> {
    let api = APIBuilder::new()
        .with_media_engine(MediaEngine::default())
        .build()?;
    assert!(api.media_engine().codecs(RTPCodecType::Audio).is_empty());
    Ok(())
}

#[test]
fn test_api_builder_with_codec() -> Result<()> {
    let api = APIBuilder::new()
        .with_codec(
            RTCRtpCodecParameters {
                encoding_name: "G722".to_owned(),
                payload_type: 9,
                clock_rate: 8000,
                channels: 1,
                ..Default::default()
            },
            RTPCodecType::Audio,
        )?
        .build()?;
    assert!(api.media_engine().is_supported(RTPCodecType::Audio, "g722"));
    assert!(api.media_engine().is_supported(RTPCodecType::Audio, "opus"));

    let err = APIBuilder::new()
        .with_codec(RTCRtpCodecParameters::default(), RTPCodecType::Unspecified)
        .err();
    assert_eq!(err.map(|e| e.kind()), Some(ErrorKind::MalformedInput));
    Ok(())
}
