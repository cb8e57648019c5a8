// Integration tests for audio extraction
//
// WAV and WebM recordings are generated in memory, so no fixtures are needed.

use anyhow::Result;
use audiopus::coder::Encoder;
use audiopus::{Application, Channels, SampleRate};
use live_recorder::audio::{extract_audio, PcmAudio};

fn sine(sample_rate: u32, channels: u16, seconds: f64) -> PcmAudio {
    let frames = (sample_rate as f64 * seconds) as usize;
    let mut samples = Vec::with_capacity(frames * channels as usize);
    for i in 0..frames {
        let t = i as f64 / sample_rate as f64;
        let value = ((t * 440.0 * std::f64::consts::TAU).sin() * 8000.0) as i16;
        for _ in 0..channels {
            samples.push(value);
        }
    }
    PcmAudio::new(samples, sample_rate, channels)
}

#[test]
fn test_extract_wav_preserves_samples() -> Result<()> {
    let original = sine(16000, 1, 0.5);
    let wav = original.to_wav()?;

    let extracted = extract_audio(wav, Some("audio/wav"))?;

    assert_eq!(extracted.sample_rate, 16000);
    assert_eq!(extracted.channels, 1);
    assert_eq!(extracted.samples, original.samples);

    Ok(())
}

#[test]
fn test_extract_stereo_interleaved() -> Result<()> {
    let original = sine(44100, 2, 0.25);
    let extracted = extract_audio(original.to_wav()?, None)?;

    assert_eq!(extracted.channels, 2);
    assert_eq!(extracted.sample_rate, 44100);
    assert_eq!(extracted.samples.len() % 2, 0, "stereo samples come in pairs");
    assert_eq!(extracted.samples.len(), original.samples.len());

    Ok(())
}

#[test]
fn test_extract_ignores_misleading_hint() -> Result<()> {
    // Browsers sometimes label uploads loosely; detection goes by content
    let original = sine(8000, 1, 0.1);
    let extracted = extract_audio(original.to_wav()?, Some("video/mp4"))?;

    assert_eq!(extracted.samples.len(), original.samples.len());

    Ok(())
}

#[test]
fn test_extract_then_prepare_for_stt() -> Result<()> {
    let original = sine(48000, 2, 1.0);
    let audio = extract_audio(original.to_wav()?, Some("audio/wav"))?.prepare_for_stt(16000)?;

    assert_eq!(audio.sample_rate, 16000);
    assert_eq!(audio.channels, 1);
    assert_eq!(audio.samples.len(), 16000);
    assert!((audio.duration_seconds() - 1.0).abs() < 0.001);

    Ok(())
}

#[test]
fn test_extract_empty_input_fails() {
    let result = extract_audio(Vec::new(), Some("video/webm"));
    assert!(result.is_err(), "empty recordings have no audio track");
}

#[test]
fn test_extract_truncated_header_fails() -> Result<()> {
    let wav = sine(16000, 1, 0.1).to_wav()?;
    let result = extract_audio(wav[..20].to_vec(), Some("audio/wav"));

    assert!(result.is_err(), "a cut-off header cannot be probed");

    Ok(())
}

/// EBML element with an 8-byte size field
fn ebml(id: &[u8], payload: &[u8]) -> Vec<u8> {
    let mut out = id.to_vec();
    out.push(0x01);
    out.extend_from_slice(&(payload.len() as u64).to_be_bytes()[1..]);
    out.extend_from_slice(payload);
    out
}

fn ebml_uint(id: &[u8], value: u64) -> Vec<u8> {
    ebml(id, &value.to_be_bytes())
}

fn opus_head(channels: u8, pre_skip: u16) -> Vec<u8> {
    let mut head = b"OpusHead".to_vec();
    head.push(1);
    head.push(channels);
    head.extend_from_slice(&pre_skip.to_le_bytes());
    head.extend_from_slice(&48000u32.to_le_bytes());
    head.extend_from_slice(&[0, 0, 0]);
    head
}

/// Single-track WebM holding the given 20 ms Opus packets, as MediaRecorder writes it
fn opus_webm(packets: &[Vec<u8>], channels: u8, pre_skip: u16) -> Vec<u8> {
    let header = ebml(&[0x1A, 0x45, 0xDF, 0xA3], &ebml(&[0x42, 0x82], b"webm"));
    let info = ebml(&[0x15, 0x49, 0xA9, 0x66], &ebml_uint(&[0x2A, 0xD7, 0xB1], 1_000_000));

    let audio = ebml(
        &[0xE1],
        &[ebml(&[0xB5], &48000f64.to_be_bytes()), ebml_uint(&[0x9F], channels as u64)].concat(),
    );
    let track = ebml(
        &[0xAE],
        &[
            ebml_uint(&[0xD7], 1),
            ebml_uint(&[0x73, 0xC5], 1),
            ebml(&[0x86], b"A_OPUS"),
            ebml(&[0x63, 0xA2], &opus_head(channels, pre_skip)),
            audio,
        ]
        .concat(),
    );
    let tracks = ebml(&[0x16, 0x54, 0xAE, 0x6B], &track);

    let mut cluster = ebml_uint(&[0xE7], 0);
    for (i, packet) in packets.iter().enumerate() {
        let mut block = vec![0x81];
        block.extend_from_slice(&((i * 20) as i16).to_be_bytes());
        block.push(0x80);
        block.extend_from_slice(packet);
        cluster.extend(ebml(&[0xA3], &block));
    }
    let cluster = ebml(&[0x1F, 0x43, 0xB6, 0x75], &cluster);

    let segment = ebml(&[0x18, 0x53, 0x80, 0x67], &[info, tracks, cluster].concat());
    [header, segment].concat()
}

fn encode_opus(audio: &PcmAudio) -> Result<Vec<Vec<u8>>> {
    let encoder = Encoder::new(SampleRate::Hz48000, Channels::Mono, Application::Audio)?;
    let mut packets = Vec::new();
    for frame in audio.samples.chunks_exact(960) {
        let mut packet = vec![0u8; 4000];
        let len = encoder.encode(frame, &mut packet)?;
        packet.truncate(len);
        packets.push(packet);
    }
    Ok(packets)
}

fn rms(samples: &[i16]) -> f64 {
    let sum: f64 = samples.iter().map(|&s| (s as f64) * (s as f64)).sum();
    (sum / samples.len() as f64).sqrt()
}

#[test]
fn test_extract_webm_opus() -> Result<()> {
    let original = sine(48000, 1, 0.5);
    let packets = encode_opus(&original)?;
    assert_eq!(packets.len(), 25);

    let webm = opus_webm(&packets, 1, 312);
    let extracted = extract_audio(webm, Some("video/webm;codecs=vp8,opus"))?;

    assert_eq!(extracted.sample_rate, 48000);
    assert_eq!(extracted.channels, 1);
    assert_eq!(extracted.samples.len(), 25 * 960 - 312);

    let middle = &extracted.samples[6000..18000];
    let ratio = rms(middle) / rms(&original.samples[6000..18000]);
    assert!((0.7..1.3).contains(&ratio), "decoded level off by {}", ratio);

    Ok(())
}

#[test]
fn test_webm_opus_prepares_for_stt() -> Result<()> {
    let original = sine(48000, 1, 1.0);
    let webm = opus_webm(&encode_opus(&original)?, 1, 0);

    let audio = extract_audio(webm, Some("video/webm"))?.prepare_for_stt(16000)?;

    assert_eq!(audio.sample_rate, 16000);
    assert_eq!(audio.channels, 1);
    assert_eq!(audio.samples.len(), 16000);

    Ok(())
}
