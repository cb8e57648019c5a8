use super::opus::{OpusTrackDecoder, OPUS_SAMPLE_RATE};
use super::pcm::PcmAudio;
use anyhow::{anyhow, bail, Context, Result};
use std::io::Cursor;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_OPUS};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, info, warn};

/// File extension implied by a MIME type (`video/webm;codecs=vp9` -> `webm`)
pub fn extension_for_content_type(content_type: &str) -> Option<String> {
    let essence = content_type.split(';').next()?.trim().to_ascii_lowercase();
    let (_, subtype) = essence.split_once('/')?;

    let ext = match subtype {
        "" => return None,
        "x-matroska" | "matroska" => "mkv",
        "quicktime" => "mov",
        "mpeg" => "mp3",
        "x-wav" | "wave" | "vnd.wave" => "wav",
        other => other,
    };

    Some(ext.to_string())
}

/// Decoder picked for the audio track
enum TrackDecoder {
    Native(Box<dyn Decoder>),
    /// symphonia demuxes Opus but has no decoder for it
    Opus(OpusTrackDecoder),
}

/// Demux a media file held in memory and decode its first playable audio track
///
/// The content type only serves as a format hint; the container is detected
/// from its contents.
pub fn extract_audio(data: Vec<u8>, content_type: Option<&str>) -> Result<PcmAudio> {
    let size = data.len();
    let mut hint = Hint::new();
    if let Some(content_type) = content_type {
        hint.mime_type(content_type);
        if let Some(ext) = extension_for_content_type(content_type) {
            hint.with_extension(&ext);
        }
    }

    let mss = MediaSourceStream::new(Box::new(Cursor::new(data)), Default::default());
    let detected = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .context("Unrecognized media container")?;
    let mut format = detected.format;

    // Video tracks have no audio decoder, so the first track that yields one wins
    let codecs = symphonia::default::get_codecs();
    let (track_id, mut decoder) = format
        .tracks()
        .iter()
        .find_map(|track| {
            let decoder = if track.codec_params.codec == CODEC_TYPE_OPUS {
                match OpusTrackDecoder::new(&track.codec_params) {
                    Ok(decoder) => TrackDecoder::Opus(decoder),
                    Err(e) => {
                        warn!("Skipping Opus track {}: {}", track.id, e);
                        return None;
                    }
                }
            } else {
                TrackDecoder::Native(codecs.make(&track.codec_params, &DecoderOptions::default()).ok()?)
            };
            Some((track.id, decoder))
        })
        .ok_or_else(|| anyhow!("No decodable audio track found"))?;

    let (mut sample_rate, mut channels) = match &decoder {
        TrackDecoder::Native(decoder) => (
            decoder.codec_params().sample_rate.unwrap_or(0),
            decoder
                .codec_params()
                .channels
                .map(|c| c.count() as u16)
                .unwrap_or(0),
        ),
        TrackDecoder::Opus(decoder) => (OPUS_SAMPLE_RATE, decoder.channels()),
    };
    let mut samples: Vec<i16> = Vec::new();
    let mut skipped = 0usize;

    debug!("Decoding audio track {} from {} bytes", track_id, size);

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(e).context("Failed to read media packet"),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match &mut decoder {
            TrackDecoder::Native(decoder) => match decoder.decode(&packet) {
                Ok(decoded) => {
                    let spec = *decoded.spec();
                    sample_rate = spec.rate;
                    channels = spec.channels.count() as u16;

                    let mut buffer = SampleBuffer::<i16>::new(decoded.capacity() as u64, spec);
                    buffer.copy_interleaved_ref(decoded);
                    samples.extend_from_slice(buffer.samples());
                }
                Err(SymphoniaError::DecodeError(e)) => {
                    skipped += 1;
                    debug!("Skipping undecodable packet: {}", e);
                }
                Err(e) => return Err(e).context("Failed to decode audio"),
            },
            TrackDecoder::Opus(decoder) => {
                if let Err(e) = decoder.decode(packet.buf(), &mut samples) {
                    skipped += 1;
                    debug!("Skipping undecodable packet: {}", e);
                }
            }
        }
    }

    if skipped > 0 {
        warn!("Skipped {} undecodable audio packets", skipped);
    }

    if sample_rate == 0 || channels == 0 {
        bail!("Audio track has no usable format information");
    }

    let audio = PcmAudio::new(samples, sample_rate, channels);

    info!(
        "Audio extracted: {:.1}s, {}Hz, {} channels, {} samples",
        audio.duration_seconds(),
        audio.sample_rate,
        audio.channels,
        audio.samples.len()
    );

    Ok(audio)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_for_plain_types() {
        assert_eq!(extension_for_content_type("video/mp4").as_deref(), Some("mp4"));
        assert_eq!(extension_for_content_type("video/webm").as_deref(), Some("webm"));
        assert_eq!(extension_for_content_type("audio/wav").as_deref(), Some("wav"));
    }

    #[test]
    fn test_extension_strips_parameters_and_case() {
        assert_eq!(
            extension_for_content_type("Video/WebM; codecs=\"vp8, opus\"").as_deref(),
            Some("webm")
        );
    }

    #[test]
    fn test_extension_maps_aliases() {
        assert_eq!(extension_for_content_type("video/x-matroska").as_deref(), Some("mkv"));
        assert_eq!(extension_for_content_type("video/quicktime").as_deref(), Some("mov"));
    }

    #[test]
    fn test_extension_rejects_bare_words() {
        assert_eq!(extension_for_content_type("mp4"), None);
        assert_eq!(extension_for_content_type("video/"), None);
    }

    #[test]
    fn test_extract_rejects_garbage() {
        let result = extract_audio(vec![0u8; 64], Some("video/mp4"));
        assert!(result.is_err());
    }
}
