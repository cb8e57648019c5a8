use anyhow::{anyhow, Context, Result};
use rubato::{FftFixedIn, Resampler};
use std::io::Cursor;

const RESAMPLER_CHUNK_SIZE: usize = 1024;

/// Interleaved 16-bit PCM audio
#[derive(Debug, Clone, PartialEq)]
pub struct PcmAudio {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl PcmAudio {
    pub fn new(samples: Vec<i16>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 || self.channels == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / (self.sample_rate as f64 * self.channels as f64)
    }

    /// Convert into the mono format speech models expect
    pub fn prepare_for_stt(self, target_rate: u32) -> Result<Self> {
        self.to_mono().resample(target_rate)
    }

    /// Down-mix by averaging all channels of each frame
    pub fn to_mono(self) -> Self {
        if self.channels <= 1 {
            return self;
        }

        let channels = self.channels as usize;
        let samples = self
            .samples
            .chunks_exact(channels)
            .map(|frame| {
                let sum: i32 = frame.iter().map(|&s| s as i32).sum();
                (sum / channels as i32) as i16
            })
            .collect();

        Self {
            samples,
            sample_rate: self.sample_rate,
            channels: 1,
        }
    }

    /// Band-limited resample through rubato's FFT resampler
    ///
    /// Multi-channel input is down-mixed first. The output is aligned with
    /// the input (the resampler's delay is dropped) and holds exactly
    /// `len * target_rate / sample_rate` samples.
    pub fn resample(self, target_rate: u32) -> Result<Self> {
        if self.sample_rate == target_rate {
            return Ok(self);
        }
        if self.sample_rate == 0 || self.samples.is_empty() {
            return Ok(Self {
                sample_rate: target_rate,
                ..self
            });
        }

        let mono = self.to_mono();
        let input: Vec<f32> = mono.samples.iter().map(|&s| s as f32 / 32768.0).collect();
        let expected = (input.len() as u64 * target_rate as u64 / mono.sample_rate as u64) as usize;

        let mut resampler = FftFixedIn::<f32>::new(
            mono.sample_rate as usize,
            target_rate as usize,
            RESAMPLER_CHUNK_SIZE,
            1,
            1,
        )
        .map_err(|e| anyhow!("Failed to create resampler: {}", e))?;

        let delay = resampler.output_delay();
        let wanted = delay + expected;

        // Keep feeding zero-padded chunks until the delayed tail is out
        let mut output = Vec::with_capacity(wanted + RESAMPLER_CHUNK_SIZE);
        let mut chunk = vec![0.0f32; RESAMPLER_CHUNK_SIZE];
        let mut pos = 0;
        while output.len() < wanted {
            let take = RESAMPLER_CHUNK_SIZE.min(input.len() - pos);
            chunk[..take].copy_from_slice(&input[pos..pos + take]);
            chunk[take..].fill(0.0);
            pos += take;

            let resampled = resampler
                .process(&[&chunk[..]], None)
                .map_err(|e| anyhow!("Failed to resample audio: {}", e))?;
            output.extend_from_slice(&resampled[0]);
        }

        let samples = output[delay..wanted]
            .iter()
            .map(|&s| (s * 32768.0).round().clamp(i16::MIN as f32, i16::MAX as f32) as i16)
            .collect();

        Ok(Self {
            samples,
            sample_rate: target_rate,
            channels: 1,
        })
    }

    /// Split into frames of `frame_ms` milliseconds (the last may be shorter)
    pub fn frames(&self, frame_ms: u32) -> std::slice::Chunks<'_, i16> {
        let per_frame = (self.sample_rate as usize * self.channels.max(1) as usize * frame_ms as usize / 1000).max(1);
        self.samples.chunks(per_frame)
    }

    /// Encode as a 16-bit PCM WAV file
    pub fn to_wav(&self) -> Result<Vec<u8>> {
        let spec = hound::WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec)
                .context("Failed to create WAV writer")?;
            for &sample in &self.samples {
                writer
                    .write_sample(sample)
                    .context("Failed to write sample to WAV")?;
            }
            writer.finalize().context("Failed to finalize WAV")?;
        }

        Ok(cursor.into_inner())
    }
}

/// Little-endian PCM bytes for a run of samples
pub fn pcm_bytes(samples: &[i16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}
