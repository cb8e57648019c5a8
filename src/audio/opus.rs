use anyhow::{anyhow, bail, Result};
use audiopus::coder::Decoder;
use audiopus::packet::Packet;
use audiopus::{Channels, MutSignals, SampleRate};
use symphonia::core::codecs::CodecParameters;

/// Opus is always decoded at 48 kHz
pub const OPUS_SAMPLE_RATE: u32 = 48000;

/// Longest Opus packet is 120 ms
const MAX_FRAME_SAMPLES: usize = 5760;

/// The parts of the `OpusHead` identification header the decoder needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpusHead {
    pub channels: u8,
    /// Samples per channel the encoder prepended as warm-up
    pub pre_skip: u16,
}

impl OpusHead {
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < 19 || &data[..8] != b"OpusHead" {
            return None;
        }

        Some(Self {
            channels: data[9],
            pre_skip: u16::from_le_bytes([data[10], data[11]]),
        })
    }
}

/// Decodes the packets of an Opus track demuxed from WebM/MKV
pub struct OpusTrackDecoder {
    decoder: Decoder,
    channels: u16,
    skip: usize,
    buffer: Vec<i16>,
}

impl OpusTrackDecoder {
    pub fn new(params: &CodecParameters) -> Result<Self> {
        let head = params.extra_data.as_deref().and_then(OpusHead::parse);
        let count = head
            .map(|h| h.channels as usize)
            .or_else(|| params.channels.map(|c| c.count()))
            .unwrap_or(1);

        let layout = match count {
            1 => Channels::Mono,
            2 => Channels::Stereo,
            other => bail!("Opus tracks with {} channels are not supported", other),
        };

        let decoder = Decoder::new(SampleRate::Hz48000, layout)
            .map_err(|e| anyhow!("Failed to create Opus decoder: {}", e))?;

        Ok(Self {
            decoder,
            channels: count as u16,
            skip: head.map(|h| h.pre_skip as usize).unwrap_or(0),
            buffer: vec![0; MAX_FRAME_SAMPLES * count],
        })
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Decode one packet and append its interleaved samples to `out`
    pub fn decode(&mut self, packet: &[u8], out: &mut Vec<i16>) -> Result<()> {
        let packet = Packet::try_from(packet).map_err(|e| anyhow!("Invalid Opus packet: {}", e))?;
        let output = MutSignals::try_from(&mut self.buffer[..])
            .map_err(|e| anyhow!("Invalid Opus output buffer: {}", e))?;

        let frames = self
            .decoder
            .decode(Some(packet), output, false)
            .map_err(|e| anyhow!("Opus decode failed: {}", e))?;

        // Pre-skip spans packets when the first ones are short
        let dropped = frames.min(self.skip);
        self.skip -= dropped;

        let channels = self.channels as usize;
        out.extend_from_slice(&self.buffer[dropped * channels..frames * channels]);
        Ok(())
    }
}
