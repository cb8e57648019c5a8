//! Audio track extraction for transcription
//!
//! Recordings arrive as browser-produced video containers (MP4, WebM/MKV).
//! `extract_audio` demuxes the first playable audio track with symphonia,
//! decoding Opus with libopus, and `PcmAudio` converts it into the 16kHz
//! mono PCM that speech models expect.

mod extract;
mod opus;
mod pcm;

pub use extract::{extension_for_content_type, extract_audio};
pub use pcm::{pcm_bytes, PcmAudio};
