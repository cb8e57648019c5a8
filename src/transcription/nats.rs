use super::Transcriber;
use crate::audio::{pcm_bytes, PcmAudio};
use crate::config::TranscriptionConfig;
use crate::nats::{NatsClient, TranscriptMessage};
use anyhow::Result;
use async_trait::async_trait;
use futures::stream::{Stream, StreamExt};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Frame length published to the STT service
const FRAME_MS: u32 = 100;

/// Transcriber backed by the NATS speech-to-text service
///
/// Audio goes out as a burst of 100ms frames followed by a final marker.
/// Final transcript segments for the session are then collected, see
/// [`collect_segments`].
pub struct NatsTranscriber {
    client: NatsClient,
    sample_rate: u32,
    idle_timeout: Duration,
    max_wait: Duration,
}

impl NatsTranscriber {
    pub async fn connect(config: &TranscriptionConfig) -> Result<Self> {
        let client = NatsClient::connect(&config.nats_url).await?;

        Ok(Self {
            client,
            sample_rate: config.sample_rate,
            idle_timeout: Duration::from_secs(config.idle_timeout_secs),
            max_wait: Duration::from_secs(config.max_wait_secs),
        })
    }
}

/// Text of a final segment belonging to `session_id`, if the payload is one
pub(crate) fn final_segment(payload: &[u8], session_id: &str) -> Option<String> {
    match serde_json::from_slice::<TranscriptMessage>(payload) {
        Ok(msg) if msg.session_id == session_id && !msg.partial => {
            let text = msg.text.trim();
            (!text.is_empty()).then(|| text.to_string())
        }
        Ok(_) => None,
        Err(e) => {
            warn!("Failed to parse transcript message: {}", e);
            None
        }
    }
}

/// Gather the final segments for `session_id` from a transcript stream
///
/// Waits up to `max_wait` for the first segment. After that, collection
/// stops once no further segment has arrived for `idle_timeout`, when the
/// stream ends, or when `max_wait` runs out. Partials and messages for
/// other sessions do not count as activity.
pub(crate) async fn collect_segments<S, B>(
    mut stream: S,
    session_id: &str,
    idle_timeout: Duration,
    max_wait: Duration,
) -> Vec<String>
where
    S: Stream<Item = B> + Unpin,
    B: AsRef<[u8]>,
{
    let deadline = Instant::now() + max_wait;
    let mut last_segment: Option<Instant> = None;
    let mut segments = Vec::new();

    loop {
        let until = match last_segment {
            Some(at) => (at + idle_timeout).min(deadline),
            None => deadline,
        };

        match tokio::time::timeout_at(until, stream.next()).await {
            Ok(Some(payload)) => {
                if let Some(text) = final_segment(payload.as_ref(), session_id) {
                    segments.push(text);
                    last_segment = Some(Instant::now());
                }
            }
            Ok(None) => {
                debug!("Transcript stream closed for {}", session_id);
                break;
            }
            Err(_) if Instant::now() >= deadline => {
                warn!("Transcript for {} hit the {:?} deadline", session_id, max_wait);
                break;
            }
            Err(_) => break,
        }
    }

    segments
}

#[async_trait]
impl Transcriber for NatsTranscriber {
    async fn transcribe(&self, session_id: &str, audio: &PcmAudio) -> Result<String> {
        // Subscribe before publishing so no segment is missed
        let subscriber = self.client.subscribe_transcripts().await?;

        let mut sequence = 0u32;
        for frame in audio.frames(FRAME_MS) {
            self.client
                .publish_audio_frame(
                    session_id,
                    &pcm_bytes(frame),
                    audio.sample_rate,
                    audio.channels,
                    sequence,
                    false,
                )
                .await?;
            sequence += 1;
        }

        self.client
            .publish_audio_frame(session_id, &[], audio.sample_rate, audio.channels, sequence, true)
            .await?;
        self.client.flush().await?;

        info!(
            "Published {} audio frames for {}, waiting for transcript",
            sequence, session_id
        );

        let segments = collect_segments(
            subscriber.map(|msg| msg.payload),
            session_id,
            self.idle_timeout,
            self.max_wait,
        )
        .await;

        info!("Received {} transcript segments for {}", segments.len(), session_id);

        Ok(segments.join(" "))
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn name(&self) -> &str {
        "nats"
    }
}
