//! NATS transport to the speech-to-text service

pub mod client;
pub mod messages;

pub use client::NatsClient;
pub use messages::{AudioFrameMessage, TranscriptMessage};
