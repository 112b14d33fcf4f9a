use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod youtube;

/// One caption unit exactly as the provider returned it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSegment {
    /// Offset from the start of the video, in seconds
    pub start: f64,

    /// How long the caption stays on screen, in seconds
    pub duration: f64,

    /// Caption text
    pub text: String,
}

impl RawSegment {
    pub fn new(start: f64, duration: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            duration,
            text: text.into(),
        }
    }
}

/// Failures raised while talking to a transcript provider
#[derive(thiserror::Error, Debug)]
pub enum ProviderError {
    #[error("Request to YouTube failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("YouTube is blocking requests from this IP for video {0}")]
    RequestBlocked(String),

    #[error("The video is no longer available: {0}")]
    VideoUnavailable(String),

    #[error("The video {video_id} is unplayable: {reason}")]
    VideoUnplayable { video_id: String, reason: String },

    #[error("Subtitles are disabled for video {0}")]
    TranscriptsDisabled(String),

    #[error(
        "No transcripts were found for video {video_id} in any of the requested languages [{}]. Available: [{}]",
        .requested.join(", "),
        .available.join(", ")
    )]
    NoTranscriptFound {
        video_id: String,
        requested: Vec<String>,
        available: Vec<String>,
    },

    #[error("The caption track for video {0} requires a PO token")]
    PoTokenRequired(String),

    #[error("Unexpected response from YouTube: {0}")]
    Malformed(String),
}

/// Source of raw transcript segments for a video
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranscriptProvider: Send + Sync {
    /// Identifier reported in every fetch result
    fn source(&self) -> &'static str;

    /// Fetch the video's default caption track
    async fn fetch_original(&self, video_id: &str) -> Result<Vec<RawSegment>, ProviderError>;

    /// Fetch the first caption track available among `languages`, in order
    async fn fetch_in_languages(
        &self,
        video_id: &str,
        languages: &[String],
    ) -> Result<Vec<RawSegment>, ProviderError>;
}
