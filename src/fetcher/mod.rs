use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::providers::{ProviderError, RawSegment, TranscriptProvider};
use crate::utils::format_duration;

/// Error reported when the provider answers with zero segments
pub const NO_SUBTITLES_FOUND: &str = "no subtitles found";

/// Individual subtitle segment with timing
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TranscriptSegment {
    /// Start time in seconds
    pub start: f64,

    /// End time in seconds
    pub end: f64,

    /// Segment text
    pub text: String,

    /// Position in the provider's ordering
    pub index: usize,
}

impl TranscriptSegment {
    fn from_raw(index: usize, raw: RawSegment) -> Self {
        Self {
            start: raw.start,
            end: raw.start + raw.duration,
            text: raw.text,
            index,
        }
    }
}

/// Which attempt produced the subtitles
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Original,
    Fallback,
}

/// Outcome of a single fetch, serialized as the JSON payload consumers read
#[derive(Debug, Clone, PartialEq)]
pub enum FetchResult {
    Success {
        subtitles: Vec<TranscriptSegment>,
        language: Language,
        source: &'static str,
    },
    Failure {
        error: String,
        source: &'static str,
    },
}

impl FetchResult {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchResult::Success { .. })
    }

    pub fn source(&self) -> &'static str {
        match self {
            FetchResult::Success { source, .. } | FetchResult::Failure { source, .. } => *source,
        }
    }

    /// Number of subtitles, zero for failures
    pub fn count(&self) -> usize {
        match self {
            FetchResult::Success { subtitles, .. } => subtitles.len(),
            FetchResult::Failure { .. } => 0,
        }
    }
}

impl Serialize for FetchResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FetchResult::Success {
                subtitles,
                language,
                source,
            } => {
                let mut map = serializer.serialize_map(Some(5))?;
                map.serialize_entry("success", &true)?;
                map.serialize_entry("subtitles", subtitles)?;
                map.serialize_entry("language", language)?;
                map.serialize_entry("source", source)?;
                map.serialize_entry("count", &subtitles.len())?;
                map.end()
            }
            FetchResult::Failure { error, source } => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("success", &false)?;
                map.serialize_entry("error", error)?;
                map.serialize_entry("source", source)?;
                map.end()
            }
        }
    }
}

/// Fetches a video's subtitles, falling back to a preferred language list
pub struct TranscriptFetcher<P> {
    provider: P,
    fallback_languages: Vec<String>,
}

impl<P: TranscriptProvider> TranscriptFetcher<P> {
    pub fn new(provider: P, fallback_languages: Vec<String>) -> Self {
        Self {
            provider,
            fallback_languages,
        }
    }

    /// Fetch subtitles for `video_id`; provider failures become `FetchResult::Failure`
    pub async fn fetch(&self, video_id: &str) -> FetchResult {
        tracing::info!("Fetching subtitles for video: {}", video_id);

        match self.fetch_with_fallback(video_id).await {
            Ok((raw, language)) if raw.is_empty() => {
                tracing::warn!("Provider returned no subtitles ({:?} attempt)", language);
                self.failure(NO_SUBTITLES_FOUND.to_string())
            }
            Ok((raw, language)) => {
                let subtitles: Vec<TranscriptSegment> = raw
                    .into_iter()
                    .enumerate()
                    .map(|(index, segment)| TranscriptSegment::from_raw(index, segment))
                    .collect();

                let covered = subtitles.last().map(|last| last.end).unwrap_or(0.0);
                tracing::info!(
                    "Subtitles ready: {} segments covering {}",
                    subtitles.len(),
                    format_duration(covered)
                );

                FetchResult::Success {
                    subtitles,
                    language,
                    source: self.provider.source(),
                }
            }
            Err(err) => {
                tracing::error!("Failed to fetch subtitles: {}", err);
                self.failure(err.to_string())
            }
        }
    }

    async fn fetch_with_fallback(
        &self,
        video_id: &str,
    ) -> Result<(Vec<RawSegment>, Language), ProviderError> {
        match self.provider.fetch_original(video_id).await {
            Ok(raw) => {
                tracing::info!("Found {} segments in the original language", raw.len());
                Ok((raw, Language::Original))
            }
            Err(err) => {
                tracing::info!("Original language unavailable ({})", err);
                tracing::info!(
                    "Trying fallback languages: {}",
                    self.fallback_languages.join(", ")
                );

                let raw = self
                    .provider
                    .fetch_in_languages(video_id, &self.fallback_languages)
                    .await?;
                tracing::info!("Found {} segments with fallback languages", raw.len());
                Ok((raw, Language::Fallback))
            }
        }
    }

    fn failure(&self, error: String) -> FetchResult {
        FetchResult::Failure {
            error,
            source: self.provider.source(),
        }
    }
}
