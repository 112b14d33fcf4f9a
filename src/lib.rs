//! Subtitle Fetcher - fetch YouTube subtitles and emit them as JSON
//!
//! This library retrieves a video's caption track from YouTube, falling back to a preferred
//! language list when the original track is unavailable, and reshapes the segments into the
//! JSON payload consumed by the frontend.

pub mod cli;
pub mod config;
pub mod fetcher;
pub mod output;
pub mod providers;
pub mod utils;

pub use cli::{Cli, Invocation};
pub use config::{Config, ProviderConfig};
pub use fetcher::{FetchResult, Language, TranscriptFetcher, TranscriptSegment};
pub use providers::{ProviderError, RawSegment, TranscriptProvider};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;
