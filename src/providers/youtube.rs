use anyhow::Context;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use super::{ProviderError, RawSegment, TranscriptProvider};
use crate::config::ProviderConfig;

/// Source name reported to consumers of the JSON output
pub const SOURCE_NAME: &str = "youtube-transcript-api";

const WATCH_URL: &str = "https://www.youtube.com/watch";
const INNERTUBE_PLAYER_URL: &str = "https://www.youtube.com/youtubei/v1/player";
const INNERTUBE_API_KEY_MARKER: &str = "\"INNERTUBE_API_KEY\":\"";
const INNERTUBE_CLIENT_NAME: &str = "ANDROID";
const INNERTUBE_CLIENT_VERSION: &str = "20.10.38";

/// Caption provider backed by YouTube's innertube player API
pub struct YoutubeProvider {
    client: Client,
}

/// A caption track listed in the player response
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionTrack {
    pub base_url: String,
    pub language_code: String,
    pub name: String,
    pub is_generated: bool,
    pub is_translatable: bool,
}

/// All caption tracks of a video plus the one YouTube marks as default
#[derive(Debug, Clone)]
pub struct CaptionTrackList {
    pub tracks: Vec<CaptionTrack>,
    pub default_index: Option<usize>,
}

impl CaptionTrackList {
    /// The video's default track, or the first listed one
    pub fn default_track(&self) -> Option<&CaptionTrack> {
        self.default_index
            .and_then(|index| self.tracks.get(index))
            .or_else(|| self.tracks.first())
    }

    /// First track matching `languages` in order, manual tracks before generated ones
    pub fn find_track(
        &self,
        video_id: &str,
        languages: &[String],
    ) -> Result<&CaptionTrack, ProviderError> {
        for code in languages {
            let manual = self
                .tracks
                .iter()
                .find(|track| !track.is_generated && &track.language_code == code);
            let generated = self
                .tracks
                .iter()
                .find(|track| track.is_generated && &track.language_code == code);

            if let Some(track) = manual.or(generated) {
                return Ok(track);
            }
        }

        Err(ProviderError::NoTranscriptFound {
            video_id: video_id.to_string(),
            requested: languages.to_vec(),
            available: self.available_languages(),
        })
    }

    pub fn available_languages(&self) -> Vec<String> {
        self.tracks
            .iter()
            .map(|track| track.language_code.clone())
            .collect()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlayerResponse {
    playability_status: Option<PlayabilityStatus>,
    captions: Option<Captions>,
}

#[derive(Debug, Deserialize)]
struct PlayabilityStatus {
    status: String,
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Captions {
    #[serde(rename = "playerCaptionsTracklistRenderer")]
    tracklist: Option<CaptionTracklistRenderer>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CaptionTracklistRenderer {
    #[serde(default)]
    caption_tracks: Vec<RawCaptionTrack>,
    #[serde(default)]
    audio_tracks: Vec<AudioTrack>,
    default_audio_track_index: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AudioTrack {
    default_caption_track_index: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCaptionTrack {
    base_url: String,
    language_code: String,
    name: Option<TrackName>,
    kind: Option<String>,
    #[serde(default)]
    is_translatable: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrackName {
    simple_text: Option<String>,
    #[serde(default)]
    runs: Vec<TextRun>,
}

#[derive(Debug, Deserialize)]
struct TextRun {
    text: String,
}

impl TrackName {
    fn into_text(self) -> String {
        match self.simple_text {
            Some(text) => text,
            None => self.runs.into_iter().map(|run| run.text).collect(),
        }
    }
}

/// `fmt=json3` timed text document
#[derive(Debug, Deserialize)]
struct TimedText {
    #[serde(default)]
    events: Vec<TimedTextEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimedTextEvent {
    #[serde(default)]
    t_start_ms: u64,
    d_duration_ms: Option<u64>,
    segs: Option<Vec<TimedTextSeg>>,
}

#[derive(Debug, Deserialize)]
struct TimedTextSeg {
    #[serde(default)]
    utf8: String,
}

impl YoutubeProvider {
    pub fn new(config: &ProviderConfig) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_str(&config.accept_language)
                .context("Invalid accept_language header value")?,
        );

        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client })
    }

    /// List the caption tracks of a video
    pub async fn list_tracks(&self, video_id: &str) -> Result<CaptionTrackList, ProviderError> {
        let html = self.fetch_watch_page(video_id).await?;
        let api_key = extract_innertube_api_key(&html).ok_or_else(|| {
            if html.contains("class=\"g-recaptcha\"") {
                ProviderError::RequestBlocked(video_id.to_string())
            } else {
                ProviderError::Malformed("innertube API key missing from watch page".to_string())
            }
        })?;

        let body = self.fetch_player_response(video_id, &api_key).await?;
        parse_caption_tracks(&body, video_id)
    }

    async fn fetch_watch_page(&self, video_id: &str) -> Result<String, ProviderError> {
        tracing::debug!("Loading watch page for video: {}", video_id);

        let request = self.client.get(WATCH_URL).query(&[("v", video_id)]);
        let response = self.send(request, video_id).await?;

        Ok(response.text().await?)
    }

    async fn fetch_player_response(
        &self,
        video_id: &str,
        api_key: &str,
    ) -> Result<String, ProviderError> {
        tracing::debug!("Requesting innertube player data for video: {}", video_id);

        let payload = serde_json::json!({
            "context": {
                "client": {
                    "clientName": INNERTUBE_CLIENT_NAME,
                    "clientVersion": INNERTUBE_CLIENT_VERSION,
                }
            },
            "videoId": video_id,
        });

        let request = self
            .client
            .post(INNERTUBE_PLAYER_URL)
            .query(&[("key", api_key)])
            .json(&payload);
        let response = self.send(request, video_id).await?;

        Ok(response.text().await?)
    }

    /// Download one caption track and turn it into raw segments
    async fn fetch_track(
        &self,
        video_id: &str,
        track: &CaptionTrack,
    ) -> Result<Vec<RawSegment>, ProviderError> {
        if track.base_url.contains("&exp=xpe") {
            return Err(ProviderError::PoTokenRequired(video_id.to_string()));
        }

        tracing::debug!(
            "Downloading caption track '{}' ({}{}{})",
            track.name,
            track.language_code,
            if track.is_generated { ", auto-generated" } else { "" },
            if track.is_translatable { ", translatable" } else { "" }
        );

        let url = timed_text_url(&track.base_url)?;
        let response = self.send(self.client.get(url), video_id).await?;
        let body = response.text().await?;

        parse_timed_text(&body)
    }

    async fn send(&self, request: RequestBuilder, video_id: &str) -> Result<Response, ProviderError> {
        let response = request.send().await?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RequestBlocked(video_id.to_string()));
        }

        Ok(response.error_for_status()?)
    }
}

#[async_trait]
impl TranscriptProvider for YoutubeProvider {
    fn source(&self) -> &'static str {
        SOURCE_NAME
    }

    async fn fetch_original(&self, video_id: &str) -> Result<Vec<RawSegment>, ProviderError> {
        let tracks = self.list_tracks(video_id).await?;
        let track = tracks
            .default_track()
            .ok_or_else(|| ProviderError::TranscriptsDisabled(video_id.to_string()))?;

        self.fetch_track(video_id, track).await
    }

    async fn fetch_in_languages(
        &self,
        video_id: &str,
        languages: &[String],
    ) -> Result<Vec<RawSegment>, ProviderError> {
        let tracks = self.list_tracks(video_id).await?;
        if tracks.tracks.is_empty() {
            return Err(ProviderError::TranscriptsDisabled(video_id.to_string()));
        }

        let track = tracks.find_track(video_id, languages)?;
        self.fetch_track(video_id, track).await
    }
}

/// Pull the innertube API key out of a watch page
pub fn extract_innertube_api_key(html: &str) -> Option<String> {
    let start = html.find(INNERTUBE_API_KEY_MARKER)? + INNERTUBE_API_KEY_MARKER.len();
    let len = html[start..].find('"')?;
    let key = &html[start..start + len];

    if key.is_empty() {
        None
    } else {
        Some(key.to_string())
    }
}

/// Parse an innertube player response into the video's caption tracks
pub fn parse_caption_tracks(body: &str, video_id: &str) -> Result<CaptionTrackList, ProviderError> {
    let player: PlayerResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::Malformed(format!("invalid player response: {}", e)))?;

    if let Some(status) = &player.playability_status {
        check_playability(status, video_id)?;
    }

    let tracklist = player
        .captions
        .and_then(|captions| captions.tracklist)
        .ok_or_else(|| ProviderError::TranscriptsDisabled(video_id.to_string()))?;

    let default_index = tracklist
        .audio_tracks
        .get(tracklist.default_audio_track_index.unwrap_or(0))
        .and_then(|audio| audio.default_caption_track_index);

    let tracks = tracklist
        .caption_tracks
        .into_iter()
        .map(|raw| CaptionTrack {
            name: raw
                .name
                .map(TrackName::into_text)
                .unwrap_or_else(|| raw.language_code.clone()),
            is_generated: raw.kind.as_deref() == Some("asr"),
            is_translatable: raw.is_translatable,
            base_url: raw.base_url,
            language_code: raw.language_code,
        })
        .collect();

    Ok(CaptionTrackList {
        tracks,
        default_index,
    })
}

fn check_playability(status: &PlayabilityStatus, video_id: &str) -> Result<(), ProviderError> {
    let reason = status.reason.as_deref().unwrap_or("");

    match status.status.as_str() {
        "OK" => Ok(()),
        "LOGIN_REQUIRED" if reason.contains("not a bot") => {
            Err(ProviderError::RequestBlocked(video_id.to_string()))
        }
        "ERROR" if reason.contains("unavailable") => {
            Err(ProviderError::VideoUnavailable(video_id.to_string()))
        }
        _ => Err(ProviderError::VideoUnplayable {
            video_id: video_id.to_string(),
            reason: if reason.is_empty() {
                format!("playability status {}", status.status)
            } else {
                reason.to_string()
            },
        }),
    }
}

/// Rewrite a track URL so YouTube answers with `fmt=json3`
pub fn timed_text_url(base_url: &str) -> Result<Url, ProviderError> {
    let mut url = Url::parse(base_url)
        .map_err(|e| ProviderError::Malformed(format!("invalid caption track URL: {}", e)))?;

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != "fmt")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    url.query_pairs_mut()
        .clear()
        .extend_pairs(pairs)
        .append_pair("fmt", "json3");

    Ok(url)
}

/// Parse a `fmt=json3` timed text document into raw segments
pub fn parse_timed_text(body: &str) -> Result<Vec<RawSegment>, ProviderError> {
    let timed_text: TimedText = serde_json::from_str(body)
        .map_err(|e| ProviderError::Malformed(format!("invalid timed text: {}", e)))?;

    let segments = timed_text
        .events
        .into_iter()
        .filter_map(|event| {
            let text: String = event.segs?.into_iter().map(|seg| seg.utf8).collect();
            if text.trim().is_empty() {
                return None;
            }

            Some(RawSegment::new(
                event.t_start_ms as f64 / 1000.0,
                event.d_duration_ms.unwrap_or(0) as f64 / 1000.0,
                text,
            ))
        })
        .collect();

    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAYER_RESPONSE: &str = r#"{
        "playabilityStatus": {"status": "OK"},
        "captions": {
            "playerCaptionsTracklistRenderer": {
                "captionTracks": [
                    {
                        "baseUrl": "https://www.youtube.com/api/timedtext?v=abc&lang=de&kind=asr",
                        "name": {"runs": [{"text": "German (auto-generated)"}]},
                        "languageCode": "de",
                        "kind": "asr",
                        "isTranslatable": true
                    },
                    {
                        "baseUrl": "https://www.youtube.com/api/timedtext?v=abc&lang=es",
                        "name": {"simpleText": "Spanish"},
                        "languageCode": "es",
                        "isTranslatable": true
                    },
                    {
                        "baseUrl": "https://www.youtube.com/api/timedtext?v=abc&lang=fr&kind=asr",
                        "name": {"simpleText": "French (auto-generated)"},
                        "languageCode": "fr",
                        "kind": "asr"
                    },
                    {
                        "baseUrl": "https://www.youtube.com/api/timedtext?v=abc&lang=fr",
                        "name": {"simpleText": "French"},
                        "languageCode": "fr"
                    }
                ],
                "audioTracks": [{"captionTrackIndices": [0, 1, 2, 3], "defaultCaptionTrackIndex": 1}],
                "defaultAudioTrackIndex": 0
            }
        }
    }"#;

    fn langs(codes: &[&str]) -> Vec<String> {
        codes.iter().map(|code| code.to_string()).collect()
    }

    #[test]
    fn test_extract_innertube_api_key() {
        let html = r#"<script>ytcfg.set({"INNERTUBE_API_KEY":"AIzaSyExample","INNERTUBE_CLIENT_NAME":"WEB"});</script>"#;
        assert_eq!(extract_innertube_api_key(html), Some("AIzaSyExample".to_string()));
        assert_eq!(extract_innertube_api_key("<html></html>"), None);
        assert_eq!(extract_innertube_api_key(r#""INNERTUBE_API_KEY":"""#), None);
    }

    #[test]
    fn test_parse_caption_tracks() {
        let list = parse_caption_tracks(PLAYER_RESPONSE, "abc").unwrap();

        assert_eq!(list.tracks.len(), 4);
        assert_eq!(list.tracks[0].name, "German (auto-generated)");
        assert!(list.tracks[0].is_generated);
        assert!(list.tracks[0].is_translatable);
        assert!(!list.tracks[1].is_generated);
        assert_eq!(list.available_languages(), langs(&["de", "es", "fr", "fr"]));
    }

    #[test]
    fn test_default_track_uses_audio_track_default() {
        let list = parse_caption_tracks(PLAYER_RESPONSE, "abc").unwrap();
        assert_eq!(list.default_track().unwrap().language_code, "es");

        let list = CaptionTrackList {
            tracks: list.tracks.clone(),
            default_index: None,
        };
        assert_eq!(list.default_track().unwrap().language_code, "de");
    }

    #[test]
    fn test_find_track_honors_order_and_prefers_manual() {
        let list = parse_caption_tracks(PLAYER_RESPONSE, "abc").unwrap();

        let track = list.find_track("abc", &langs(&["en", "fr", "es"])).unwrap();
        assert_eq!(track.language_code, "fr");
        assert!(!track.is_generated);

        let track = list.find_track("abc", &langs(&["it", "de"])).unwrap();
        assert_eq!(track.language_code, "de");
        assert!(track.is_generated);
    }

    #[test]
    fn test_find_track_reports_requested_and_available() {
        let list = parse_caption_tracks(PLAYER_RESPONSE, "abc").unwrap();

        let err = list.find_track("abc", &langs(&["en", "pt"])).unwrap_err();
        match &err {
            ProviderError::NoTranscriptFound {
                requested,
                available,
                ..
            } => {
                assert_eq!(requested, &langs(&["en", "pt"]));
                assert_eq!(available, &langs(&["de", "es", "fr", "fr"]));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(err.to_string().contains("[en, pt]"));
    }

    #[test]
    fn test_missing_captions_means_disabled() {
        let body = r#"{"playabilityStatus": {"status": "OK"}}"#;
        let err = parse_caption_tracks(body, "abc").unwrap_err();
        assert!(matches!(err, ProviderError::TranscriptsDisabled(id) if id == "abc"));
    }

    #[test]
    fn test_playability_errors() {
        let body = r#"{"playabilityStatus": {"status": "ERROR", "reason": "This video is unavailable"}}"#;
        assert!(matches!(
            parse_caption_tracks(body, "abc"),
            Err(ProviderError::VideoUnavailable(_))
        ));

        let body = r#"{"playabilityStatus": {"status": "LOGIN_REQUIRED", "reason": "Sign in to confirm you're not a bot"}}"#;
        assert!(matches!(
            parse_caption_tracks(body, "abc"),
            Err(ProviderError::RequestBlocked(_))
        ));

        let body = r#"{"playabilityStatus": {"status": "UNPLAYABLE", "reason": "Private video"}}"#;
        match parse_caption_tracks(body, "abc") {
            Err(ProviderError::VideoUnplayable { reason, .. }) => assert_eq!(reason, "Private video"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_malformed_player_response() {
        assert!(matches!(
            parse_caption_tracks("<html>", "abc"),
            Err(ProviderError::Malformed(_))
        ));
    }

    #[test]
    fn test_timed_text_url_forces_json3() {
        let url = timed_text_url("https://www.youtube.com/api/timedtext?v=abc&lang=en&fmt=srv3").unwrap();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        assert_eq!(
            pairs,
            vec![
                ("v".to_string(), "abc".to_string()),
                ("lang".to_string(), "en".to_string()),
                ("fmt".to_string(), "json3".to_string()),
            ]
        );
        assert!(timed_text_url("/api/timedtext?v=abc").is_err());
    }

    #[test]
    fn test_parse_timed_text() {
        let body = r#"{
            "wireMagic": "pb3",
            "events": [
                {"tStartMs": 0, "dDurationMs": 1500, "id": 1},
                {"tStartMs": 1200, "dDurationMs": 2300, "segs": [{"utf8": "Never gonna "}, {"utf8": "give you up"}]},
                {"tStartMs": 3500, "dDurationMs": 10, "segs": [{"utf8": "\n"}]},
                {"tStartMs": 3600, "segs": [{"utf8": "¿Qué tal?"}]}
            ]
        }"#;

        let segments = parse_timed_text(body).unwrap();
        assert_eq!(
            segments,
            vec![
                RawSegment::new(1.2, 2.3, "Never gonna give you up"),
                RawSegment::new(3.6, 0.0, "¿Qué tal?"),
            ]
        );
    }

    #[test]
    fn test_parse_timed_text_without_events() {
        assert!(parse_timed_text("{}").unwrap().is_empty());
        assert!(parse_timed_text("not json").is_err());
    }
}
