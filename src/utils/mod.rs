use url::Url;

/// Hosts whose URLs carry a YouTube video id
const YOUTUBE_HOSTS: &[&str] = &[
    "youtube.com",
    "www.youtube.com",
    "m.youtube.com",
    "music.youtube.com",
    "youtube-nocookie.com",
    "www.youtube-nocookie.com",
];

/// Turn a YouTube URL into its video id; anything else is returned trimmed but unchanged
pub fn normalize_video_id(input: &str) -> String {
    let input = input.trim();

    Url::parse(input)
        .ok()
        .and_then(|url| video_id_from_url(&url))
        .unwrap_or_else(|| input.to_string())
}

fn video_id_from_url(url: &Url) -> Option<String> {
    let host = url.host_str()?.to_lowercase();

    if host == "youtu.be" {
        return url
            .path_segments()?
            .next()
            .filter(|id| !id.is_empty())
            .map(str::to_string);
    }

    if !YOUTUBE_HOSTS.contains(&host.as_str()) {
        return None;
    }

    if url.path() == "/watch" {
        return url
            .query_pairs()
            .find(|(key, _)| key == "v")
            .map(|(_, value)| value.into_owned())
            .filter(|id| !id.is_empty());
    }

    let mut segments = url.path_segments()?;
    match segments.next()? {
        "embed" | "v" | "shorts" | "live" => segments
            .next()
            .filter(|id| !id.is_empty())
            .map(str::to_string),
        _ => None,
    }
}

/// Format duration in human-readable format
pub fn format_duration(seconds: f64) -> String {
    let total_seconds = seconds.max(0.0) as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_ids_pass_through() {
        assert_eq!(normalize_video_id("dQw4w9WgXcQ"), "dQw4w9WgXcQ");
        assert_eq!(normalize_video_id("  dQw4w9WgXcQ\n"), "dQw4w9WgXcQ");
        assert_eq!(normalize_video_id("not a valid id"), "not a valid id");
    }

    #[test]
    fn test_youtube_urls() {
        let urls = [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtube.com/watch?feature=share&v=dQw4w9WgXcQ",
            "https://m.youtube.com/watch?v=dQw4w9WgXcQ&t=42s",
            "https://music.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ?si=abc",
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
            "https://www.youtube.com/shorts/dQw4w9WgXcQ",
            "https://www.youtube.com/live/dQw4w9WgXcQ",
            "https://www.youtube-nocookie.com/embed/dQw4w9WgXcQ",
        ];

        for url in urls {
            assert_eq!(normalize_video_id(url), "dQw4w9WgXcQ", "{}", url);
        }
    }

    #[test]
    fn test_unrecognized_urls_pass_through() {
        assert_eq!(
            normalize_video_id("https://example.com/watch?v=dQw4w9WgXcQ"),
            "https://example.com/watch?v=dQw4w9WgXcQ"
        );
        assert_eq!(
            normalize_video_id("https://www.youtube.com/watch"),
            "https://www.youtube.com/watch"
        );
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(30.0), "30s");
        assert_eq!(format_duration(90.5), "1m 30s");
        assert_eq!(format_duration(3661.0), "1h 1m 1s");
        assert_eq!(format_duration(-1.0), "0s");
    }
}
