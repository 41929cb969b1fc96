//! Canonical embeddable form for submitted video links.
use reqwest::Url;
use tracing::debug;

const EMBED_BASE: &str = "https://www.youtube.com/embed/";

/// Convert a video URL into its embeddable form.
///
/// Recognizes the `youtu.be/<id>` short host and the `youtube.com` host with
/// either a `v` query parameter or an `/embed/<id>` path. Anything else,
/// including unparsable input, yields `None`.
pub fn canonicalize(url: Option<&str>) -> Option<String> {
    let raw = url?.trim();
    if raw.is_empty() {
        return None;
    }
    let parsed = match Url::parse(raw) {
        Ok(parsed) => parsed,
        Err(err) => {
            debug!(?err, url = raw, "link is not a valid url");
            return None;
        }
    };

    let video_id = match parsed.host_str()? {
        "youtu.be" => Some(parsed.path().trim_start_matches('/').to_string()),
        "www.youtube.com" | "youtube.com" => parsed
            .query_pairs()
            .find(|(key, _)| key == "v")
            .map(|(_, value)| value.into_owned())
            .filter(|v| !v.is_empty())
            .or_else(|| {
                parsed
                    .path()
                    .strip_prefix("/embed/")
                    .map(str::to_string)
            }),
        _ => None,
    };

    video_id
        .filter(|id| !id.is_empty())
        .map(|id| format!("{EMBED_BASE}{id}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_and_full_hosts_agree() {
        let expected = Some("https://www.youtube.com/embed/abc123".to_string());
        assert_eq!(canonicalize(Some("https://youtu.be/abc123")), expected);
        assert_eq!(
            canonicalize(Some("https://www.youtube.com/watch?v=abc123")),
            expected
        );
        assert_eq!(
            canonicalize(Some("https://youtube.com/watch?feature=share&v=abc123")),
            expected
        );
        assert_eq!(
            canonicalize(Some("https://www.youtube.com/embed/abc123")),
            expected
        );
    }

    #[test]
    fn unrelated_or_malformed_yield_none() {
        assert_eq!(canonicalize(Some("https://vimeo.com/12345")), None);
        assert_eq!(canonicalize(Some("not a url")), None);
        assert_eq!(canonicalize(Some("")), None);
        assert_eq!(canonicalize(None), None);
    }

    #[test]
    fn missing_identifier_yields_none() {
        assert_eq!(canonicalize(Some("https://youtu.be/")), None);
        assert_eq!(canonicalize(Some("https://www.youtube.com/watch")), None);
        assert_eq!(canonicalize(Some("https://www.youtube.com/embed/")), None);
    }
}
