//! M3U8 playlist rewriting.
//!
//! Three text transforms over provider playlists:
//!
//! * `rewrite_master` points every media-playlist reference in a master
//!   playlist back at the gateway, carrying the stream name and clip window.
//! * `rewrite_media` makes relative fragment paths in a media playlist
//!   absolute so players resolve them against the provider, not the gateway.
//! * `adapt_live_replay` turns a prematurely-final playlist back into a live
//!   one while the clip window is still being uploaded.
//!
//! All three operate line by line, tolerate CRLF input, and emit LF output
//! with a trailing newline.

use chrono::{DateTime, Utc};

use vantage_core::AppError;

/// Parameters threaded through a master-playlist rewrite.
pub struct MasterRewrite<'a> {
    /// Absolute gateway media-playlist endpoint, e.g.
    /// `https://gateway.example.com/media-playlist`.
    pub media_endpoint: &'a str,
    /// Filename prefix identifying media-playlist references, e.g.
    /// `getHLSMediaPlaylist.m3u8`.
    pub media_path_prefix: &'a str,
    /// Gateway session token; supersedes any provider-issued token in the
    /// original reference.
    pub session_token: &'a str,
    pub stream_name: &'a str,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// Rewrite every media-playlist reference in a master playlist to the
/// gateway's media endpoint, preserving the reference's original query
/// parameters and appending `SessionToken`, `StreamName`, `StartTime`, and
/// `EndTime`.
///
/// References appear two ways: as bare URI lines and inside the `URI`
/// attribute of `#EXT-X-MEDIA` tags. Lines that reference anything else pass
/// through untouched.
pub fn rewrite_master(playlist: &str, ctx: &MasterRewrite<'_>) -> Result<String, AppError> {
    let mut out = Vec::new();
    for raw in playlist.lines() {
        let line = raw.trim_end_matches('\r');
        if let Some(rest) = line.strip_prefix("#EXT-X-MEDIA") {
            out.push(rewrite_media_tag_uri(line, rest, ctx)?);
        } else if !line.starts_with('#') && is_media_reference(line, ctx.media_path_prefix) {
            out.push(rewrite_reference(line, ctx)?);
        } else {
            out.push(line.to_string());
        }
    }
    Ok(join_lines(out))
}

/// Make every relative URI in a media playlist absolute against
/// `fragment_base`. Covers bare fragment lines and the `URI` attribute of
/// `#EXT-X-MAP` init-segment tags; absolute URIs pass through unchanged.
pub fn rewrite_media(playlist: &str, fragment_base: &str) -> String {
    let base = fragment_base.trim_end_matches('/');
    let mut out = Vec::new();
    for raw in playlist.lines() {
        let line = raw.trim_end_matches('\r');
        if let Some(rest) = line.strip_prefix("#EXT-X-MAP") {
            match uri_attribute(rest) {
                Some((value, value_start, value_end)) if !is_absolute(value) => {
                    let offset = line.len() - rest.len();
                    let mut rebuilt = String::new();
                    rebuilt.push_str(&line[..offset + value_start]);
                    rebuilt.push_str(&absolutize(value, base));
                    rebuilt.push_str(&line[offset + value_end..]);
                    out.push(rebuilt);
                }
                _ => out.push(line.to_string()),
            }
        } else if line.starts_with('#') || line.is_empty() || is_absolute(line) {
            out.push(line.to_string());
        } else {
            out.push(absolutize(line, base));
        }
    }
    join_lines(out)
}

/// Keep a replayed clip playable while its tail is still uploading.
///
/// The provider finalizes a playlist (`#EXT-X-ENDLIST`, `VOD` type) as soon
/// as the fragments it has cover the requested range, even when the edge
/// device is still pushing the rest of the window. When the last fragment's
/// program-date-time plus its duration falls short of `window_end`, the
/// finalizing tags are stripped so players keep polling. When the timing
/// tags cannot be read the playlist is treated as incomplete.
pub fn adapt_live_replay(playlist: &str, window_end: DateTime<Utc>) -> String {
    if covers_window_end(playlist, window_end) {
        return playlist.to_string();
    }

    let mut out = Vec::new();
    for raw in playlist.lines() {
        let line = raw.trim_end_matches('\r');
        if line == "#EXT-X-ENDLIST" || line.starts_with("#EXT-X-PLAYLIST-TYPE:VOD") {
            continue;
        }
        out.push(line.to_string());
    }
    join_lines(out)
}

/// Whether the last fragment in the playlist reaches `window_end`. Scans
/// from the tail so only the final fragment's tags are consulted.
fn covers_window_end(playlist: &str, window_end: DateTime<Utc>) -> bool {
    let mut last_pdt: Option<DateTime<Utc>> = None;
    let mut last_duration: Option<f64> = None;

    for raw in playlist.lines().rev() {
        let line = raw.trim_end_matches('\r');
        if last_pdt.is_none() {
            if let Some(value) = line.strip_prefix("#EXT-X-PROGRAM-DATE-TIME:") {
                last_pdt = DateTime::parse_from_rfc3339(value.trim())
                    .ok()
                    .map(|dt| dt.with_timezone(&Utc));
                if last_pdt.is_none() {
                    return false;
                }
            }
        }
        if last_duration.is_none() {
            if let Some(value) = line.strip_prefix("#EXTINF:") {
                last_duration = value.split(',').next().and_then(|d| d.trim().parse().ok());
                if last_duration.is_none() {
                    return false;
                }
            }
        }
        if last_pdt.is_some() && last_duration.is_some() {
            break;
        }
    }

    match (last_pdt, last_duration) {
        (Some(pdt), Some(duration)) => {
            let fragment_end = pdt + chrono::Duration::milliseconds((duration * 1000.0) as i64);
            fragment_end >= window_end
        }
        _ => false,
    }
}

fn rewrite_media_tag_uri(
    line: &str,
    rest: &str,
    ctx: &MasterRewrite<'_>,
) -> Result<String, AppError> {
    match uri_attribute(rest) {
        Some((value, value_start, value_end))
            if is_media_reference(value, ctx.media_path_prefix) =>
        {
            let offset = line.len() - rest.len();
            let mut rebuilt = String::new();
            rebuilt.push_str(&line[..offset + value_start]);
            rebuilt.push_str(&rewrite_reference(value, ctx)?);
            rebuilt.push_str(&line[offset + value_end..]);
            Ok(rebuilt)
        }
        _ => Ok(line.to_string()),
    }
}

/// Locate the first `URI="..."` attribute value in a tag's attribute list.
/// Returns the value and its byte range within `attributes`. A `URI=` that
/// is not preceded by `:` or `,` (i.e. embedded in another attribute's
/// value) is ignored.
fn uri_attribute(attributes: &str) -> Option<(&str, usize, usize)> {
    let mut search_from = 0;
    while let Some(found) = attributes[search_from..].find("URI=\"") {
        let attr_start = search_from + found;
        let preceded_ok = attr_start == 0
            || matches!(attributes.as_bytes()[attr_start - 1], b':' | b',');
        let value_start = attr_start + "URI=\"".len();
        if preceded_ok {
            let value_len = attributes[value_start..].find('"')?;
            let value_end = value_start + value_len;
            return Some((&attributes[value_start..value_end], value_start, value_end));
        }
        search_from = value_start;
    }
    None
}

/// A reference counts as a media-playlist reference when its filename starts
/// with the configured prefix, whether the reference is relative or a full
/// URL.
fn is_media_reference(reference: &str, prefix: &str) -> bool {
    if reference.starts_with(prefix) {
        return true;
    }
    if let Ok(parsed) = url::Url::parse(reference) {
        if let Some(segments) = parsed.path_segments() {
            if let Some(last) = segments.last() {
                return last.starts_with(prefix);
            }
        }
    }
    false
}

fn rewrite_reference(reference: &str, ctx: &MasterRewrite<'_>) -> Result<String, AppError> {
    let mut rewritten = url::Url::parse(ctx.media_endpoint).map_err(|e| {
        AppError::Internal(format!("invalid media endpoint {}: {}", ctx.media_endpoint, e))
    })?;

    {
        let mut pairs = rewritten.query_pairs_mut();
        pairs.clear();
        if let Some(query) = reference.split_once('?').map(|(_, q)| q) {
            for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
                if key == "SessionToken" {
                    continue;
                }
                pairs.append_pair(&key, &value);
            }
        }
        pairs.append_pair("SessionToken", ctx.session_token);
        pairs.append_pair("StreamName", ctx.stream_name);
        pairs.append_pair("StartTime", &ctx.start_time.to_rfc3339());
        pairs.append_pair("EndTime", &ctx.end_time.to_rfc3339());
    }

    Ok(rewritten.to_string())
}

fn is_absolute(reference: &str) -> bool {
    reference.contains("://")
}

fn absolutize(reference: &str, base: &str) -> String {
    format!("{}/{}", base, reference.trim_start_matches('/'))
}

fn join_lines(lines: Vec<String>) -> String {
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ctx<'a>() -> MasterRewrite<'a> {
        MasterRewrite {
            media_endpoint: "https://gateway.example.com/media-playlist",
            media_path_prefix: "getHLSMediaPlaylist.m3u8",
            session_token: "sess-1",
            stream_name: "cam1_window_shared",
            start_time: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            end_time: Utc.with_ymd_and_hms(2024, 1, 1, 0, 5, 0).unwrap(),
        }
    }

    #[test]
    fn test_master_rewrite_points_references_at_gateway() {
        let master = "#EXTM3U\n\
            #EXT-X-STREAM-INF:BANDWIDTH=1000000,RESOLUTION=1280x720\n\
            getHLSMediaPlaylist.m3u8?SessionToken=provider-tok&TrackNumber=1\n";

        let rewritten = rewrite_master(master, &ctx()).unwrap();
        let reference = rewritten.lines().nth(2).unwrap();

        let parsed = url::Url::parse(reference).unwrap();
        assert_eq!(parsed.host_str(), Some("gateway.example.com"));
        assert_eq!(parsed.path(), "/media-playlist");

        let pairs: Vec<(String, String)> = parsed
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        // Gateway token supersedes the provider's.
        assert!(pairs.contains(&("SessionToken".into(), "sess-1".into())));
        assert!(!pairs.iter().any(|(_, v)| v == "provider-tok"));
        assert!(pairs.contains(&("TrackNumber".into(), "1".into())));
        assert!(pairs.contains(&("StreamName".into(), "cam1_window_shared".into())));
        assert!(pairs.contains(&("StartTime".into(), "2024-01-01T00:00:00+00:00".into())));
        assert!(pairs.contains(&("EndTime".into(), "2024-01-01T00:05:00+00:00".into())));
    }

    #[test]
    fn test_master_rewrite_handles_absolute_references() {
        let master = "#EXTM3U\n\
            https://provider.example.com/hls/getHLSMediaPlaylist.m3u8?TrackNumber=2\n";

        let rewritten = rewrite_master(master, &ctx()).unwrap();
        let reference = rewritten.lines().nth(1).unwrap();
        assert!(reference.starts_with("https://gateway.example.com/media-playlist?"));
        assert!(reference.contains("TrackNumber=2"));
    }

    #[test]
    fn test_master_rewrite_leaves_other_lines_untouched() {
        let master = "#EXTM3U\n\
            #EXT-X-VERSION:3\n\
            #EXT-X-STREAM-INF:BANDWIDTH=500000\n\
            otherPlaylist.m3u8\n";

        let rewritten = rewrite_master(master, &ctx()).unwrap();
        assert_eq!(rewritten, master);
    }

    #[test]
    fn test_master_rewrite_media_tag_uri_attribute() {
        let master = "#EXTM3U\n\
            #EXT-X-MEDIA:TYPE=AUDIO,GROUP-ID=\"audio\",NAME=\"English\",URI=\"getHLSMediaPlaylist.m3u8?TrackNumber=3\"\n";

        let rewritten = rewrite_master(master, &ctx()).unwrap();
        let line = rewritten.lines().nth(1).unwrap();
        assert!(line.starts_with("#EXT-X-MEDIA:TYPE=AUDIO,GROUP-ID=\"audio\",NAME=\"English\",URI=\""));
        assert!(line.contains("https://gateway.example.com/media-playlist?"));
        assert!(line.contains("TrackNumber=3"));
        assert!(line.ends_with('"'));
    }

    #[test]
    fn test_uri_attribute_skips_embedded_lookalikes() {
        // NAME contains a URI=" lookalike; the real attribute follows.
        let attrs = ":TYPE=SUBTITLES,NAME=\"has URI=\",URI=\"real.m3u8\"";
        // The lookalike inside NAME is preceded by a space, so the scan
        // moves on and lands on the real attribute.
        let (value, _, _) = uri_attribute(attrs).unwrap();
        assert_eq!(value, "real.m3u8");
    }

    #[test]
    fn test_media_rewrite_absolutizes_fragments_and_init() {
        let media = "#EXTM3U\n\
            #EXT-X-MAP:URI=\"init.mp4\"\n\
            #EXTINF:2.0,\n\
            fragment1.ts\n\
            #EXTINF:2.0,\n\
            https://elsewhere.example.com/fragment2.ts\n";

        let rewritten = rewrite_media(media, "https://provider.example.com/streams/cam1");

        assert!(rewritten
            .contains("#EXT-X-MAP:URI=\"https://provider.example.com/streams/cam1/init.mp4\""));
        assert!(rewritten.contains("\nhttps://provider.example.com/streams/cam1/fragment1.ts\n"));
        assert!(rewritten.contains("\nhttps://elsewhere.example.com/fragment2.ts\n"));
    }

    #[test]
    fn test_live_replay_strips_final_tags_when_window_not_covered() {
        let media = "#EXTM3U\n\
            #EXT-X-PLAYLIST-TYPE:VOD\n\
            #EXT-X-PROGRAM-DATE-TIME:2024-01-01T00:02:00+00:00\n\
            #EXTINF:2.0,\n\
            fragment1.ts\n\
            #EXT-X-ENDLIST\n";
        let window_end = Utc.with_ymd_and_hms(2024, 1, 1, 0, 5, 0).unwrap();

        let adapted = adapt_live_replay(media, window_end);
        assert!(!adapted.contains("#EXT-X-ENDLIST"));
        assert!(!adapted.contains("#EXT-X-PLAYLIST-TYPE:VOD"));
        assert!(adapted.contains("fragment1.ts"));
    }

    #[test]
    fn test_live_replay_keeps_final_tags_when_window_covered() {
        let media = "#EXTM3U\n\
            #EXT-X-PLAYLIST-TYPE:VOD\n\
            #EXT-X-PROGRAM-DATE-TIME:2024-01-01T00:04:59+00:00\n\
            #EXTINF:2.0,\n\
            fragment1.ts\n\
            #EXT-X-ENDLIST\n";
        let window_end = Utc.with_ymd_and_hms(2024, 1, 1, 0, 5, 0).unwrap();

        let adapted = adapt_live_replay(media, window_end);
        assert_eq!(adapted, media);
    }

    #[test]
    fn test_live_replay_strips_when_timing_tags_missing() {
        let media = "#EXTM3U\n\
            #EXTINF:2.0,\n\
            fragment1.ts\n\
            #EXT-X-ENDLIST\n";
        let window_end = Utc.with_ymd_and_hms(2024, 1, 1, 0, 5, 0).unwrap();

        let adapted = adapt_live_replay(media, window_end);
        assert!(!adapted.contains("#EXT-X-ENDLIST"));
    }

    #[test]
    fn test_live_replay_is_idempotent() {
        let media = "#EXTM3U\n\
            #EXT-X-PROGRAM-DATE-TIME:2024-01-01T00:02:00+00:00\n\
            #EXTINF:2.0,\n\
            fragment1.ts\n\
            #EXT-X-ENDLIST\n";
        let window_end = Utc.with_ymd_and_hms(2024, 1, 1, 0, 5, 0).unwrap();

        let once = adapt_live_replay(media, window_end);
        let twice = adapt_live_replay(&once, window_end);
        assert_eq!(once, twice);
    }
}
