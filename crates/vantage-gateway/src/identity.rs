//! Deterministic remote stream naming.
//!
//! A remote stream is named `{base}_{start}_{end}_{suffix}` where the
//! timestamps are normalized to UTC and sanitized, and the suffix is the
//! literal `shared` for shared-style purposes (so identical requests
//! deduplicate onto one remote stream) or a fresh random token otherwise.

use chrono::{DateTime, Utc};
use rand::Rng;

use vantage_core::models::RequestPurpose;

/// Suffix for purposes that reuse one remote stream per clip window.
pub const SHARED_SUFFIX: &str = "shared";

const RANDOM_SUFFIX_LEN: usize = 10;
const RANDOM_SUFFIX_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Derive the remote stream name for a request.
///
/// Shared-style purposes always map identical `(base, start, end)` inputs to
/// the same name; all other purposes get a fresh random suffix per call.
/// Distinct windows that differ by at least one second stay distinct after
/// sanitization; sub-second differences are not preserved.
pub fn resolve(
    base_name: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    purpose: RequestPurpose,
) -> String {
    let suffix = if purpose.uses_shared_name() {
        SHARED_SUFFIX.to_string()
    } else {
        random_suffix()
    };
    format!(
        "{}{}_{}",
        sanitize(base_name),
        time_window_suffix(start, end),
        suffix
    )
}

/// The `_{start}_{end}` portion of a stream name. Also used to recover the
/// base prefix from a persisted name when a camera has been reassigned.
pub fn time_window_suffix(start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    format!("_{}_{}", sanitize_timestamp(start), sanitize_timestamp(end))
}

/// The sanitized base as it appears at the front of a derived stream name.
pub fn sanitize_base(base_name: &str) -> String {
    sanitize(base_name)
}

fn sanitize_timestamp(instant: DateTime<Utc>) -> String {
    sanitize(&instant.format("%Y-%m-%dT%H:%M:%S%:z").to_string())
}

/// Replace every character outside `[A-Za-z0-9_.+-]` with `_`. The `+` is
/// kept so the normalized UTC offset (`+00:00` → `+00_00`) survives intact.
fn sanitize(input: &str) -> String {
    input
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-' | '+') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn random_suffix() -> String {
    let mut rng = rand::rng();
    (0..RANDOM_SUFFIX_LEN)
        .map(|_| {
            let idx = rng.random_range(0..RANDOM_SUFFIX_CHARSET.len());
            RANDOM_SUFFIX_CHARSET[idx] as char
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn window() -> (DateTime<Utc>, DateTime<Utc>) {
        (
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 5, 0).unwrap(),
        )
    }

    #[test]
    fn test_shared_purpose_yields_documented_name() {
        let (start, end) = window();
        let name = resolve("cam1", start, end, RequestPurpose::Shared);
        assert_eq!(
            name,
            "cam1_2024-01-01T00_00_00+00_00_2024-01-01T00_05_00+00_00_shared"
        );
    }

    #[test]
    fn test_shared_purpose_is_deterministic() {
        let (start, end) = window();
        let first = resolve("cam1", start, end, RequestPurpose::Alert);
        let second = resolve("cam1", start, end, RequestPurpose::Anonymous);
        assert_eq!(first, second);
    }

    #[test]
    fn test_create_purpose_yields_fresh_names() {
        let (start, end) = window();
        let first = resolve("cam1", start, end, RequestPurpose::Create);
        let second = resolve("cam1", start, end, RequestPurpose::Create);
        assert_ne!(first, second);

        let suffix = first.rsplit('_').next().unwrap();
        assert_eq!(suffix.len(), 10);
        assert!(suffix
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }

    #[test]
    fn test_distinct_windows_yield_distinct_names() {
        let (start, end) = window();
        let shifted_end = end + chrono::Duration::seconds(1);
        let a = resolve("cam1", start, end, RequestPurpose::Shared);
        let b = resolve("cam1", start, shifted_end, RequestPurpose::Shared);
        assert_ne!(a, b);
    }

    #[test]
    fn test_base_name_is_sanitized() {
        let (start, end) = window();
        let name = resolve("front door/cam#1", start, end, RequestPurpose::Shared);
        assert!(name.starts_with("front_door_cam_1_"));
        assert!(name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-' | '+')));
    }
}
