//! Common utilities shared across modules.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

/// Current UTC timestamp in seconds since UNIX_EPOCH.
pub fn get_utc_timestamp() -> u64 {
    Utc::now().timestamp() as u64
}

/// RFC 3339 rendering of a timestamp produced by [`get_utc_timestamp`].
pub fn format_timestamp(secs: u64) -> String {
    DateTime::<Utc>::from_timestamp(secs as i64, 0)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| secs.to_string())
}

/// Hex SHA-256 of file content, used for change detection.
pub fn calculate_hash(content: &[u8]) -> String {
    let digest = Sha256::digest(content);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_utc_timestamp() {
        let ts = get_utc_timestamp();
        // Should be a reasonable Unix timestamp (after 2020)
        assert!(ts > 1577836800, "Timestamp should be after 2020-01-01");
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0), "1970-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_calculate_hash_is_stable() {
        let a = calculate_hash(b"export const x = 1;");
        assert_eq!(a.len(), 64);
        assert_eq!(a, calculate_hash(b"export const x = 1;"));
        assert_ne!(a, calculate_hash(b"export const x = 2;"));
    }
}
