//! Object key derivation.

use chrono::{DateTime, Utc};

/// Root every uploaded object is stored under.
const KEY_PREFIX: &str = "uploads";

/// Generate the storage key for a new upload.
///
/// Format: `uploads/{YYYY_MM_DD}/{unix_nanos}_{filename}`. Two calls collide
/// only for the same filename within the same nanosecond.
#[must_use]
pub fn generate_object_key(filename: &str, now: DateTime<Utc>) -> String {
    let nanos = now.timestamp_nanos_opt().unwrap_or_default();
    format!(
        "{KEY_PREFIX}/{}/{nanos}_{filename}",
        now.format("%Y_%m_%d")
    )
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    // Keys minted in the same nanosecond collide only when the filenames do.
    proptest! {
        #[test]
        fn prop_same_tick_distinct_names_distinct_keys(
            nanos in 0i64..4_000_000_000_000_000_000,
            a in "[a-zA-Z0-9._ -]{1,40}",
            b in "[a-zA-Z0-9._ -]{1,40}",
        ) {
            let now = Utc.timestamp_nanos(nanos);
            let ka = generate_object_key(&a, now);
            let kb = generate_object_key(&b, now);
            prop_assert_eq!(ka == kb, a == b);
        }
    }

    // Every key is three segments deep as long as the filename has no slash.
    proptest! {
        #[test]
        fn prop_key_layout(
            nanos in 0i64..4_000_000_000_000_000_000,
            name in "[a-zA-Z0-9._-]{1,40}",
        ) {
            let key = generate_object_key(&name, Utc.timestamp_nanos(nanos));
            let segments: Vec<&str> = key.split('/').collect();
            prop_assert_eq!(segments.len(), 3);
            prop_assert_eq!(segments[0], "uploads");
            prop_assert_eq!(segments[1].len(), 10);
            let expected_tail = format!("{nanos}_{name}");
            prop_assert_eq!(segments[2], expected_tail.as_str());
        }
    }
}
