//! Part normalization ahead of completion.

use super::types::PartDescriptor;

/// Remove wrapping double quotes from an ETag.
///
/// Providers return part ETags quoted; the commit call wants the bare value.
#[must_use]
pub fn strip_etag_quotes(etag: &str) -> &str {
    etag.trim_matches('"')
}

/// Order parts ascending by part number and strip quotes from every ETag.
///
/// The sort is stable, so duplicate part numbers keep their input order.
#[must_use]
pub fn normalize_parts(mut parts: Vec<PartDescriptor>) -> Vec<PartDescriptor> {
    parts.sort_by_key(|p| p.part_number);
    for part in &mut parts {
        let bare = strip_etag_quotes(&part.etag);
        if bare.len() != part.etag.len() {
            part.etag = bare.to_string();
        }
    }
    parts
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    fn part_set() -> impl Strategy<Value = Vec<PartDescriptor>> {
        prop::collection::btree_set(1u32..10_000, 0..64).prop_map(|numbers| {
            numbers
                .into_iter()
                .map(|n| PartDescriptor::new(n, format!("\"etag-{n}\"")))
                .collect()
        })
    }

    // Property: normalization is order independent for a set of unique parts.
    proptest! {
        #[test]
        fn prop_normalize_is_permutation_invariant(
            (parts, shuffled) in part_set().prop_flat_map(|parts| {
                let shuffled = Just(parts.clone()).prop_shuffle();
                (Just(parts), shuffled)
            })
        ) {
            prop_assert_eq!(normalize_parts(parts), normalize_parts(shuffled));
        }
    }

    // Property: output is sorted and carries no wrapping quotes.
    proptest! {
        #[test]
        fn prop_normalize_sorted_and_bare(parts in part_set()) {
            let normalized = normalize_parts(parts);
            prop_assert!(normalized.windows(2).all(|w| w[0].part_number <= w[1].part_number));
            for part in &normalized {
                prop_assert!(!part.etag.starts_with('"'));
                prop_assert!(!part.etag.ends_with('"'));
            }
        }
    }

    // Property: stripping quotes is idempotent.
    proptest! {
        #[test]
        fn prop_strip_etag_quotes_idempotent(etag in "\"{0,3}[a-f0-9-]{0,40}\"{0,3}") {
            let once = strip_etag_quotes(&etag);
            prop_assert_eq!(strip_etag_quotes(once), once);
        }
    }
}
