//! Quality-tier descriptors and URL resolution.

/// Canonical tier labels, finest first. A later index means lower quality.
pub const QUALITY_ORDER: [&str; 9] = ["16k", "12k", "10k", "8k", "6k", "4k", "2k", "1k", "512"];

/// Where a logical texture can be fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetDescriptor {
    /// One URL regardless of quality.
    Single(String),
    /// `(tier label, url)` pairs in insertion order.
    Tiered(Vec<(String, String)>),
}

impl AssetDescriptor {
    /// Build a tiered descriptor from static `(label, url)` pairs.
    pub fn tiered(pairs: &[(&str, &str)]) -> Self {
        Self::Tiered(
            pairs
                .iter()
                .map(|(label, url)| (label.to_string(), url.to_string()))
                .collect(),
        )
    }

    /// URL stored under `label`, ignoring empty entries.
    pub fn tier(&self, label: &str) -> Option<&str> {
        match self {
            Self::Single(_) => None,
            Self::Tiered(pairs) => pairs
                .iter()
                .find(|(l, url)| l == label && !url.is_empty())
                .map(|(_, url)| url.as_str()),
        }
    }
}

/// Position of `label` in [`QUALITY_ORDER`].
pub fn tier_index(label: &str) -> Option<usize> {
    QUALITY_ORDER.iter().position(|&tier| tier == label)
}

/// Pick a concrete URL for `preferred`.
///
/// Scans from the preferred tier toward lower quality. When only finer tiers
/// than the preferred one exist, the nearest finer tier is used instead. An
/// unknown preferred label resolves to the finest populated tier, and a
/// descriptor with no canonical tiers falls back to its first non-empty entry.
/// Returns `None` only when the descriptor holds no usable URL at all.
pub fn resolve_url<'a>(descriptor: &'a AssetDescriptor, preferred: &str) -> Option<&'a str> {
    let pairs = match descriptor {
        AssetDescriptor::Single(url) => return (!url.is_empty()).then_some(url.as_str()),
        AssetDescriptor::Tiered(pairs) => pairs,
    };

    let present: Vec<(usize, &str)> = QUALITY_ORDER
        .iter()
        .enumerate()
        .filter_map(|(i, tier)| descriptor.tier(tier).map(|url| (i, url)))
        .collect();

    if present.is_empty() {
        return pairs
            .iter()
            .map(|(_, url)| url.as_str())
            .find(|url| !url.is_empty());
    }

    let Some(start) = tier_index(preferred) else {
        return present.first().map(|&(_, url)| url);
    };

    present
        .iter()
        .find(|&&(i, _)| i >= start)
        .or_else(|| present.iter().rev().find(|&&(i, _)| i < start))
        .map(|&(_, url)| url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eight_and_four() -> AssetDescriptor {
        AssetDescriptor::tiered(&[("8k", "A"), ("4k", "B")])
    }

    #[test]
    fn test_preferred_tier_present() {
        assert_eq!(resolve_url(&eight_and_four(), "8k"), Some("A"));
        assert_eq!(resolve_url(&eight_and_four(), "4k"), Some("B"));
    }

    #[test]
    fn test_falls_back_toward_lower_quality() {
        assert_eq!(resolve_url(&eight_and_four(), "16k"), Some("A"));
        assert_eq!(resolve_url(&eight_and_four(), "6k"), Some("B"));
    }

    #[test]
    fn test_only_finer_tiers_picks_nearest_finer() {
        assert_eq!(resolve_url(&eight_and_four(), "2k"), Some("B"));
        assert_eq!(resolve_url(&eight_and_four(), "512"), Some("B"));
    }

    #[test]
    fn test_unknown_preferred_uses_finest_present() {
        assert_eq!(resolve_url(&eight_and_four(), "ultra"), Some("A"));
        let reversed = AssetDescriptor::tiered(&[("2k", "low"), ("4k", "high")]);
        assert_eq!(resolve_url(&reversed, ""), Some("high"));
    }

    #[test]
    fn test_single_url() {
        let single = AssetDescriptor::Single("file.jpg".to_string());
        assert_eq!(resolve_url(&single, "8k"), Some("file.jpg"));
        assert_eq!(resolve_url(&AssetDescriptor::Single(String::new()), "8k"), None);
    }

    #[test]
    fn test_empty_descriptor_resolves_to_none() {
        assert_eq!(resolve_url(&AssetDescriptor::Tiered(Vec::new()), "8k"), None);
        let blanks = AssetDescriptor::tiered(&[("8k", ""), ("4k", "")]);
        assert_eq!(resolve_url(&blanks, "8k"), None);
    }

    #[test]
    fn test_non_canonical_labels_use_first_entry() {
        let custom = AssetDescriptor::tiered(&[("hd", ""), ("sd", "sd.jpg"), ("hi", "hi.jpg")]);
        assert_eq!(resolve_url(&custom, "8k"), Some("sd.jpg"));
    }

    #[test]
    fn test_empty_tier_is_skipped() {
        let sparse = AssetDescriptor::tiered(&[("8k", ""), ("4k", "B")]);
        assert_eq!(resolve_url(&sparse, "8k"), Some("B"));
    }

    /// Any descriptor with at least one populated tier resolves for every preferred label.
    #[test]
    fn test_resolution_is_total() {
        for (i, tier) in QUALITY_ORDER.iter().enumerate() {
            let descriptor = AssetDescriptor::tiered(&[(*tier, "only")]);
            for preferred in QUALITY_ORDER.iter().chain(["bogus"].iter()) {
                assert_eq!(
                    resolve_url(&descriptor, preferred),
                    Some("only"),
                    "tier {i} ({tier}) unresolved for preferred {preferred}"
                );
            }
        }
    }

    /// Lowering the preferred tier never yields a finer tier while a coarser one is available.
    #[test]
    fn test_fallback_is_monotonic() {
        let descriptor = AssetDescriptor::tiered(&[("12k", "12"), ("6k", "6"), ("1k", "1")]);
        let mut last = 0;
        for preferred in QUALITY_ORDER {
            let url = resolve_url(&descriptor, preferred).unwrap();
            let idx = tier_index(&format!("{url}k")).unwrap();
            assert!(idx >= last, "{preferred} resolved to {url}, finer than before");
            last = idx;
        }
    }
}
