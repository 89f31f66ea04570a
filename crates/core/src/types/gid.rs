//! Canonical Shopify global IDs for product variants.
//!
//! Clients submit merchandise identifiers in whatever shape their vintage
//! produced: the canonical `gid://shopify/ProductVariant/123` form, a bare
//! numeric id, a gid with the wrong resource type, or an id embedded in a
//! longer path. Every mutation path funnels through [`VariantGid::normalize`]
//! so the platform only ever sees the canonical form.

use serde::{Deserialize, Serialize};

/// Canonical prefix for product variant global IDs.
pub const VARIANT_GID_PREFIX: &str = "gid://shopify/ProductVariant/";

/// A normalized product variant global ID.
///
/// Always holds the canonical `gid://shopify/ProductVariant/<numeric>` form.
/// Construction goes through [`VariantGid::normalize`], which is idempotent:
/// normalizing an already-canonical id reproduces it unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VariantGid(String);

impl VariantGid {
    /// Coerce an incoming merchandise identifier to canonical form.
    ///
    /// Rules, in order:
    /// - already canonical (prefix plus all-digit suffix): passed through;
    /// - slash-delimited: reduced to the last path segment;
    /// - remaining non-digit characters stripped, then re-wrapped.
    ///
    /// Returns `None` when the input carries no digits at all, in which case
    /// there is no variant to address and the entry should be dropped.
    #[must_use]
    pub fn normalize(raw: &str) -> Option<Self> {
        let raw = raw.trim();

        if let Some(suffix) = raw.strip_prefix(VARIANT_GID_PREFIX)
            && !suffix.is_empty()
            && suffix.bytes().all(|b| b.is_ascii_digit())
        {
            return Some(Self(raw.to_owned()));
        }

        let segment = raw.rsplit('/').next().unwrap_or(raw);
        let digits: String = segment.chars().filter(char::is_ascii_digit).collect();
        if digits.is_empty() {
            return None;
        }

        Some(Self(format!("{VARIANT_GID_PREFIX}{digits}")))
    }

    /// The canonical gid string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the wrapper, yielding the canonical gid string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for VariantGid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for VariantGid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn canonical_input_is_a_fixed_point() {
        let canonical = "gid://shopify/ProductVariant/41234567890123";
        let gid = VariantGid::normalize(canonical).unwrap();
        assert_eq!(gid.as_str(), canonical);

        // Normalizing the output again must reproduce it byte-for-byte.
        let again = VariantGid::normalize(gid.as_str()).unwrap();
        assert_eq!(again, gid);
    }

    #[test]
    fn bare_numeric_id_is_wrapped() {
        let gid = VariantGid::normalize("41234567890123").unwrap();
        assert_eq!(gid.as_str(), "gid://shopify/ProductVariant/41234567890123");
    }

    #[test]
    fn wrong_resource_type_is_rewrapped() {
        let gid = VariantGid::normalize("gid://shopify/Product/41234567890123").unwrap();
        assert_eq!(gid.as_str(), "gid://shopify/ProductVariant/41234567890123");
    }

    #[test]
    fn slash_embedded_id_uses_last_segment() {
        let gid = VariantGid::normalize("shopify/ProductVariant/555").unwrap();
        assert_eq!(gid.as_str(), "gid://shopify/ProductVariant/555");
    }

    #[test]
    fn stray_characters_are_stripped() {
        let gid = VariantGid::normalize("variant-777-large").unwrap();
        assert_eq!(gid.as_str(), "gid://shopify/ProductVariant/777");
    }

    #[test]
    fn all_shapes_of_one_variant_converge() {
        let shapes = [
            "gid://shopify/ProductVariant/123",
            "123",
            "gid://shopify/Product/123",
            "stuff/123",
            " 123 ",
        ];
        let normalized: Vec<_> = shapes
            .iter()
            .map(|s| VariantGid::normalize(s).unwrap())
            .collect();
        assert!(normalized.iter().all(|g| g == &normalized[0]));
    }

    #[test]
    fn digit_free_input_is_rejected() {
        assert!(VariantGid::normalize("").is_none());
        assert!(VariantGid::normalize("not-a-variant").is_none());
        assert!(VariantGid::normalize("gid://shopify/ProductVariant/").is_none());
    }
}
