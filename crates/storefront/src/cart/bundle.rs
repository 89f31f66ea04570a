//! Bundle membership carried on cart line attributes.
//!
//! The platform has no first-class bundle entity: a line belongs to a bundle
//! purely by convention, through string attributes on the line. This module
//! is the typed view over that convention. Writers go through
//! [`BundleMembership::to_attributes`]; readers go through
//! [`BundleMembership::from_attributes`], which tolerates older lines that
//! carry only the marker key.

use rust_decimal::Decimal;

use crate::shopify::types::{Attribute, AttributeInput};

/// Marker for mega-saver category lines.
pub const ATTR_MEGA_SAVER: &str = "_mega_saver";
/// Marker for hamper bundle lines.
pub const ATTR_HAMPER: &str = "_hamper";
/// Bundle identifier shared by all lines of one bundle.
pub const ATTR_BUNDLE_ID: &str = "_bundle_id";
/// Display name of the bundle.
pub const ATTR_BUNDLE_NAME: &str = "_bundle_name";
/// Per-unit bundle price at add time.
pub const ATTR_BUNDLE_PRICE: &str = "_bundle_price";
/// Pre-discount per-unit price.
pub const ATTR_ORIGINAL_PRICE: &str = "_original_price";
/// Per-unit quantity for buy-N-for-Y offers.
pub const ATTR_SPECIAL_QUANTITY: &str = "_special_quantity";
/// Product title captured at add time.
pub const ATTR_PRODUCT_TITLE: &str = "_product_title";

/// Default bundle id for the storewide mega-saver category.
pub const MEGA_SAVER_BUNDLE_ID: &str = "mega-saver";
/// Default bundle name for the storewide mega-saver category.
pub const MEGA_SAVER_BUNDLE_NAME: &str = "Mega Saver";

/// Which bundle convention a line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleKind {
    /// Storewide special-offer category; adds merge by variant.
    MegaSaver,
    /// A named multi-product hamper.
    Hamper,
}

/// Typed view of a line's bundle attributes.
///
/// Price and quantity fields are optional on read: legacy lines may carry
/// only the marker, and membership detection must still work for them.
#[derive(Debug, Clone, PartialEq)]
pub struct BundleMembership {
    pub kind: BundleKind,
    pub bundle_id: String,
    pub bundle_name: String,
    /// Per-unit price at add time.
    pub unit_price: Option<Decimal>,
    /// Pre-discount per-unit price.
    pub original_price: Option<Decimal>,
    /// Per-unit quantity for buy-N-for-Y offers.
    pub special_quantity: Option<u32>,
}

impl BundleMembership {
    /// Membership for the mega-saver category.
    #[must_use]
    pub fn mega_saver(
        unit_price: Option<Decimal>,
        original_price: Option<Decimal>,
        special_quantity: Option<u32>,
    ) -> Self {
        Self {
            kind: BundleKind::MegaSaver,
            bundle_id: MEGA_SAVER_BUNDLE_ID.to_string(),
            bundle_name: MEGA_SAVER_BUNDLE_NAME.to_string(),
            unit_price,
            original_price,
            special_quantity,
        }
    }

    /// Membership in a named hamper.
    #[must_use]
    pub fn hamper(
        bundle_id: String,
        bundle_name: String,
        unit_price: Decimal,
        original_price: Option<Decimal>,
    ) -> Self {
        Self {
            kind: BundleKind::Hamper,
            bundle_id,
            bundle_name,
            unit_price: Some(unit_price),
            original_price,
            special_quantity: None,
        }
    }

    /// Serialize to the platform's attribute convention.
    #[must_use]
    pub fn to_attributes(&self) -> Vec<AttributeInput> {
        let marker = match self.kind {
            BundleKind::MegaSaver => ATTR_MEGA_SAVER,
            BundleKind::Hamper => ATTR_HAMPER,
        };
        let mut attributes = vec![
            AttributeInput {
                key: marker.to_string(),
                value: "true".to_string(),
            },
            AttributeInput {
                key: ATTR_BUNDLE_ID.to_string(),
                value: self.bundle_id.clone(),
            },
            AttributeInput {
                key: ATTR_BUNDLE_NAME.to_string(),
                value: self.bundle_name.clone(),
            },
        ];
        if let Some(price) = self.unit_price {
            attributes.push(AttributeInput {
                key: ATTR_BUNDLE_PRICE.to_string(),
                value: price.to_string(),
            });
        }
        if let Some(price) = self.original_price {
            attributes.push(AttributeInput {
                key: ATTR_ORIGINAL_PRICE.to_string(),
                value: price.to_string(),
            });
        }
        if let Some(quantity) = self.special_quantity {
            attributes.push(AttributeInput {
                key: ATTR_SPECIAL_QUANTITY.to_string(),
                value: quantity.to_string(),
            });
        }
        attributes
    }

    /// Read membership off a line's attributes. `None` for plain lines.
    #[must_use]
    pub fn from_attributes(attributes: &[Attribute]) -> Option<Self> {
        let get = |key: &str| {
            attributes
                .iter()
                .find(|a| a.key == key)
                .and_then(|a| a.value.as_deref())
        };

        let kind = if get(ATTR_MEGA_SAVER).is_some_and(is_truthy) {
            BundleKind::MegaSaver
        } else if get(ATTR_HAMPER).is_some_and(is_truthy) {
            BundleKind::Hamper
        } else {
            return None;
        };

        let (default_id, default_name) = match kind {
            BundleKind::MegaSaver => (MEGA_SAVER_BUNDLE_ID, MEGA_SAVER_BUNDLE_NAME),
            BundleKind::Hamper => ("", ""),
        };

        Some(Self {
            kind,
            bundle_id: get(ATTR_BUNDLE_ID).unwrap_or(default_id).to_string(),
            bundle_name: get(ATTR_BUNDLE_NAME).unwrap_or(default_name).to_string(),
            unit_price: get(ATTR_BUNDLE_PRICE).and_then(|v| v.parse().ok()),
            original_price: get(ATTR_ORIGINAL_PRICE).and_then(|v| v.parse().ok()),
            special_quantity: get(ATTR_SPECIAL_QUANTITY).and_then(|v| v.parse().ok()),
        })
    }

    /// Read membership off add-line input attributes.
    #[must_use]
    pub fn from_attribute_inputs(attributes: &[AttributeInput]) -> Option<Self> {
        let owned: Vec<Attribute> = attributes
            .iter()
            .map(|a| Attribute {
                key: a.key.clone(),
                value: Some(a.value.clone()),
            })
            .collect();
        Self::from_attributes(&owned)
    }
}

/// Interpret a form/attribute value as a boolean flag.
#[must_use]
pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn mega_saver_attributes_round_trip() {
        let membership = BundleMembership::mega_saver(
            Some(Decimal::new(499, 2)),
            Some(Decimal::new(799, 2)),
            Some(3),
        );
        let attributes: Vec<Attribute> = membership
            .to_attributes()
            .into_iter()
            .map(|a| Attribute {
                key: a.key,
                value: Some(a.value),
            })
            .collect();

        let read = BundleMembership::from_attributes(&attributes).unwrap();
        assert_eq!(read, membership);
    }

    #[test]
    fn plain_lines_have_no_membership() {
        let attributes = vec![Attribute {
            key: "gift_note".to_string(),
            value: Some("Happy birthday".to_string()),
        }];
        assert!(BundleMembership::from_attributes(&attributes).is_none());
    }

    #[test]
    fn legacy_marker_only_line_still_detected() {
        let attributes = vec![Attribute {
            key: ATTR_MEGA_SAVER.to_string(),
            value: Some("1".to_string()),
        }];
        let membership = BundleMembership::from_attributes(&attributes).unwrap();
        assert_eq!(membership.kind, BundleKind::MegaSaver);
        assert_eq!(membership.bundle_id, MEGA_SAVER_BUNDLE_ID);
        assert!(membership.unit_price.is_none());
    }

    #[test]
    fn hamper_and_mega_saver_markers_are_distinct() {
        let hamper = BundleMembership::hamper(
            "gid://shopify/Collection/1".to_string(),
            "Autumn Hamper".to_string(),
            Decimal::new(1250, 2),
            None,
        );
        let attributes: Vec<Attribute> = hamper
            .to_attributes()
            .into_iter()
            .map(|a| Attribute {
                key: a.key,
                value: Some(a.value),
            })
            .collect();
        let read = BundleMembership::from_attributes(&attributes).unwrap();
        assert_eq!(read.kind, BundleKind::Hamper);
    }

    #[test]
    fn truthiness() {
        assert!(is_truthy("true"));
        assert!(is_truthy("1"));
        assert!(is_truthy(" YES "));
        assert!(!is_truthy("false"));
        assert!(!is_truthy("0"));
        assert!(!is_truthy(""));
    }
}
