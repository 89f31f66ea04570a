//! Hamper cart-line formatting.
//!
//! A hamper is a curated multi-product bundle sold at per-product bundle
//! prices. Given the hamper definition and its member products, this module
//! produces the add-line inputs, one per product, in input order. Output is
//! deterministic so re-adding the same hamper is idempotent at the platform
//! layer (identical merchandise plus identical attributes).

use clovermead_core::Price;
use tracing::warn;

use crate::shopify::types::{CartLineInput, Product, ProductVariant};

use super::bundle::BundleMembership;

/// A hamper bundle definition.
#[derive(Debug, Clone)]
pub struct HamperDefinition {
    /// Bundle identifier shared by all lines (collection gid).
    pub id: String,
    /// Display name.
    pub name: String,
}

/// One product inside a hamper.
#[derive(Debug, Clone)]
pub struct HamperMember {
    pub product: Product,
    /// Units of this product per hamper.
    pub unit_quantity: u32,
    /// Per-unit price inside the bundle.
    pub bundle_price: Price,
}

/// Build one add-line input per member product.
///
/// Variant selection: the variant priced at the member's bundle price when
/// one exists, else the default variant. Products without variants are
/// skipped. Output order matches input order.
#[must_use]
pub fn build_hamper_lines(hamper: &HamperDefinition, members: &[HamperMember]) -> Vec<CartLineInput> {
    members
        .iter()
        .filter_map(|member| {
            let Some(default_variant) = member.product.default_variant() else {
                warn!(product = %member.product.handle, "hamper product has no variants; skipping");
                return None;
            };
            let variant = select_variant(member, default_variant);

            let membership = BundleMembership::hamper(
                hamper.id.clone(),
                hamper.name.clone(),
                member.bundle_price.amount,
                default_variant.price.decimal(),
            );

            Some(CartLineInput {
                merchandise_id: variant.id.clone(),
                quantity: i64::from(member.unit_quantity.max(1)),
                attributes: Some(membership.to_attributes()),
            })
        })
        .collect()
}

/// Pick the bundle-priced variant when one exists, else the default.
fn select_variant<'a>(member: &'a HamperMember, default_variant: &'a ProductVariant) -> &'a ProductVariant {
    member
        .product
        .variants
        .nodes
        .iter()
        .find(|v| v.price.decimal() == Some(member.bundle_price.amount))
        .unwrap_or(default_variant)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::cart::bundle::BundleKind;
    use crate::shopify::types::{Money, ProductVariantConnection};
    use clovermead_core::CurrencyCode;
    use rust_decimal::Decimal;

    fn variant(id: &str, amount: &str) -> ProductVariant {
        ProductVariant {
            id: format!("gid://shopify/ProductVariant/{id}"),
            title: "Default Title".to_string(),
            available_for_sale: true,
            quantity_available: Some(10),
            price: Money {
                amount: amount.to_string(),
                currency_code: "USD".to_string(),
            },
            compare_at_price: None,
            image: None,
        }
    }

    fn product(handle: &str, variants: Vec<ProductVariant>) -> Product {
        Product {
            id: format!("gid://shopify/Product/{handle}"),
            handle: handle.to_string(),
            title: handle.to_string(),
            description: String::new(),
            available_for_sale: true,
            featured_image: None,
            variants: ProductVariantConnection { nodes: variants },
            bundle_price: None,
        }
    }

    fn hamper() -> HamperDefinition {
        HamperDefinition {
            id: "gid://shopify/Collection/7".to_string(),
            name: "Harvest Hamper".to_string(),
        }
    }

    fn member(handle: &str, variants: Vec<ProductVariant>, price: &str) -> HamperMember {
        HamperMember {
            product: product(handle, variants),
            unit_quantity: 1,
            bundle_price: Price::new(price.parse::<Decimal>().unwrap(), CurrencyCode::USD),
        }
    }

    #[test]
    fn prefers_the_bundle_priced_variant() {
        let members = vec![member(
            "honey",
            vec![variant("1", "9.99"), variant("2", "7.50")],
            "7.50",
        )];
        let lines = build_hamper_lines(&hamper(), &members);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].merchandise_id, "gid://shopify/ProductVariant/2");
    }

    #[test]
    fn falls_back_to_the_default_variant() {
        let members = vec![member("honey", vec![variant("1", "9.99")], "7.50")];
        let lines = build_hamper_lines(&hamper(), &members);
        assert_eq!(lines[0].merchandise_id, "gid://shopify/ProductVariant/1");
    }

    #[test]
    fn lines_carry_hamper_membership_and_original_price() {
        let members = vec![member(
            "honey",
            vec![variant("1", "9.99"), variant("2", "7.50")],
            "7.50",
        )];
        let lines = build_hamper_lines(&hamper(), &members);
        let attributes = lines[0].attributes.as_ref().unwrap();
        let membership = BundleMembership::from_attribute_inputs(attributes).unwrap();
        assert_eq!(membership.kind, BundleKind::Hamper);
        assert_eq!(membership.bundle_name, "Harvest Hamper");
        assert_eq!(membership.unit_price, Some(Decimal::new(750, 2)));
        assert_eq!(membership.original_price, Some(Decimal::new(999, 2)));
    }

    #[test]
    fn output_is_deterministic_and_order_preserving() {
        let members = vec![
            member("honey", vec![variant("1", "9.99")], "7.50"),
            member("jam", vec![variant("2", "5.25")], "4.00"),
            member("oats", vec![variant("3", "3.10")], "2.80"),
        ];
        let first = build_hamper_lines(&hamper(), &members);
        let second = build_hamper_lines(&hamper(), &members);
        assert_eq!(first, second);
        let ids: Vec<_> = first.iter().map(|l| l.merchandise_id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "gid://shopify/ProductVariant/1",
                "gid://shopify/ProductVariant/2",
                "gid://shopify/ProductVariant/3",
            ]
        );
    }

    #[test]
    fn variantless_products_are_skipped() {
        let members = vec![
            member("ghost", vec![], "1.00"),
            member("honey", vec![variant("1", "9.99")], "7.50"),
        ];
        let lines = build_hamper_lines(&hamper(), &members);
        assert_eq!(lines.len(), 1);
    }
}
