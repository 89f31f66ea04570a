//! Custom price batch behavior against the fake metafield writer.

use clovermead_integration_tests::FakePricer;
use clovermead_storefront::cart::bundle::BundleMembership;
use clovermead_storefront::cart::pricing;
use clovermead_storefront::shopify::types::CartLineInput;
use rust_decimal::Decimal;

fn hamper_line(variant: &str, price: Decimal) -> CartLineInput {
    let membership = BundleMembership::hamper(
        "gid://shopify/Collection/7".to_string(),
        "Harvest Hamper".to_string(),
        price,
        None,
    );
    CartLineInput {
        merchandise_id: format!("gid://shopify/ProductVariant/{variant}"),
        quantity: 1,
        attributes: Some(membership.to_attributes()),
    }
}

#[tokio::test]
async fn one_failing_write_does_not_poison_the_batch() {
    let pricer = FakePricer::new();
    pricer.fail_for("gid://shopify/ProductVariant/2");

    let lines = vec![
        hamper_line("1", Decimal::new(750, 2)),
        hamper_line("2", Decimal::new(400, 2)),
        hamper_line("3", Decimal::new(280, 2)),
    ];

    pricing::apply_custom_prices(&pricer, &lines).await;

    // Partial success: the failing middle item is skipped, the rest land.
    let applied = pricer.applied();
    assert_eq!(applied.len(), 2);
    assert_eq!(applied[0].0, "gid://shopify/ProductVariant/1");
    assert_eq!(applied[0].1, Decimal::new(750, 2));
    assert_eq!(applied[1].0, "gid://shopify/ProductVariant/3");
}

#[tokio::test]
async fn lines_without_a_bundle_price_are_skipped() {
    let pricer = FakePricer::new();

    let lines = vec![
        CartLineInput {
            merchandise_id: "gid://shopify/ProductVariant/1".to_string(),
            quantity: 1,
            attributes: None,
        },
        hamper_line("2", Decimal::new(400, 2)),
    ];

    pricing::apply_custom_prices(&pricer, &lines).await;

    let applied = pricer.applied();
    assert_eq!(applied.len(), 1);
    assert_eq!(applied[0].0, "gid://shopify/ProductVariant/2");
}
