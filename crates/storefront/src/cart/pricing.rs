//! Custom per-variant price persistence for bundle contexts.
//!
//! When a hamper line is added at a bundle price, the price is also written
//! to the variant's metafield so later reads can surface it. The write is
//! best-effort enrichment: the line attributes already carry the
//! authoritative bundle and original prices for display, so a failed write
//! is logged and skipped rather than failing the batch.

use rust_decimal::Decimal;
use tracing::warn;

use clovermead_core::VariantGid;

use crate::shopify::ShopifyError;
use crate::shopify::types::CartLineInput;

use super::bundle::BundleMembership;

/// The platform's variant metafield writer.
///
/// Implemented by [`crate::shopify::AdminClient`]; faked in tests.
pub trait CustomPricer: Send + Sync {
    /// Persist a custom price on the variant's metafield storage.
    fn apply_custom_price(
        &self,
        variant_id: &VariantGid,
        price: Decimal,
    ) -> impl Future<Output = Result<(), ShopifyError>> + Send;
}

/// Write custom prices for every line that carries a bundle price.
///
/// Writes run sequentially; each item's failure is isolated so one failing
/// write does not poison the rest of the batch. Partial success is
/// acceptable.
pub async fn apply_custom_prices<P: CustomPricer>(pricer: &P, lines: &[CartLineInput]) {
    for line in lines {
        let Some(attributes) = line.attributes.as_deref() else {
            continue;
        };
        let Some(price) =
            BundleMembership::from_attribute_inputs(attributes).and_then(|m| m.unit_price)
        else {
            continue;
        };
        let Some(gid) = VariantGid::normalize(&line.merchandise_id) else {
            continue;
        };
        if let Err(e) = pricer.apply_custom_price(&gid, price).await {
            warn!(variant = %gid, price = %price, error = %e, "custom price write failed");
        }
    }
}
