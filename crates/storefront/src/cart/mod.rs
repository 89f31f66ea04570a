//! Cart mutation and reconciliation.
//!
//! This module owns the one genuinely stateful flow in the storefront: turning
//! a parsed [`CartIntent`] into exactly one platform cart mutation. The
//! platform itself (Shopify) is reached through the [`CartService`] seam so
//! the reconciliation rules can be exercised against an in-memory fake.
//!
//! Mega-saver adds are the only path that reads before writing: an incoming
//! add must merge into an existing mega-saver line for the same variant
//! instead of appending a duplicate. Two concurrent requests for the same
//! cart can still race that read-then-write and produce two lines; the
//! platform serializes per-cart mutations but this service takes no
//! client-side lock. Known limitation.

pub mod bundle;
pub mod gate;
pub mod hamper;
pub mod intent;
pub mod loader;
pub mod pricing;

use clovermead_core::VariantGid;
use thiserror::Error;
use tracing::debug;

use crate::shopify::ShopifyError;
use crate::shopify::types::{
    Cart, CartBuyerIdentityInput, CartLineInput, CartLineUpdateInput,
};

use bundle::{BundleKind, BundleMembership};
use intent::CartIntent;
use pricing::CustomPricer;

/// Errors raised while normalizing or dispatching a cart action.
#[derive(Debug, Error)]
pub enum CartActionError {
    /// No parsing strategy produced a usable action and input.
    #[error("could not process cart request")]
    InvalidRequest,

    /// The action was identified but every submitted line item was malformed.
    #[error("no valid line items in request")]
    InvalidLineItems,

    /// The action tag is not part of the dispatch table.
    #[error("unsupported cart action: {0}")]
    UnsupportedAction(String),

    /// The downstream platform call failed.
    #[error(transparent)]
    Platform(#[from] ShopifyError),
}

/// The platform cart boundary.
///
/// Implemented by [`crate::shopify::StorefrontClient`] against the live
/// Storefront API and by an in-memory fake in the integration tests. Each
/// method maps to one platform call; none of them retries.
pub trait CartService: Send + Sync {
    /// Read a cart by id.
    fn get_cart(
        &self,
        cart_id: &str,
    ) -> impl Future<Output = Result<Cart, ShopifyError>> + Send;

    /// Create a cart, optionally seeded with lines.
    fn create_cart(
        &self,
        lines: Vec<CartLineInput>,
    ) -> impl Future<Output = Result<Cart, ShopifyError>> + Send;

    /// Append lines to a cart.
    fn add_lines(
        &self,
        cart_id: &str,
        lines: Vec<CartLineInput>,
    ) -> impl Future<Output = Result<Cart, ShopifyError>> + Send;

    /// Update existing lines. Quantity zero removes a line.
    fn update_lines(
        &self,
        cart_id: &str,
        lines: Vec<CartLineUpdateInput>,
    ) -> impl Future<Output = Result<Cart, ShopifyError>> + Send;

    /// Remove lines by id.
    fn remove_lines(
        &self,
        cart_id: &str,
        line_ids: Vec<String>,
    ) -> impl Future<Output = Result<Cart, ShopifyError>> + Send;

    /// Replace the set of discount codes.
    fn update_discount_codes(
        &self,
        cart_id: &str,
        codes: Vec<String>,
    ) -> impl Future<Output = Result<Cart, ShopifyError>> + Send;

    /// Replace the set of gift card codes.
    fn update_gift_card_codes(
        &self,
        cart_id: &str,
        codes: Vec<String>,
    ) -> impl Future<Output = Result<Cart, ShopifyError>> + Send;

    /// Update the buyer identity association.
    fn update_buyer_identity(
        &self,
        cart_id: &str,
        identity: CartBuyerIdentityInput,
    ) -> impl Future<Output = Result<Cart, ShopifyError>> + Send;
}

/// Dispatch one cart intent to the platform.
///
/// `cart_id` is the session's cart, if any; the cart is created lazily on the
/// first mutation. Returns the platform's view of the cart after the
/// mutation.
///
/// # Errors
///
/// `InvalidLineItems` when an add carries no usable lines after
/// normalization; `Platform` for downstream failures.
pub async fn dispatch<S, P>(
    service: &S,
    pricer: &P,
    cart_id: Option<&str>,
    intent: CartIntent,
) -> Result<Cart, CartActionError>
where
    S: CartService,
    P: CustomPricer,
{
    match intent {
        CartIntent::AddLines { lines, hamper } => {
            let lines = sanitize_add_lines(lines)?;
            if hamper.is_some() {
                // Best-effort enrichment; the line attributes already carry
                // the authoritative bundle price for display.
                pricing::apply_custom_prices(pricer, &lines).await;
            }
            add_or_create(service, cart_id, lines).await
        }

        CartIntent::AddMegaSaverItem(item) => {
            let Some(gid) = VariantGid::normalize(&item.merchandise_id) else {
                return Err(CartActionError::InvalidLineItems);
            };
            let quantity = i64::from(item.quantity.max(1));

            let existing = match cart_id {
                Some(id) => match service.get_cart(id).await {
                    Ok(cart) => Some(cart),
                    Err(ShopifyError::NotFound(_)) => None,
                    Err(e) => return Err(e.into()),
                },
                None => None,
            };

            let Some(cart) = existing else {
                return Ok(service.create_cart(vec![item.to_line_input(&gid)]).await?);
            };

            // Merge, not duplicate: only a line that is itself a mega-saver
            // line for this variant counts. A plain line for the same
            // variant stays separate.
            match find_mega_saver_line(&cart, gid.as_str()) {
                Some((line_id, current_quantity)) => {
                    debug!(line = %line_id, "merging mega-saver add into existing line");
                    let update = CartLineUpdateInput {
                        id: line_id,
                        quantity: Some(current_quantity + quantity),
                        merchandise_id: None,
                        attributes: None,
                    };
                    Ok(service.update_lines(&cart.id, vec![update]).await?)
                }
                None => Ok(service
                    .add_lines(&cart.id, vec![item.to_line_input(&gid)])
                    .await?),
            }
        }

        CartIntent::UpdateLines { lines } => {
            if lines.is_empty() {
                return Err(CartActionError::InvalidLineItems);
            }
            let cart = ensure_cart(service, cart_id).await?;
            // Forwarded unmodified: quantity zero is the platform's way of
            // removing a line.
            Ok(service.update_lines(&cart.id, lines).await?)
        }

        CartIntent::RemoveLines { line_ids } => {
            if line_ids.is_empty() {
                return Err(CartActionError::InvalidLineItems);
            }
            let cart = ensure_cart(service, cart_id).await?;
            Ok(service.remove_lines(&cart.id, line_ids).await?)
        }

        CartIntent::UpdateDiscountCodes { codes } => {
            let cart = ensure_cart(service, cart_id).await?;
            let merged = merge_codes(
                cart.discount_codes.iter().map(|d| d.code.clone()),
                codes,
            );
            Ok(service.update_discount_codes(&cart.id, merged).await?)
        }

        CartIntent::UpdateGiftCardCodes { codes } => {
            // Applied gift cards only surface masked; the caller supplies the
            // full desired set (session-tracked plus newly submitted).
            let cart = ensure_cart(service, cart_id).await?;
            Ok(service.update_gift_card_codes(&cart.id, codes).await?)
        }

        CartIntent::UpdateBuyerIdentity { identity } => {
            let cart = ensure_cart(service, cart_id).await?;
            Ok(service.update_buyer_identity(&cart.id, identity).await?)
        }
    }
}

/// Fetch the session cart, creating an empty one when absent or stale.
async fn ensure_cart<S: CartService>(
    service: &S,
    cart_id: Option<&str>,
) -> Result<Cart, ShopifyError> {
    if let Some(id) = cart_id {
        match service.get_cart(id).await {
            Ok(cart) => return Ok(cart),
            Err(ShopifyError::NotFound(_)) => {
                debug!(cart_id = %id, "session cart no longer exists; creating a new one");
            }
            Err(e) => return Err(e),
        }
    }
    service.create_cart(Vec::new()).await
}

/// Add lines to the session cart, creating the cart when absent or stale.
async fn add_or_create<S: CartService>(
    service: &S,
    cart_id: Option<&str>,
    lines: Vec<CartLineInput>,
) -> Result<Cart, CartActionError> {
    if let Some(id) = cart_id {
        match service.add_lines(id, lines.clone()).await {
            Ok(cart) => return Ok(cart),
            Err(ShopifyError::NotFound(_)) => {
                debug!(cart_id = %id, "session cart no longer exists; creating with lines");
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(service.create_cart(lines).await?)
}

/// Normalize merchandise ids and drop malformed entries.
///
/// An entry survives only with a resolvable variant id and a positive
/// quantity. When nothing survives the whole request fails and no mutation
/// is attempted.
fn sanitize_add_lines(lines: Vec<CartLineInput>) -> Result<Vec<CartLineInput>, CartActionError> {
    let sanitized: Vec<CartLineInput> = lines
        .into_iter()
        .filter_map(|mut line| {
            if line.quantity < 1 {
                debug!(merchandise = %line.merchandise_id, "dropping add entry with non-positive quantity");
                return None;
            }
            let Some(gid) = VariantGid::normalize(&line.merchandise_id) else {
                debug!(merchandise = %line.merchandise_id, "dropping add entry with unresolvable merchandise id");
                return None;
            };
            line.merchandise_id = gid.into_string();
            Some(line)
        })
        .collect();

    if sanitized.is_empty() {
        return Err(CartActionError::InvalidLineItems);
    }
    Ok(sanitized)
}

/// Find the mega-saver line for a variant, if one exists.
///
/// Returns the line id and its current quantity.
fn find_mega_saver_line(cart: &Cart, merchandise_id: &str) -> Option<(String, i64)> {
    cart.lines.nodes.iter().find_map(|line| {
        let merchandise = line.merchandise.as_ref()?;
        if merchandise.id != merchandise_id {
            return None;
        }
        let membership = BundleMembership::from_attributes(&line.attributes)?;
        if membership.kind == BundleKind::MegaSaver {
            Some((line.id.clone(), line.quantity))
        } else {
            None
        }
    })
}

/// Merge newly-submitted codes into the already-applied set.
///
/// Previously applied codes are never evicted; duplicates are matched
/// case-insensitively, the way the platform treats codes.
pub(crate) fn merge_codes(
    applied: impl Iterator<Item = String>,
    submitted: Vec<String>,
) -> Vec<String> {
    let mut merged: Vec<String> = applied.collect();
    for code in submitted {
        let code = code.trim();
        if code.is_empty() {
            continue;
        }
        if !merged.iter().any(|m| m.eq_ignore_ascii_case(code)) {
            merged.push(code.to_string());
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_codes_keeps_applied_and_appends_new() {
        let merged = merge_codes(
            vec!["SPRING".to_string()].into_iter(),
            vec!["WELCOME10".to_string()],
        );
        assert_eq!(merged, vec!["SPRING", "WELCOME10"]);
    }

    #[test]
    fn merge_codes_is_case_insensitive_on_duplicates() {
        let merged = merge_codes(
            vec!["Spring".to_string()].into_iter(),
            vec!["SPRING".to_string(), " ".to_string()],
        );
        assert_eq!(merged, vec!["Spring"]);
    }

    #[test]
    fn sanitize_drops_invalid_and_normalizes_the_rest() {
        let lines = vec![
            CartLineInput {
                merchandise_id: "123".to_string(),
                quantity: 3,
                attributes: None,
            },
            CartLineInput {
                merchandise_id: "456".to_string(),
                quantity: 0,
                attributes: None,
            },
            CartLineInput {
                merchandise_id: "no-digits".to_string(),
                quantity: 2,
                attributes: None,
            },
        ];

        let sanitized = sanitize_add_lines(lines).expect("one entry survives");
        assert_eq!(sanitized.len(), 1);
        assert_eq!(
            sanitized[0].merchandise_id,
            "gid://shopify/ProductVariant/123"
        );
        assert_eq!(sanitized[0].quantity, 3);
    }

    #[test]
    fn sanitize_fails_when_nothing_survives() {
        let lines = vec![CartLineInput {
            merchandise_id: "123".to_string(),
            quantity: 0,
            attributes: None,
        }];
        assert!(matches!(
            sanitize_add_lines(lines),
            Err(CartActionError::InvalidLineItems)
        ));
    }
}
