//! Hamper route handlers.
//!
//! A hamper is a curated collection whose products carry a bundle price
//! metafield. Adding a hamper formats one attributed cart line per member
//! product, persists the custom prices (best-effort), and adds the lines in
//! a single platform mutation.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tower_sessions::Session;
use tracing::instrument;

use clovermead_core::{CurrencyCode, Price};

use crate::cart::hamper::{HamperDefinition, HamperMember, build_hamper_lines};
use crate::cart::intent::CartIntent;
use crate::cart::{self, gate, pricing};
use crate::shopify::ShopifyError;
use crate::shopify::types::Collection;
use crate::state::AppState;

use super::cart::{error_response, get_cart_id, set_cart_id, success_response};

/// How many products one hamper may hold.
const HAMPER_PRODUCT_LIMIT: i64 = 20;

/// Add a whole hamper to the cart.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Path(handle): Path<String>,
) -> Response {
    // Hamper adds are buy actions; the online-sales gate applies.
    match state.storefront().get_online_sales_config().await {
        Ok(config) if !config.enabled => {
            let reason = config
                .reason
                .unwrap_or_else(|| gate::IN_STORE_ONLY_REASON.to_string());
            return (StatusCode::BAD_REQUEST, Json(json!({ "error": reason }))).into_response();
        }
        Ok(_) => {}
        Err(e) => {
            tracing::warn!(error = %e, "online-sales check failed; allowing hamper add");
        }
    }

    let collection = match state
        .storefront()
        .get_collection_by_handle(&handle, HAMPER_PRODUCT_LIMIT)
        .await
    {
        Ok(collection) => collection,
        Err(ShopifyError::NotFound(_)) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": format!("hamper not found: {handle}") })),
            )
                .into_response();
        }
        Err(e) => {
            return error_response(&state, &session, e.into()).await;
        }
    };

    let hamper = HamperDefinition {
        id: collection.id.clone(),
        name: collection.title.clone(),
    };
    let members = hamper_members(&collection);
    let lines = build_hamper_lines(&hamper, &members);
    if lines.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "hamper has no purchasable products" })),
        )
            .into_response();
    }

    // Custom prices are persisted here, once, so the dispatch below runs
    // without a hamper context.
    pricing::apply_custom_prices(state.admin(), &lines).await;

    let cart_id = get_cart_id(&session).await;
    let intent = CartIntent::AddLines {
        lines,
        hamper: None,
    };
    match cart::dispatch(state.storefront(), state.admin(), cart_id.as_deref(), intent).await {
        Ok(cart) => {
            if let Err(e) = set_cart_id(&session, &cart.id).await {
                tracing::error!("Failed to save cart ID to session: {e}");
            }
            success_response(cart, None)
        }
        Err(e) => error_response(&state, &session, e).await,
    }
}

/// Collect hamper members from the collection's products.
///
/// Products without a bundle price metafield are not part of the offer and
/// are skipped.
fn hamper_members(collection: &Collection) -> Vec<HamperMember> {
    collection
        .products
        .nodes
        .iter()
        .filter_map(|product| {
            let raw = product.bundle_price.as_ref()?;
            let Ok(amount) = raw.value.parse() else {
                tracing::warn!(
                    product = %product.handle,
                    value = %raw.value,
                    "unparseable bundle price metafield; skipping product"
                );
                return None;
            };
            let currency = product
                .default_variant()
                .and_then(|v| CurrencyCode::parse(&v.price.currency_code))
                .unwrap_or_default();
            Some(HamperMember {
                product: product.clone(),
                unit_quantity: 1,
                bundle_price: Price::new(amount, currency),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shopify::types::{
        MetafieldValue, Money, Product, ProductConnection, ProductVariant,
        ProductVariantConnection,
    };
    use rust_decimal::Decimal;

    fn product(handle: &str, price: &str, bundle_price: Option<&str>) -> Product {
        Product {
            id: format!("gid://shopify/Product/{handle}"),
            handle: handle.to_string(),
            title: handle.to_string(),
            description: String::new(),
            available_for_sale: true,
            featured_image: None,
            variants: ProductVariantConnection {
                nodes: vec![ProductVariant {
                    id: "gid://shopify/ProductVariant/1".to_string(),
                    title: "Default Title".to_string(),
                    available_for_sale: true,
                    quantity_available: None,
                    price: Money {
                        amount: price.to_string(),
                        currency_code: "USD".to_string(),
                    },
                    compare_at_price: None,
                    image: None,
                }],
            },
            bundle_price: bundle_price.map(|v| MetafieldValue {
                value: v.to_string(),
            }),
        }
    }

    #[test]
    fn members_require_a_bundle_price_metafield() {
        let collection = Collection {
            id: "gid://shopify/Collection/7".to_string(),
            handle: "harvest".to_string(),
            title: "Harvest Hamper".to_string(),
            description: String::new(),
            image: None,
            products: ProductConnection {
                nodes: vec![
                    product("honey", "9.99", Some("7.50")),
                    product("jam", "5.25", None),
                    product("oats", "3.10", Some("not-a-price")),
                ],
            },
        };

        let members = hamper_members(&collection);
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].product.handle, "honey");
        assert_eq!(members[0].bundle_price.amount, Decimal::new(750, 2));
    }
}
