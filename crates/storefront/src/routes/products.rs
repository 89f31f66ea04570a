//! Product route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;

use crate::cart::gate::{self, ButtonState};
use crate::error::Result;
use crate::shopify::OnlineSalesConfig;
use crate::shopify::types::Product;
use crate::state::AppState;

/// Product page data: the product plus its derived buy-button state.
#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPage {
    pub product: Product,
    pub buy_button: ButtonState,
}

/// Serve product detail data.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(handle): Path<String>,
) -> Result<Json<ProductPage>> {
    let product = state.storefront().get_product_by_handle(&handle).await?;

    // The gate fails open: a settings outage must not blank every buy button.
    let sales = state
        .storefront()
        .get_online_sales_config()
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "online-sales check failed; assuming enabled");
            OnlineSalesConfig::default()
        });

    let mut buy_button =
        gate::compute_button_state(sales.enabled, product.available_for_sale, "Add to Cart");
    if !sales.enabled && sales.reason.is_some() {
        buy_button.reason = sales.reason;
    }

    Ok(Json(ProductPage {
        product,
        buy_button,
    }))
}
