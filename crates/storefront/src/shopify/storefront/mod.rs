//! Shopify Storefront API client implementation.
//!
//! POSTs raw GraphQL documents with `reqwest` and deserializes responses
//! straight into the domain types. Catalog reads are cached with `moka`
//! (5-minute TTL); the online-sales setting is cached for 60 seconds. Cart
//! state is never cached.

mod cache;
pub mod queries;

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, instrument};

use crate::cart::CartService;
use crate::config::ShopifyConfig;
use crate::shopify::ShopifyError;
use crate::shopify::types::{
    Cart, CartBuyerIdentityInput, CartLineInput, CartLineUpdateInput, CartUserError, Collection,
    MetafieldValue, Product,
};

use cache::CacheValue;
use queries::{with_cart_fragment, with_product_fragment};

/// Catalog cache TTL.
const CATALOG_CACHE_TTL: Duration = Duration::from_secs(300);
/// Online-sales setting cache TTL (short; merchants flip this live).
const SALES_CACHE_TTL: Duration = Duration::from_secs(60);

// =============================================================================
// Online-sales configuration
// =============================================================================

/// Shop-wide switch deciding whether purchasing is allowed online.
#[derive(Debug, Clone, Deserialize)]
pub struct OnlineSalesConfig {
    /// Whether online purchasing is enabled.
    pub enabled: bool,
    /// Optional merchant-supplied explanation shown when disabled.
    #[serde(default)]
    pub reason: Option<String>,
}

impl Default for OnlineSalesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            reason: None,
        }
    }
}

impl OnlineSalesConfig {
    /// Parse the shop metafield value.
    ///
    /// Accepts the JSON object form `{"enabled": false, "reason": "..."}`
    /// and the bare boolean string form. An absent or unreadable metafield
    /// means sales are enabled.
    #[must_use]
    pub fn from_metafield(value: Option<&str>) -> Self {
        let Some(raw) = value else {
            return Self::default();
        };
        if let Ok(config) = serde_json::from_str::<Self>(raw) {
            return config;
        }
        match raw.trim() {
            "false" => Self {
                enabled: false,
                reason: None,
            },
            _ => Self::default(),
        }
    }
}

// =============================================================================
// Wire envelopes
// =============================================================================

/// GraphQL response wrapper.
#[derive(Debug, Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQLErrorResponse>>,
}

#[derive(Debug, Deserialize)]
struct GraphQLErrorResponse {
    message: String,
    #[serde(default)]
    locations: Vec<GraphQLErrorLocationResponse>,
    #[serde(default)]
    path: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct GraphQLErrorLocationResponse {
    line: i64,
    column: i64,
}

/// Shared payload of every cart mutation root field.
#[derive(Debug, Deserialize)]
struct CartMutationPayload {
    cart: Option<Cart>,
    #[serde(default, rename = "userErrors")]
    user_errors: Vec<CartUserError>,
}

#[derive(Debug, Deserialize)]
struct GetCartData {
    cart: Option<Cart>,
}

#[derive(Debug, Deserialize)]
struct CartCreateData {
    #[serde(rename = "cartCreate")]
    payload: Option<CartMutationPayload>,
}

#[derive(Debug, Deserialize)]
struct CartLinesAddData {
    #[serde(rename = "cartLinesAdd")]
    payload: Option<CartMutationPayload>,
}

#[derive(Debug, Deserialize)]
struct CartLinesUpdateData {
    #[serde(rename = "cartLinesUpdate")]
    payload: Option<CartMutationPayload>,
}

#[derive(Debug, Deserialize)]
struct CartLinesRemoveData {
    #[serde(rename = "cartLinesRemove")]
    payload: Option<CartMutationPayload>,
}

#[derive(Debug, Deserialize)]
struct CartDiscountCodesUpdateData {
    #[serde(rename = "cartDiscountCodesUpdate")]
    payload: Option<CartMutationPayload>,
}

#[derive(Debug, Deserialize)]
struct CartGiftCardCodesUpdateData {
    #[serde(rename = "cartGiftCardCodesUpdate")]
    payload: Option<CartMutationPayload>,
}

#[derive(Debug, Deserialize)]
struct CartBuyerIdentityUpdateData {
    #[serde(rename = "cartBuyerIdentityUpdate")]
    payload: Option<CartMutationPayload>,
}

#[derive(Debug, Deserialize)]
struct GetProductData {
    product: Option<Product>,
}

#[derive(Debug, Deserialize)]
struct GetCollectionData {
    collection: Option<Collection>,
}

#[derive(Debug, Deserialize)]
struct ShopSettingsData {
    shop: ShopSettings,
}

#[derive(Debug, Deserialize)]
struct ShopSettings {
    #[serde(rename = "onlineSales")]
    online_sales: Option<MetafieldValue>,
}

// =============================================================================
// StorefrontClient
// =============================================================================

/// Client for the Shopify Storefront API.
///
/// Cart operations are exposed through the [`CartService`] trait; catalog
/// and shop-settings reads are inherent methods.
#[derive(Clone)]
pub struct StorefrontClient {
    inner: Arc<StorefrontClientInner>,
}

struct StorefrontClientInner {
    client: reqwest::Client,
    endpoint: String,
    access_token: String,
    catalog_cache: Cache<String, CacheValue>,
    sales_cache: Cache<String, OnlineSalesConfig>,
}

impl StorefrontClient {
    /// Create a new Storefront API client.
    #[must_use]
    pub fn new(config: &ShopifyConfig) -> Self {
        let catalog_cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(CATALOG_CACHE_TTL)
            .build();
        let sales_cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(SALES_CACHE_TTL)
            .build();

        let endpoint = format!(
            "https://{}/api/{}/graphql.json",
            config.store, config.api_version
        );

        Self {
            inner: Arc::new(StorefrontClientInner {
                client: reqwest::Client::new(),
                endpoint,
                access_token: config.storefront_private_token.expose_secret().to_string(),
                catalog_cache,
                sales_cache,
            }),
        }
    }

    /// Execute a GraphQL document.
    async fn execute<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T, ShopifyError> {
        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            // Private access tokens use a different header than public tokens
            .header(
                "Shopify-Storefront-Private-Token",
                &self.inner.access_token,
            )
            .header("Content-Type", "application/json")
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ShopifyError::RateLimited(retry_after));
        }

        // Read the body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %response_text.chars().take(500).collect::<String>(),
                "Shopify API returned non-success status"
            );
            return Err(ShopifyError::graphql(format!(
                "HTTP {status}: {}",
                response_text.chars().take(200).collect::<String>()
            )));
        }

        let response: GraphQLResponse<T> = match serde_json::from_str(&response_text) {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %response_text.chars().take(500).collect::<String>(),
                    "Failed to parse Shopify GraphQL response"
                );
                return Err(ShopifyError::Parse(e));
            }
        };

        if let Some(errors) = response.errors
            && !errors.is_empty()
        {
            tracing::debug!(count = errors.len(), "GraphQL errors in response");
            return Err(ShopifyError::GraphQL(
                errors
                    .into_iter()
                    .map(|e| super::GraphQLError {
                        message: e.message,
                        locations: e
                            .locations
                            .into_iter()
                            .map(|l| super::GraphQLErrorLocation {
                                line: l.line,
                                column: l.column,
                            })
                            .collect(),
                        path: e.path,
                    })
                    .collect(),
            ));
        }

        response.data.ok_or_else(|| {
            tracing::error!(
                body = %response_text.chars().take(500).collect::<String>(),
                "Shopify GraphQL response has no data and no errors"
            );
            ShopifyError::graphql("No data in response")
        })
    }

    /// Unwrap a cart mutation payload, surfacing user errors.
    fn mutation_cart(
        payload: Option<CartMutationPayload>,
        what: &str,
    ) -> Result<Cart, ShopifyError> {
        let Some(result) = payload else {
            return Err(ShopifyError::graphql(format!("Failed to {what}")));
        };
        if !result.user_errors.is_empty() {
            return Err(ShopifyError::UserError(
                result
                    .user_errors
                    .into_iter()
                    .map(|e| e.message)
                    .collect::<Vec<_>>()
                    .join("; "),
            ));
        }
        result
            .cart
            .ok_or_else(|| ShopifyError::graphql(format!("Failed to {what}")))
    }

    // =========================================================================
    // Catalog Methods (cached)
    // =========================================================================

    /// Get a product by its handle.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found or the API request fails.
    #[instrument(skip(self), fields(handle = %handle))]
    pub async fn get_product_by_handle(&self, handle: &str) -> Result<Product, ShopifyError> {
        let cache_key = format!("product:{handle}");

        if let Some(CacheValue::Product(product)) = self.inner.catalog_cache.get(&cache_key).await
        {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let data: GetProductData = self
            .execute(
                &with_product_fragment(queries::GET_PRODUCT_BY_HANDLE),
                json!({ "handle": handle }),
            )
            .await?;

        let product = data
            .product
            .ok_or_else(|| ShopifyError::NotFound(format!("Product not found: {handle}")))?;

        self.inner
            .catalog_cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Get a collection by its handle, with its products.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection is not found or the API request fails.
    #[instrument(skip(self), fields(handle = %handle))]
    pub async fn get_collection_by_handle(
        &self,
        handle: &str,
        product_count: i64,
    ) -> Result<Collection, ShopifyError> {
        let cache_key = format!("collection:{handle}");

        if let Some(CacheValue::Collection(collection)) =
            self.inner.catalog_cache.get(&cache_key).await
        {
            debug!("Cache hit for collection");
            return Ok(*collection);
        }

        let data: GetCollectionData = self
            .execute(
                &with_product_fragment(queries::GET_COLLECTION_BY_HANDLE),
                json!({ "handle": handle, "productCount": product_count }),
            )
            .await?;

        let collection = data
            .collection
            .ok_or_else(|| ShopifyError::NotFound(format!("Collection not found: {handle}")))?;

        self.inner
            .catalog_cache
            .insert(
                cache_key,
                CacheValue::Collection(Box::new(collection.clone())),
            )
            .await;

        Ok(collection)
    }

    /// Read the shop's online-sales switch (60-second cache).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails; an absent metafield is not
    /// an error and means sales are enabled.
    #[instrument(skip(self))]
    pub async fn get_online_sales_config(&self) -> Result<OnlineSalesConfig, ShopifyError> {
        let cache_key = "online_sales".to_string();

        if let Some(config) = self.inner.sales_cache.get(&cache_key).await {
            debug!("Cache hit for online-sales setting");
            return Ok(config);
        }

        let data: ShopSettingsData = self
            .execute(queries::GET_ONLINE_SALES_SETTING, json!({}))
            .await?;

        let config =
            OnlineSalesConfig::from_metafield(data.shop.online_sales.as_ref().map(|m| m.value.as_str()));

        self.inner
            .sales_cache
            .insert(cache_key, config.clone())
            .await;

        Ok(config)
    }
}

// =============================================================================
// CartService implementation (not cached - mutable state)
// =============================================================================

impl CartService for StorefrontClient {
    #[instrument(skip(self), fields(cart_id = %cart_id))]
    async fn get_cart(&self, cart_id: &str) -> Result<Cart, ShopifyError> {
        let data: GetCartData = self
            .execute(
                &with_cart_fragment(queries::GET_CART),
                json!({ "cartId": cart_id }),
            )
            .await?;

        data.cart
            .ok_or_else(|| ShopifyError::NotFound(format!("Cart not found: {cart_id}")))
    }

    #[instrument(skip(self, lines))]
    async fn create_cart(&self, lines: Vec<CartLineInput>) -> Result<Cart, ShopifyError> {
        let data: CartCreateData = self
            .execute(
                &with_cart_fragment(queries::CREATE_CART),
                json!({ "input": { "lines": lines } }),
            )
            .await?;
        Self::mutation_cart(data.payload, "create cart")
    }

    #[instrument(skip(self, lines), fields(cart_id = %cart_id))]
    async fn add_lines(
        &self,
        cart_id: &str,
        lines: Vec<CartLineInput>,
    ) -> Result<Cart, ShopifyError> {
        let data: CartLinesAddData = self
            .execute(
                &with_cart_fragment(queries::ADD_CART_LINES),
                json!({ "cartId": cart_id, "lines": lines }),
            )
            .await?;
        Self::mutation_cart(data.payload, "add to cart")
    }

    #[instrument(skip(self, lines), fields(cart_id = %cart_id))]
    async fn update_lines(
        &self,
        cart_id: &str,
        lines: Vec<CartLineUpdateInput>,
    ) -> Result<Cart, ShopifyError> {
        let data: CartLinesUpdateData = self
            .execute(
                &with_cart_fragment(queries::UPDATE_CART_LINES),
                json!({ "cartId": cart_id, "lines": lines }),
            )
            .await?;
        Self::mutation_cart(data.payload, "update cart")
    }

    #[instrument(skip(self, line_ids), fields(cart_id = %cart_id))]
    async fn remove_lines(
        &self,
        cart_id: &str,
        line_ids: Vec<String>,
    ) -> Result<Cart, ShopifyError> {
        let data: CartLinesRemoveData = self
            .execute(
                &with_cart_fragment(queries::REMOVE_CART_LINES),
                json!({ "cartId": cart_id, "lineIds": line_ids }),
            )
            .await?;
        Self::mutation_cart(data.payload, "remove from cart")
    }

    #[instrument(skip(self, codes), fields(cart_id = %cart_id))]
    async fn update_discount_codes(
        &self,
        cart_id: &str,
        codes: Vec<String>,
    ) -> Result<Cart, ShopifyError> {
        let data: CartDiscountCodesUpdateData = self
            .execute(
                &with_cart_fragment(queries::UPDATE_CART_DISCOUNT_CODES),
                json!({ "cartId": cart_id, "discountCodes": codes }),
            )
            .await?;
        Self::mutation_cart(data.payload, "update discount codes")
    }

    #[instrument(skip(self, codes), fields(cart_id = %cart_id))]
    async fn update_gift_card_codes(
        &self,
        cart_id: &str,
        codes: Vec<String>,
    ) -> Result<Cart, ShopifyError> {
        let data: CartGiftCardCodesUpdateData = self
            .execute(
                &with_cart_fragment(queries::UPDATE_CART_GIFT_CARD_CODES),
                json!({ "cartId": cart_id, "giftCardCodes": codes }),
            )
            .await?;
        Self::mutation_cart(data.payload, "update gift card codes")
    }

    #[instrument(skip(self, identity), fields(cart_id = %cart_id))]
    async fn update_buyer_identity(
        &self,
        cart_id: &str,
        identity: CartBuyerIdentityInput,
    ) -> Result<Cart, ShopifyError> {
        let data: CartBuyerIdentityUpdateData = self
            .execute(
                &with_cart_fragment(queries::UPDATE_CART_BUYER_IDENTITY),
                json!({ "cartId": cart_id, "buyerIdentity": identity }),
            )
            .await?;
        Self::mutation_cart(data.payload, "update buyer identity")
    }
}
