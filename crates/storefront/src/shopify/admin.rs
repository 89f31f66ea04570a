//! Shopify Admin API client for variant metafield writes.
//!
//! The storefront needs exactly one Admin capability: persisting a custom
//! bundle price on a product variant's metafield so later reads can surface
//! it. The client authenticates with a custom-app access token.

use std::sync::Arc;

use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::instrument;

use clovermead_core::VariantGid;

use crate::cart::pricing::CustomPricer;
use crate::config::ShopifyConfig;

use super::ShopifyError;

/// Metafield namespace for storefront-owned data.
const METAFIELD_NAMESPACE: &str = "clovermead";
/// Metafield key for the custom bundle price.
const CUSTOM_PRICE_KEY: &str = "custom_price";

const SET_METAFIELDS: &str = "\
mutation SetVariantMetafields($metafields: [MetafieldsSetInput!]!) {
  metafieldsSet(metafields: $metafields) {
    metafields { id }
    userErrors { field message }
  }
}";

/// GraphQL response wrapper.
#[derive(Debug, Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQLErrorResponse>>,
}

#[derive(Debug, Deserialize)]
struct GraphQLErrorResponse {
    message: String,
}

#[derive(Debug, Deserialize)]
struct MetafieldsSetData {
    #[serde(rename = "metafieldsSet")]
    payload: Option<MetafieldsSetPayload>,
}

#[derive(Debug, Deserialize)]
struct MetafieldsSetPayload {
    #[serde(default, rename = "userErrors")]
    user_errors: Vec<MetafieldUserError>,
}

#[derive(Debug, Deserialize)]
struct MetafieldUserError {
    message: String,
}

/// Shopify Admin API client.
///
/// # Security
///
/// The admin token has write access to the store; the scope requested for it
/// should be limited to product metafields.
#[derive(Clone)]
pub struct AdminClient {
    inner: Arc<AdminClientInner>,
}

struct AdminClientInner {
    client: reqwest::Client,
    endpoint: String,
    access_token: String,
}

impl AdminClient {
    /// Create a new Admin API client.
    #[must_use]
    pub fn new(config: &ShopifyConfig) -> Self {
        let endpoint = format!(
            "https://{}/admin/api/{}/graphql.json",
            config.store, config.api_version
        );

        Self {
            inner: Arc::new(AdminClientInner {
                client: reqwest::Client::new(),
                endpoint,
                access_token: config.admin_access_token.expose_secret().to_string(),
            }),
        }
    }

    /// Execute a GraphQL document against the Admin API.
    async fn execute<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T, ShopifyError> {
        let response = self
            .inner
            .client
            .post(&self.inner.endpoint)
            .header("X-Shopify-Access-Token", &self.inner.access_token)
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

        let response_text = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %response_text.chars().take(500).collect::<String>(),
                "Shopify Admin API returned non-success status"
            );
            return Err(ShopifyError::graphql(format!(
                "HTTP {status}: {}",
                response_text.chars().take(200).collect::<String>()
            )));
        }

        let response: GraphQLResponse<T> =
            serde_json::from_str(&response_text).map_err(ShopifyError::Parse)?;

        if let Some(errors) = response.errors
            && !errors.is_empty()
        {
            return Err(ShopifyError::GraphQL(
                errors
                    .into_iter()
                    .map(|e| super::GraphQLError {
                        message: e.message,
                        locations: vec![],
                        path: vec![],
                    })
                    .collect(),
            ));
        }

        response
            .data
            .ok_or_else(|| ShopifyError::graphql("No data in response"))
    }
}

impl CustomPricer for AdminClient {
    /// Write the custom price metafield on a variant.
    #[instrument(skip(self), fields(variant = %variant_id))]
    async fn apply_custom_price(
        &self,
        variant_id: &VariantGid,
        price: Decimal,
    ) -> Result<(), ShopifyError> {
        let data: MetafieldsSetData = self
            .execute(
                SET_METAFIELDS,
                json!({
                    "metafields": [{
                        "ownerId": variant_id.as_str(),
                        "namespace": METAFIELD_NAMESPACE,
                        "key": CUSTOM_PRICE_KEY,
                        "type": "number_decimal",
                        "value": price.to_string(),
                    }]
                }),
            )
            .await?;

        let Some(payload) = data.payload else {
            return Err(ShopifyError::graphql("Failed to set variant metafield"));
        };
        if !payload.user_errors.is_empty() {
            return Err(ShopifyError::UserError(
                payload
                    .user_errors
                    .into_iter()
                    .map(|e| e.message)
                    .collect::<Vec<_>>()
                    .join("; "),
            ));
        }
        Ok(())
    }
}
