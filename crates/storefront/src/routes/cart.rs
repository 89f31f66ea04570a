//! Cart route handlers.
//!
//! `GET /cart` serves the self-healed snapshot; `POST /cart` is the cart
//! action endpoint, accepting JSON bodies and several legacy form encodings
//! (see [`crate::cart::intent`]). The Shopify cart id lives in the session.

use axum::{
    Json,
    extract::{FromRequest, Multipart, Request, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use tower_sessions::Session;
use tracing::instrument;

use crate::cart::{self, CartActionError, gate, loader};
use crate::cart::intent::{self, CartIntent, ParsedRequest};
use crate::models::session_keys;
use crate::shopify::ShopifyError;
use crate::shopify::types::{
    Attribute, Cart, CartAppliedGiftCard, CartBuyerIdentity, CartCost, CartDiscountCode,
    CartLineConnection, CartUserError,
};
use crate::state::AppState;

/// Maximum accepted action body size.
const BODY_LIMIT: usize = 256 * 1024;

// =============================================================================
// Public projection
// =============================================================================

/// The cart's public projection returned to clients.
///
/// Internal fields (timestamps, note) are stripped; structurally invalid
/// lines are filtered the same way the loader filters them.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartProjection {
    pub id: String,
    pub checkout_url: String,
    pub total_quantity: i64,
    pub cost: CartCost,
    pub lines: CartLineConnection,
    pub attributes: Vec<Attribute>,
    pub discount_codes: Vec<CartDiscountCode>,
    pub applied_gift_cards: Vec<CartAppliedGiftCard>,
    pub buyer_identity: Option<CartBuyerIdentity>,
}

impl From<&Cart> for CartProjection {
    fn from(cart: &Cart) -> Self {
        Self {
            id: cart.id.clone(),
            checkout_url: cart.checkout_url.clone(),
            total_quantity: cart.total_quantity,
            cost: cart.cost.clone(),
            lines: cart.lines.clone(),
            attributes: cart.attributes.clone(),
            discount_codes: cart.discount_codes.clone(),
            applied_gift_cards: cart.applied_gift_cards.clone(),
            buyer_identity: cart.buyer_identity.clone(),
        }
    }
}

/// Envelope for cart action responses.
#[derive(Debug, Serialize)]
pub struct CartActionResponse {
    pub cart: CartProjection,
    pub errors: Vec<CartUserError>,
    pub warnings: Vec<String>,
    pub analytics: CartAnalytics,
}

/// Analytics payload attached to cart action responses.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartAnalytics {
    pub cart_id: String,
}

// =============================================================================
// Session Helpers
// =============================================================================

/// Get the cart ID from the session.
pub(crate) async fn get_cart_id(session: &Session) -> Option<String> {
    session
        .get::<String>(session_keys::CART_ID)
        .await
        .ok()
        .flatten()
}

/// Set the cart ID in the session.
pub(crate) async fn set_cart_id(
    session: &Session,
    cart_id: &str,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CART_ID, cart_id).await
}

// =============================================================================
// Handlers
// =============================================================================

/// Serve the cart snapshot (always 200; self-healing read).
#[instrument(skip(state, session))]
pub async fn show(State(state): State<AppState>, session: Session) -> Json<CartProjection> {
    let cart_id = get_cart_id(&session).await;
    let cart = loader::load_cart(state.storefront(), cart_id.as_deref()).await;

    // A fresh cart may have been created by the loader; remember it.
    if !cart.id.is_empty()
        && cart_id.as_deref() != Some(cart.id.as_str())
        && let Err(e) = set_cart_id(&session, &cart.id).await
    {
        tracing::error!("Failed to save cart ID to session: {e}");
    }

    Json(CartProjection::from(&cart))
}

/// Handle one cart mutation request.
#[instrument(skip(state, session, request))]
pub async fn action(
    State(state): State<AppState>,
    session: Session,
    request: Request,
) -> Response {
    let parsed = match extract_request(request).await {
        Ok(parsed) => parsed,
        Err(e) => return error_response(&state, &session, e).await,
    };
    let ParsedRequest { intent, redirect_to } = parsed;
    tracing::debug!(intent = ?intent_tag(&intent), "cart action parsed");

    // Online-sales gating: adds are refused while purchasing is in-store
    // only. The check fails open so a settings outage cannot block carts.
    if intent.is_add() {
        match state.storefront().get_online_sales_config().await {
            Ok(config) if !config.enabled => {
                let reason = config
                    .reason
                    .unwrap_or_else(|| gate::IN_STORE_ONLY_REASON.to_string());
                return (StatusCode::BAD_REQUEST, Json(json!({ "error": reason })))
                    .into_response();
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, "online-sales check failed; allowing add");
            }
        }
    }

    // Gift cards come back masked from the platform, so the full applied set
    // is tracked in the session and merged here before forwarding.
    let mut gift_card_codes_to_store = None;
    let intent = match intent {
        CartIntent::UpdateGiftCardCodes { codes } => {
            let applied: Vec<String> = session
                .get(session_keys::GIFT_CARD_CODES)
                .await
                .ok()
                .flatten()
                .unwrap_or_default();
            let merged = cart::merge_codes(applied.into_iter(), codes);
            gift_card_codes_to_store = Some(merged.clone());
            CartIntent::UpdateGiftCardCodes { codes: merged }
        }
        other => other,
    };

    let cart_id = get_cart_id(&session).await;
    match cart::dispatch(state.storefront(), state.admin(), cart_id.as_deref(), intent).await {
        Ok(cart) => {
            if let Err(e) = set_cart_id(&session, &cart.id).await {
                tracing::error!("Failed to save cart ID to session: {e}");
            }
            if let Some(codes) = gift_card_codes_to_store
                && let Err(e) = session.insert(session_keys::GIFT_CARD_CODES, codes).await
            {
                tracing::error!("Failed to save gift card codes to session: {e}");
            }
            success_response(cart, redirect_to)
        }
        Err(e) => error_response(&state, &session, e).await,
    }
}

/// Build the success response, honoring a local redirect target.
pub(crate) fn success_response(cart: Cart, redirect_to: Option<String>) -> Response {
    let cart = loader::sanitize_cart(cart);
    let body = CartActionResponse {
        analytics: CartAnalytics {
            cart_id: cart.id.clone(),
        },
        cart: CartProjection::from(&cart),
        errors: Vec::new(),
        warnings: Vec::new(),
    };

    match redirect_to.filter(|target| is_local_path(target)) {
        Some(target) => (
            StatusCode::SEE_OTHER,
            [(header::LOCATION, target)],
            Json(body),
        )
            .into_response(),
        None => Json(body).into_response(),
    }
}

/// Map a cart action failure onto the endpoint's error contract.
///
/// Parse-stage failures are 400s. Platform failures are 500s carrying a
/// best-effort recovery snapshot so the client can resynchronize without a
/// full reload.
pub(crate) async fn error_response(
    state: &AppState,
    session: &Session,
    error: CartActionError,
) -> Response {
    match error {
        CartActionError::InvalidRequest
        | CartActionError::InvalidLineItems
        | CartActionError::UnsupportedAction(_) => {
            tracing::debug!(error = %error, "rejecting cart action");
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": error.to_string() })),
            )
                .into_response()
        }
        CartActionError::Platform(ShopifyError::UserError(message)) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": message })),
        )
            .into_response(),
        CartActionError::Platform(e) => {
            let event_id = sentry::capture_error(&e);
            tracing::error!(error = %e, sentry_event_id = %event_id, "cart mutation failed");

            let cart_id = get_cart_id(session).await;
            let snapshot = loader::load_cart(state.storefront(), cart_id.as_deref()).await;
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": "cart mutation failed",
                    "message": e.to_string(),
                    "cart": CartProjection::from(&snapshot),
                })),
            )
                .into_response()
        }
    }
}

// =============================================================================
// Request extraction
// =============================================================================

/// Decode the body per content type and run the parsing cascade.
async fn extract_request(request: Request) -> Result<ParsedRequest, CartActionError> {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_ascii_lowercase();

    if content_type.starts_with("application/json") {
        let bytes = axum::body::to_bytes(request.into_body(), BODY_LIMIT)
            .await
            .map_err(|_| CartActionError::InvalidRequest)?;
        let body: serde_json::Value =
            serde_json::from_slice(&bytes).map_err(|_| CartActionError::InvalidRequest)?;
        return intent::parse_json_request(&body);
    }

    if content_type.starts_with("multipart/form-data") {
        let mut multipart = Multipart::from_request(request, &())
            .await
            .map_err(|_| CartActionError::InvalidRequest)?;
        let mut fields = Vec::new();
        while let Ok(Some(field)) = multipart.next_field().await {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            let Ok(text) = field.text().await else {
                continue;
            };
            fields.push((name, text));
        }
        return intent::parse_form_request(&fields);
    }

    // application/x-www-form-urlencoded (and permissive default)
    let bytes = axum::body::to_bytes(request.into_body(), BODY_LIMIT)
        .await
        .map_err(|_| CartActionError::InvalidRequest)?;
    let fields: Vec<(String, String)> = url::form_urlencoded::parse(&bytes)
        .into_owned()
        .collect();
    intent::parse_form_request(&fields)
}

/// Redirect targets must be local paths; anything else is dropped.
fn is_local_path(target: &str) -> bool {
    target.starts_with('/') && !target.starts_with("//")
}

/// Short tag for logging without dumping the whole intent.
const fn intent_tag(intent: &CartIntent) -> &'static str {
    match intent {
        CartIntent::AddLines { .. } => "lines_add",
        CartIntent::AddMegaSaverItem(_) => "mega_saver_add",
        CartIntent::UpdateLines { .. } => "lines_update",
        CartIntent::RemoveLines { .. } => "lines_remove",
        CartIntent::UpdateDiscountCodes { .. } => "discount_codes_update",
        CartIntent::UpdateGiftCardCodes { .. } => "gift_card_codes_update",
        CartIntent::UpdateBuyerIdentity { .. } => "buyer_identity_update",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_paths_only_for_redirects() {
        assert!(is_local_path("/cart"));
        assert!(is_local_path("/checkout?step=1"));
        assert!(!is_local_path("//evil.example"));
        assert!(!is_local_path("https://evil.example"));
        assert!(!is_local_path(""));
    }

    #[test]
    fn projection_strips_internal_fields() {
        let mut cart = Cart::empty();
        cart.id = "gid://shopify/Cart/abc".to_string();
        cart.note = Some("internal note".to_string());
        cart.created_at = "2026-01-01T00:00:00Z".to_string();

        let projection = CartProjection::from(&cart);
        let value = serde_json::to_value(&projection).expect("serializes");
        assert!(value.get("note").is_none());
        assert!(value.get("createdAt").is_none());
        assert_eq!(value["id"], "gid://shopify/Cart/abc");
        assert!(value["lines"]["nodes"].is_array());
        assert!(value["totalQuantity"].is_number());
    }
}
