//! Session-related types.

/// Session keys for cart state.
pub mod session_keys {
    /// Key for storing the Shopify cart ID.
    pub const CART_ID: &str = "cart_id";

    /// Key for the gift card codes applied so far.
    ///
    /// The platform only ever returns masked gift card codes, so the session
    /// keeps the full set to merge new submissions into.
    pub const GIFT_CARD_CODES: &str = "gift_card_codes";
}
