//! Online-sales gate for buy actions.
//!
//! A pure function of the shop-wide online-sales switch and per-variant
//! stock. The storefront renders every buy button through this; the cart
//! action handler consults the same switch before accepting add intents.

use serde::Serialize;

/// Reason text when the store is in-store-only.
pub const IN_STORE_ONLY_REASON: &str = "This item can only be purchased in store.";

/// Derived state for a buy action button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ButtonState {
    /// Whether the action is disabled.
    pub disabled: bool,
    /// Button label to render.
    pub label: String,
    /// Explanation when disabled for policy reasons.
    pub reason: Option<String>,
}

/// Compute the buy-button state.
///
/// Priority: a disabled online-sales switch wins over stock; stock wins over
/// the caller's default label. No side effects.
#[must_use]
pub fn compute_button_state(sales_enabled: bool, in_stock: bool, default_label: &str) -> ButtonState {
    if !sales_enabled {
        return ButtonState {
            disabled: true,
            label: "Unavailable Online".to_string(),
            reason: Some(IN_STORE_ONLY_REASON.to_string()),
        };
    }
    if !in_stock {
        return ButtonState {
            disabled: true,
            label: "Out of Stock".to_string(),
            reason: None,
        };
    }
    ButtonState {
        disabled: false,
        label: default_label.to_string(),
        reason: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_sales_wins_regardless_of_stock() {
        for in_stock in [true, false] {
            let state = compute_button_state(false, in_stock, "Add to Cart");
            assert!(state.disabled);
            assert_eq!(state.label, "Unavailable Online");
            assert_eq!(state.reason.as_deref(), Some(IN_STORE_ONLY_REASON));
        }
    }

    #[test]
    fn out_of_stock_disables_with_stock_label() {
        let state = compute_button_state(true, false, "Add to Cart");
        assert!(state.disabled);
        assert_eq!(state.label, "Out of Stock");
        assert!(state.reason.is_none());
    }

    #[test]
    fn enabled_and_stocked_uses_caller_label() {
        let state = compute_button_state(true, true, "Buy Now");
        assert!(!state.disabled);
        assert_eq!(state.label, "Buy Now");
        assert!(state.reason.is_none());
    }
}
