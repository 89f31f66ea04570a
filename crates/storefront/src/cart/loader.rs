//! Self-healing cart reader for the cart surface.
//!
//! The cart page must always render. This reader tries the session cart,
//! falls back to creating an empty cart, and as a last resort synthesizes a
//! zero-value cart shape. It never mutates existing platform state beyond
//! the lazy empty-cart creation and never propagates a read failure.

use tracing::{debug, warn};

use crate::shopify::ShopifyError;
use crate::shopify::types::Cart;

use super::CartService;

/// Produce a render-ready cart snapshot.
///
/// The result always has a lines array and a numeric total quantity, so the
/// page layer can render unconditionally.
pub async fn load_cart<S: CartService>(service: &S, cart_id: Option<&str>) -> Cart {
    let cart = match fetch_or_create(service, cart_id).await {
        Some(cart) => cart,
        None => Cart::empty(),
    };
    sanitize_cart(cart)
}

async fn fetch_or_create<S: CartService>(service: &S, cart_id: Option<&str>) -> Option<Cart> {
    if let Some(id) = cart_id {
        match service.get_cart(id).await {
            Ok(cart) => return Some(cart),
            Err(ShopifyError::NotFound(_)) => {
                debug!(cart_id = %id, "session cart not found; creating a fresh one");
            }
            Err(e) => {
                warn!(cart_id = %id, error = %e, "cart read failed; attempting to create a fresh cart");
            }
        }
    }

    match service.create_cart(Vec::new()).await {
        Ok(cart) => Some(cart),
        Err(e) => {
            warn!(error = %e, "cart create failed; serving a synthesized empty cart");
            None
        }
    }
}

/// Drop structurally invalid lines and restore the quantity invariant.
///
/// The platform should never return a line without merchandise or with a
/// non-positive quantity; when it does, the inconsistency is recoverable
/// here rather than fatal to the page.
#[must_use]
pub fn sanitize_cart(mut cart: Cart) -> Cart {
    cart.lines.nodes.retain(|line| {
        if line.merchandise.is_none() {
            warn!(line = %line.id, "dropping cart line without merchandise");
            return false;
        }
        if line.quantity <= 0 {
            warn!(line = %line.id, quantity = line.quantity, "dropping cart line with non-positive quantity");
            return false;
        }
        true
    });
    cart.total_quantity = cart.lines.nodes.iter().map(|l| l.quantity).sum();
    cart
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shopify::types::{
        CartLine, CartLineCost, CartLineConnection, CartMerchandise, CartMerchandiseProduct, Money,
    };

    fn money(amount: &str) -> Money {
        Money {
            amount: amount.to_string(),
            currency_code: "USD".to_string(),
        }
    }

    fn line(id: &str, quantity: i64, with_merchandise: bool) -> CartLine {
        CartLine {
            id: id.to_string(),
            quantity,
            attributes: Vec::new(),
            cost: CartLineCost {
                amount_per_quantity: money("5.00"),
                compare_at_amount_per_quantity: None,
                subtotal_amount: money("5.00"),
                total_amount: money("5.00"),
            },
            merchandise: with_merchandise.then(|| CartMerchandise {
                id: "gid://shopify/ProductVariant/1".to_string(),
                title: "Default Title".to_string(),
                available_for_sale: true,
                quantity_available: None,
                price: money("5.00"),
                compare_at_price: None,
                selected_options: Vec::new(),
                image: None,
                product: CartMerchandiseProduct {
                    id: "gid://shopify/Product/1".to_string(),
                    handle: "honey".to_string(),
                    title: "Honey".to_string(),
                    featured_image: None,
                },
            }),
        }
    }

    #[test]
    fn sanitize_drops_invalid_lines_and_recomputes_total() {
        let mut cart = Cart::empty();
        cart.lines = CartLineConnection {
            nodes: vec![
                line("a", 2, true),
                line("b", 0, true),
                line("c", 3, false),
                line("d", -1, true),
            ],
        };
        cart.total_quantity = 99;

        let cart = sanitize_cart(cart);
        assert_eq!(cart.lines.nodes.len(), 1);
        assert_eq!(cart.lines.nodes[0].id, "a");
        assert_eq!(cart.total_quantity, 2);
    }

    #[test]
    fn empty_cart_shape_is_render_ready() {
        let cart = sanitize_cart(Cart::empty());
        assert!(cart.lines.nodes.is_empty());
        assert_eq!(cart.total_quantity, 0);
        assert_eq!(cart.cost.subtotal_amount.amount, "0.0");
    }
}
