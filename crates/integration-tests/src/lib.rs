//! Integration test harness for the Clovermead storefront.
//!
//! Provides [`FakeCartService`], an in-memory implementation of the platform
//! cart boundary, and [`FakePricer`] for the metafield writer. The fake
//! appends added lines blindly, the way the real platform does for lines
//! with distinct attributes; merge semantics live in the dispatcher under
//! test, not here.

use std::sync::Mutex;

use rust_decimal::Decimal;

use clovermead_core::VariantGid;
use clovermead_storefront::cart::CartService;
use clovermead_storefront::cart::pricing::CustomPricer;
use clovermead_storefront::shopify::ShopifyError;
use clovermead_storefront::shopify::types::{
    Attribute, Cart, CartBuyerIdentity, CartBuyerIdentityInput, CartDiscountCode, CartLine,
    CartLineCost, CartLineInput, CartLineUpdateInput, CartAppliedGiftCard, CartMerchandise,
    CartMerchandiseProduct, Money,
};

/// Cart id issued by the fake platform.
pub const FAKE_CART_ID: &str = "gid://shopify/Cart/fake-cart-token";

/// In-memory stand-in for the platform cart service.
#[derive(Default)]
pub struct FakeCartService {
    state: Mutex<FakeState>,
}

#[derive(Default)]
struct FakeState {
    cart: Option<Cart>,
    next_line_id: u64,
    fail_reads: bool,
    fail_creates: bool,
    mutations: u32,
}

impl FakeCartService {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every read fail with a simulated outage.
    pub fn fail_reads(&self) {
        self.lock().fail_reads = true;
    }

    /// Make every cart creation fail with a simulated outage.
    pub fn fail_creates(&self) {
        self.lock().fail_creates = true;
    }

    /// How many mutations the platform has accepted.
    #[must_use]
    pub fn mutation_count(&self) -> u32 {
        self.lock().mutations
    }

    /// Snapshot of the platform-side cart, if one exists.
    #[must_use]
    pub fn cart(&self) -> Option<Cart> {
        self.lock().cart.clone()
    }

    /// Seed the platform with an existing cart.
    pub fn seed_cart(&self, cart: Cart) {
        self.lock().cart = Some(cart);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

fn outage() -> ShopifyError {
    ShopifyError::graphql("simulated platform outage")
}

fn money(amount: &str) -> Money {
    Money {
        amount: amount.to_string(),
        currency_code: "USD".to_string(),
    }
}

/// Merchandise record the fake derives from a variant gid.
#[must_use]
pub fn merchandise(merchandise_id: &str) -> CartMerchandise {
    CartMerchandise {
        id: merchandise_id.to_string(),
        title: "Default Title".to_string(),
        available_for_sale: true,
        quantity_available: Some(50),
        price: money("5.00"),
        compare_at_price: None,
        selected_options: Vec::new(),
        image: None,
        product: CartMerchandiseProduct {
            id: "gid://shopify/Product/1".to_string(),
            handle: "test-product".to_string(),
            title: "Test Product".to_string(),
            featured_image: None,
        },
    }
}

/// A bare platform cart with the fake's id.
#[must_use]
pub fn empty_platform_cart() -> Cart {
    let mut cart = Cart::empty();
    cart.id = FAKE_CART_ID.to_string();
    cart.checkout_url = "https://checkout.example/fake".to_string();
    cart
}

impl FakeState {
    fn require_cart(&mut self, cart_id: &str) -> Result<&mut Cart, ShopifyError> {
        match self.cart.as_mut() {
            Some(cart) if cart.id == cart_id => Ok(cart),
            _ => Err(ShopifyError::NotFound(format!("Cart not found: {cart_id}"))),
        }
    }

    fn append_lines(&mut self, lines: Vec<CartLineInput>) {
        for input in lines {
            self.next_line_id += 1;
            let line = CartLine {
                id: format!("gid://shopify/CartLine/{}", self.next_line_id),
                quantity: input.quantity,
                attributes: input
                    .attributes
                    .unwrap_or_default()
                    .into_iter()
                    .map(|a| Attribute {
                        key: a.key,
                        value: Some(a.value),
                    })
                    .collect(),
                cost: CartLineCost {
                    amount_per_quantity: money("5.00"),
                    compare_at_amount_per_quantity: None,
                    subtotal_amount: money("5.00"),
                    total_amount: money("5.00"),
                },
                merchandise: Some(merchandise(&input.merchandise_id)),
            };
            if let Some(cart) = &mut self.cart {
                cart.lines.nodes.push(line);
            }
        }
    }

    fn settle(&mut self) -> Cart {
        self.mutations += 1;
        if let Some(cart) = &mut self.cart {
            cart.total_quantity = cart.lines.nodes.iter().map(|l| l.quantity).sum();
            cart.clone()
        } else {
            Cart::empty()
        }
    }
}

impl CartService for FakeCartService {
    async fn get_cart(&self, cart_id: &str) -> Result<Cart, ShopifyError> {
        let mut state = self.lock();
        if state.fail_reads {
            return Err(outage());
        }
        state.require_cart(cart_id).map(|cart| cart.clone())
    }

    async fn create_cart(&self, lines: Vec<CartLineInput>) -> Result<Cart, ShopifyError> {
        let mut state = self.lock();
        if state.fail_creates {
            return Err(outage());
        }
        state.cart = Some(empty_platform_cart());
        state.append_lines(lines);
        Ok(state.settle())
    }

    async fn add_lines(
        &self,
        cart_id: &str,
        lines: Vec<CartLineInput>,
    ) -> Result<Cart, ShopifyError> {
        let mut state = self.lock();
        state.require_cart(cart_id)?;
        state.append_lines(lines);
        Ok(state.settle())
    }

    async fn update_lines(
        &self,
        cart_id: &str,
        lines: Vec<CartLineUpdateInput>,
    ) -> Result<Cart, ShopifyError> {
        let mut state = self.lock();
        let cart = state.require_cart(cart_id)?;
        for update in lines {
            let Some(line) = cart.lines.nodes.iter_mut().find(|l| l.id == update.id) else {
                return Err(ShopifyError::UserError(format!(
                    "The merchandise line with id {} does not exist.",
                    update.id
                )));
            };
            if let Some(merchandise_id) = update.merchandise_id {
                line.merchandise = Some(merchandise(&merchandise_id));
            }
            match update.quantity {
                // Quantity zero removes the line (platform semantics).
                Some(0) => {
                    let id = update.id.clone();
                    cart.lines.nodes.retain(|l| l.id != id);
                }
                Some(quantity) => {
                    if let Some(line) = cart.lines.nodes.iter_mut().find(|l| l.id == update.id) {
                        line.quantity = quantity;
                    }
                }
                None => {}
            }
        }
        Ok(state.settle())
    }

    async fn remove_lines(
        &self,
        cart_id: &str,
        line_ids: Vec<String>,
    ) -> Result<Cart, ShopifyError> {
        let mut state = self.lock();
        let cart = state.require_cart(cart_id)?;
        cart.lines.nodes.retain(|l| !line_ids.contains(&l.id));
        Ok(state.settle())
    }

    async fn update_discount_codes(
        &self,
        cart_id: &str,
        codes: Vec<String>,
    ) -> Result<Cart, ShopifyError> {
        let mut state = self.lock();
        let cart = state.require_cart(cart_id)?;
        cart.discount_codes = codes
            .into_iter()
            .map(|code| CartDiscountCode {
                code,
                applicable: true,
            })
            .collect();
        Ok(state.settle())
    }

    async fn update_gift_card_codes(
        &self,
        cart_id: &str,
        codes: Vec<String>,
    ) -> Result<Cart, ShopifyError> {
        let mut state = self.lock();
        let cart = state.require_cart(cart_id)?;
        cart.applied_gift_cards = codes
            .into_iter()
            .enumerate()
            .map(|(i, code)| CartAppliedGiftCard {
                id: format!("gid://shopify/AppliedGiftCard/{i}"),
                last_characters: {
                    let tail: Vec<char> = code.chars().rev().take(4).collect();
                    tail.into_iter().rev().collect()
                },
                amount_used: money("0.0"),
            })
            .collect();
        Ok(state.settle())
    }

    async fn update_buyer_identity(
        &self,
        cart_id: &str,
        identity: CartBuyerIdentityInput,
    ) -> Result<Cart, ShopifyError> {
        let mut state = self.lock();
        let cart = state.require_cart(cart_id)?;
        cart.buyer_identity = Some(CartBuyerIdentity {
            email: identity.email,
            phone: identity.phone,
            country_code: identity.country_code,
            customer: None,
        });
        Ok(state.settle())
    }
}

/// In-memory stand-in for the variant metafield writer.
#[derive(Default)]
pub struct FakePricer {
    applied: Mutex<Vec<(String, Decimal)>>,
    fail_variants: Mutex<Vec<String>>,
}

impl FakePricer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make writes for one variant fail.
    pub fn fail_for(&self, variant_gid: &str) {
        self.fail_variants
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(variant_gid.to_string());
    }

    /// The successful writes, in order.
    #[must_use]
    pub fn applied(&self) -> Vec<(String, Decimal)> {
        self.applied
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

impl CustomPricer for FakePricer {
    async fn apply_custom_price(
        &self,
        variant_id: &VariantGid,
        price: Decimal,
    ) -> Result<(), ShopifyError> {
        let failing = self
            .fail_variants
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .contains(&variant_id.as_str().to_string());
        if failing {
            return Err(ShopifyError::UserError("metafield write refused".to_string()));
        }
        self.applied
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push((variant_id.as_str().to_string(), price));
        Ok(())
    }
}
