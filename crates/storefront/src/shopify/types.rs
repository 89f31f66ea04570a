//! Domain types for the Shopify Storefront API.
//!
//! These types double as the wire shape: every GraphQL document in
//! [`super::storefront::queries`] selects fields to match them, so responses
//! deserialize straight into the domain layer (camelCase on the wire).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// Money Types
// =============================================================================

/// Monetary amount with currency code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Money {
    /// Decimal amount as string (preserves precision).
    pub amount: String,
    /// ISO 4217 currency code.
    pub currency_code: String,
}

impl Money {
    /// A zero amount in the given currency.
    #[must_use]
    pub fn zero(currency_code: &str) -> Self {
        Self {
            amount: "0.0".to_string(),
            currency_code: currency_code.to_string(),
        }
    }

    /// Parse the amount into a decimal, if well-formed.
    #[must_use]
    pub fn decimal(&self) -> Option<Decimal> {
        self.amount.parse().ok()
    }
}

// =============================================================================
// Image Types
// =============================================================================

/// Product or collection image.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    /// Image URL.
    pub url: String,
    /// Alt text for accessibility.
    pub alt_text: Option<String>,
    /// Image width in pixels.
    pub width: Option<i64>,
    /// Image height in pixels.
    pub height: Option<i64>,
}

// =============================================================================
// Product Types
// =============================================================================

/// Selected option on a product variant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedOption {
    /// Option name (e.g., "Size").
    pub name: String,
    /// Selected value (e.g., "Large").
    pub value: String,
}

/// A product variant (specific combination of options).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariant {
    /// Variant ID (canonical gid).
    pub id: String,
    /// Variant title (combination of option values).
    pub title: String,
    /// Whether this variant is available for sale.
    pub available_for_sale: bool,
    /// Quantity available; `None` means inventory is not tracked (unbounded).
    pub quantity_available: Option<i64>,
    /// Current price.
    pub price: Money,
    /// Compare-at price (original price if on sale).
    pub compare_at_price: Option<Money>,
    /// Variant image.
    pub image: Option<Image>,
}

/// Paginated variants on a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductVariantConnection {
    /// Variants in this page.
    #[serde(default)]
    pub nodes: Vec<ProductVariant>,
}

/// A metafield value attached to a resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetafieldValue {
    /// Raw string value.
    pub value: String,
}

/// A product in the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Product ID.
    pub id: String,
    /// URL handle.
    pub handle: String,
    /// Product title.
    pub title: String,
    /// Plain text description.
    #[serde(default)]
    pub description: String,
    /// Whether any variant is available.
    pub available_for_sale: bool,
    /// Featured image.
    pub featured_image: Option<Image>,
    /// Product variants.
    pub variants: ProductVariantConnection,
    /// Hamper bundle price metafield, when the product belongs to a hamper.
    #[serde(default)]
    pub bundle_price: Option<MetafieldValue>,
}

impl Product {
    /// The default (first) variant, per storefront convention.
    #[must_use]
    pub fn default_variant(&self) -> Option<&ProductVariant> {
        self.variants.nodes.first()
    }
}

/// Paginated products.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductConnection {
    /// Products in this page.
    #[serde(default)]
    pub nodes: Vec<Product>,
}

// =============================================================================
// Collection Types
// =============================================================================

/// A collection of products (hampers are curated collections).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    /// Collection ID.
    pub id: String,
    /// URL handle.
    pub handle: String,
    /// Collection title.
    pub title: String,
    /// Plain text description.
    #[serde(default)]
    pub description: String,
    /// Collection image.
    pub image: Option<Image>,
    /// Products in this collection.
    pub products: ProductConnection,
}

// =============================================================================
// Cart Types
// =============================================================================

/// Custom attribute (key-value pair).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    /// Attribute key.
    pub key: String,
    /// Attribute value.
    pub value: Option<String>,
}

/// Input for custom attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeInput {
    /// Attribute key.
    pub key: String,
    /// Attribute value.
    pub value: String,
}

/// Simplified product info for cart merchandise.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartMerchandiseProduct {
    /// Product ID.
    pub id: String,
    /// Product handle.
    pub handle: String,
    /// Product title.
    pub title: String,
    /// Featured image.
    pub featured_image: Option<Image>,
}

/// Merchandise in a cart line (simplified product variant info).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartMerchandise {
    /// Variant ID.
    pub id: String,
    /// Variant title.
    pub title: String,
    /// Whether available for sale.
    pub available_for_sale: bool,
    /// Quantity available; `None` means inventory is not tracked (unbounded).
    pub quantity_available: Option<i64>,
    /// Current price per unit.
    pub price: Money,
    /// Compare-at price.
    pub compare_at_price: Option<Money>,
    /// Selected options.
    #[serde(default)]
    pub selected_options: Vec<SelectedOption>,
    /// Variant image.
    pub image: Option<Image>,
    /// Parent product info.
    pub product: CartMerchandiseProduct,
}

/// Cost for a cart line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineCost {
    /// Price per unit.
    pub amount_per_quantity: Money,
    /// Compare-at price per unit.
    pub compare_at_amount_per_quantity: Option<Money>,
    /// Subtotal (before discounts).
    pub subtotal_amount: Money,
    /// Total (after discounts).
    pub total_amount: Money,
}

/// A line item in the cart.
///
/// `merchandise` is optional defensively: the platform should never return a
/// line without one, but the reader treats that as recoverable, not fatal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Cart line ID (stable across quantity updates).
    pub id: String,
    /// Quantity.
    pub quantity: i64,
    /// Custom attributes (bundle membership and display metadata).
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    /// Line cost.
    pub cost: CartLineCost,
    /// Product variant.
    pub merchandise: Option<CartMerchandise>,
}

/// Paginated cart lines.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CartLineConnection {
    /// Lines in this page.
    #[serde(default)]
    pub nodes: Vec<CartLine>,
}

/// Cart cost summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartCost {
    /// Subtotal before tax/shipping.
    pub subtotal_amount: Money,
    /// Total amount.
    pub total_amount: Money,
    /// Total tax amount.
    pub total_tax_amount: Option<Money>,
    /// Total duty amount.
    pub total_duty_amount: Option<Money>,
}

impl CartCost {
    /// A zero cost summary in the given currency.
    #[must_use]
    pub fn zero(currency_code: &str) -> Self {
        Self {
            subtotal_amount: Money::zero(currency_code),
            total_amount: Money::zero(currency_code),
            total_tax_amount: None,
            total_duty_amount: None,
        }
    }
}

/// Discount code applied to cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartDiscountCode {
    /// The discount code.
    pub code: String,
    /// Whether the code is applicable.
    pub applicable: bool,
}

/// Gift card applied to cart. Only the masked tail of the code is exposed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartAppliedGiftCard {
    /// Gift card ID.
    pub id: String,
    /// Last characters of the code (masked).
    pub last_characters: String,
    /// Amount drawn from the gift card.
    pub amount_used: Money,
}

/// Customer info in buyer identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartCustomer {
    /// Customer ID.
    pub id: String,
    /// Email.
    pub email: Option<String>,
    /// First name.
    pub first_name: Option<String>,
    /// Last name.
    pub last_name: Option<String>,
}

/// Buyer identity for the cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartBuyerIdentity {
    /// Email address.
    pub email: Option<String>,
    /// Phone number.
    pub phone: Option<String>,
    /// Country code.
    pub country_code: Option<String>,
    /// Logged-in customer.
    pub customer: Option<CartCustomer>,
}

/// A shopping cart.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    /// Cart ID.
    pub id: String,
    /// Checkout URL.
    pub checkout_url: String,
    /// Creation timestamp.
    #[serde(default)]
    pub created_at: String,
    /// Last update timestamp.
    #[serde(default)]
    pub updated_at: String,
    /// Cart note.
    pub note: Option<String>,
    /// Total item quantity.
    pub total_quantity: i64,
    /// Custom attributes.
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    /// Buyer identity.
    pub buyer_identity: Option<CartBuyerIdentity>,
    /// Cart cost summary.
    pub cost: CartCost,
    /// Applied discount codes.
    #[serde(default)]
    pub discount_codes: Vec<CartDiscountCode>,
    /// Applied gift cards (masked).
    #[serde(default)]
    pub applied_gift_cards: Vec<CartAppliedGiftCard>,
    /// Cart lines.
    #[serde(default)]
    pub lines: CartLineConnection,
}

impl Cart {
    /// A synthesized zero-value cart, used when the platform is unreachable
    /// so the cart surface can still render.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            id: String::new(),
            checkout_url: String::new(),
            created_at: String::new(),
            updated_at: String::new(),
            note: None,
            total_quantity: 0,
            attributes: Vec::new(),
            buyer_identity: None,
            cost: CartCost::zero("USD"),
            discount_codes: Vec::new(),
            applied_gift_cards: Vec::new(),
            lines: CartLineConnection::default(),
        }
    }
}

// =============================================================================
// Cart Inputs
// =============================================================================

/// Input for adding a line to cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineInput {
    /// Product variant ID (canonical gid).
    pub merchandise_id: String,
    /// Quantity to add.
    pub quantity: i64,
    /// Custom attributes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Vec<AttributeInput>>,
}

/// Input for updating a cart line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineUpdateInput {
    /// Cart line ID.
    pub id: String,
    /// New quantity. Zero removes the line (platform semantics).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    /// New merchandise ID.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merchandise_id: Option<String>,
    /// New attributes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Vec<AttributeInput>>,
}

/// Input for updating the cart's buyer identity. Forwarded verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartBuyerIdentityInput {
    /// Email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Phone number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Country code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    /// Customer access token, when logged in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_access_token: Option<String>,
}

/// User error from cart mutations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartUserError {
    /// Error code.
    #[serde(default)]
    pub code: Option<String>,
    /// Field path that caused the error.
    #[serde(default)]
    pub field: Option<Vec<String>>,
    /// Human-readable error message.
    pub message: String,
}
