//! GraphQL documents for the Storefront API.
//!
//! Documents are raw strings whose selections match the serde shapes in
//! [`crate::shopify::types`]. Cart operations share one fragment so every
//! mutation returns the same cart projection.

/// Shared cart selection, appended to every cart operation.
pub const CART_FRAGMENT: &str = "\
fragment CartFields on Cart {
  id
  checkoutUrl
  createdAt
  updatedAt
  note
  totalQuantity
  attributes { key value }
  buyerIdentity {
    email
    phone
    countryCode
    customer { id email firstName lastName }
  }
  cost {
    subtotalAmount { amount currencyCode }
    totalAmount { amount currencyCode }
    totalTaxAmount { amount currencyCode }
    totalDutyAmount { amount currencyCode }
  }
  discountCodes { code applicable }
  appliedGiftCards { id lastCharacters amountUsed { amount currencyCode } }
  lines(first: 100) {
    nodes {
      id
      quantity
      attributes { key value }
      cost {
        amountPerQuantity { amount currencyCode }
        compareAtAmountPerQuantity { amount currencyCode }
        subtotalAmount { amount currencyCode }
        totalAmount { amount currencyCode }
      }
      merchandise {
        ... on ProductVariant {
          id
          title
          availableForSale
          quantityAvailable
          price { amount currencyCode }
          compareAtPrice { amount currencyCode }
          selectedOptions { name value }
          image { url altText width height }
          product { id handle title featuredImage { url altText width height } }
        }
      }
    }
  }
}";

/// Shared product selection (includes the hamper bundle price metafield).
pub const PRODUCT_FRAGMENT: &str = "\
fragment ProductFields on Product {
  id
  handle
  title
  description
  availableForSale
  featuredImage { url altText width height }
  variants(first: 50) {
    nodes {
      id
      title
      availableForSale
      quantityAvailable
      price { amount currencyCode }
      compareAtPrice { amount currencyCode }
      image { url altText width height }
    }
  }
  bundlePrice: metafield(namespace: \"clovermead\", key: \"bundle_price\") { value }
}";

pub const GET_CART: &str = "\
query GetCart($cartId: ID!) {
  cart(id: $cartId) { ...CartFields }
}";

pub const CREATE_CART: &str = "\
mutation CreateCart($input: CartInput!) {
  cartCreate(input: $input) {
    cart { ...CartFields }
    userErrors { code field message }
  }
}";

pub const ADD_CART_LINES: &str = "\
mutation AddCartLines($cartId: ID!, $lines: [CartLineInput!]!) {
  cartLinesAdd(cartId: $cartId, lines: $lines) {
    cart { ...CartFields }
    userErrors { code field message }
  }
}";

pub const UPDATE_CART_LINES: &str = "\
mutation UpdateCartLines($cartId: ID!, $lines: [CartLineUpdateInput!]!) {
  cartLinesUpdate(cartId: $cartId, lines: $lines) {
    cart { ...CartFields }
    userErrors { code field message }
  }
}";

pub const REMOVE_CART_LINES: &str = "\
mutation RemoveCartLines($cartId: ID!, $lineIds: [ID!]!) {
  cartLinesRemove(cartId: $cartId, lineIds: $lineIds) {
    cart { ...CartFields }
    userErrors { code field message }
  }
}";

pub const UPDATE_CART_DISCOUNT_CODES: &str = "\
mutation UpdateCartDiscountCodes($cartId: ID!, $discountCodes: [String!]) {
  cartDiscountCodesUpdate(cartId: $cartId, discountCodes: $discountCodes) {
    cart { ...CartFields }
    userErrors { code field message }
  }
}";

pub const UPDATE_CART_GIFT_CARD_CODES: &str = "\
mutation UpdateCartGiftCardCodes($cartId: ID!, $giftCardCodes: [String!]!) {
  cartGiftCardCodesUpdate(cartId: $cartId, giftCardCodes: $giftCardCodes) {
    cart { ...CartFields }
    userErrors { code field message }
  }
}";

pub const UPDATE_CART_BUYER_IDENTITY: &str = "\
mutation UpdateCartBuyerIdentity($cartId: ID!, $buyerIdentity: CartBuyerIdentityInput!) {
  cartBuyerIdentityUpdate(cartId: $cartId, buyerIdentity: $buyerIdentity) {
    cart { ...CartFields }
    userErrors { code field message }
  }
}";

pub const GET_PRODUCT_BY_HANDLE: &str = "\
query GetProductByHandle($handle: String!) {
  product(handle: $handle) { ...ProductFields }
}";

pub const GET_COLLECTION_BY_HANDLE: &str = "\
query GetCollectionByHandle($handle: String!, $productCount: Int!) {
  collection(handle: $handle) {
    id
    handle
    title
    description
    image { url altText width height }
    products(first: $productCount) { nodes { ...ProductFields } }
  }
}";

/// Shop-level online sales switch, stored as a JSON metafield.
pub const GET_ONLINE_SALES_SETTING: &str = "\
query GetOnlineSalesSetting {
  shop {
    onlineSales: metafield(namespace: \"clovermead\", key: \"online_sales\") { value }
  }
}";

/// Join an operation with the cart fragment it references.
#[must_use]
pub fn with_cart_fragment(operation: &str) -> String {
    format!("{operation}\n{CART_FRAGMENT}")
}

/// Join an operation with the product fragment it references.
#[must_use]
pub fn with_product_fragment(operation: &str) -> String {
    format!("{operation}\n{PRODUCT_FRAGMENT}")
}
