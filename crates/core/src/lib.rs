//! Shared domain types for the Clovermead storefront.
//!
//! Everything in this crate is platform-facing but transport-agnostic:
//! canonical merchandise identifiers and decimal prices. The web crate
//! builds on these; nothing here performs I/O.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::gid::VariantGid;
pub use types::price::{CurrencyCode, Price};
