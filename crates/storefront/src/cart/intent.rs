//! Request parsing for the cart action endpoint.
//!
//! Clients of several vintages post to the same endpoint: a JSON body with
//! `{action, inputs}`, form posts with a JSON-encoded `lines` field, bare
//! scalar fields from the oldest product pages, the platform SDK's
//! `cartFormInput` envelope, and PHP-style indexed field names. Parsing is a
//! cascade of pure try-functions over the decoded body, first success wins.
//!
//! Everything here is shape-level only; merchandise id normalization and
//! entry validation happen at dispatch.

use rust_decimal::Decimal;
use serde::Deserialize;

use clovermead_core::VariantGid;

use crate::shopify::types::{AttributeInput, CartBuyerIdentityInput, CartLineInput, CartLineUpdateInput};

use super::CartActionError;
use super::bundle::{self, BundleMembership, is_truthy};

/// One normalized cart mutation request.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRequest {
    pub intent: CartIntent,
    /// Optional post-mutation redirect target (local path).
    pub redirect_to: Option<String>,
}

/// The operation requested by the client.
#[derive(Debug, Clone, PartialEq)]
pub enum CartIntent {
    /// Append lines; `hamper` is set when the request flags bundle
    /// metafield pricing.
    AddLines {
        lines: Vec<CartLineInput>,
        hamper: Option<HamperContext>,
    },
    /// Add one mega-saver item, merging into an existing mega-saver line.
    AddMegaSaverItem(MegaSaverItem),
    /// Update existing lines by line id.
    UpdateLines { lines: Vec<CartLineUpdateInput> },
    /// Remove lines by line id.
    RemoveLines { line_ids: Vec<String> },
    /// Apply discount codes (merged with already-applied codes).
    UpdateDiscountCodes { codes: Vec<String> },
    /// Apply gift card codes (full desired set, session-merged by caller).
    UpdateGiftCardCodes { codes: Vec<String> },
    /// Associate buyer identity, forwarded verbatim.
    UpdateBuyerIdentity { identity: CartBuyerIdentityInput },
}

impl CartIntent {
    /// Whether this intent adds merchandise (subject to online-sales gating).
    #[must_use]
    pub const fn is_add(&self) -> bool {
        matches!(
            self,
            Self::AddLines { .. } | Self::AddMegaSaverItem(_)
        )
    }
}

/// Hamper context flagged on an add request.
#[derive(Debug, Clone, PartialEq)]
pub struct HamperContext {
    pub bundle_id: Option<String>,
    pub bundle_name: Option<String>,
}

/// A mega-saver add submission.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MegaSaverItem {
    pub merchandise_id: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    /// Unit price at add time.
    #[serde(default)]
    pub price: Option<Decimal>,
    /// Pre-discount price.
    #[serde(default)]
    pub original_price: Option<Decimal>,
    /// Product title captured for display.
    #[serde(default)]
    pub product_title: Option<String>,
    /// Per-unit quantity for buy-N-for-Y offers.
    #[serde(default)]
    pub special_quantity: Option<u32>,
}

const fn default_quantity() -> u32 {
    1
}

impl MegaSaverItem {
    /// The add-line input for this item, attributed as a mega-saver line.
    #[must_use]
    pub fn to_line_input(&self, gid: &VariantGid) -> CartLineInput {
        let membership = BundleMembership::mega_saver(
            self.price,
            self.original_price,
            self.special_quantity,
        );
        let mut attributes = membership.to_attributes();
        if let Some(title) = &self.product_title {
            attributes.push(AttributeInput {
                key: bundle::ATTR_PRODUCT_TITLE.to_string(),
                value: title.clone(),
            });
        }
        CartLineInput {
            merchandise_id: gid.as_str().to_string(),
            quantity: i64::from(self.quantity.max(1)),
            attributes: Some(attributes),
        }
    }
}

// =============================================================================
// Wire shapes
// =============================================================================

/// Action tags accepted on the wire, including legacy spellings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActionTag {
    AddLines,
    UpdateLines,
    RemoveLines,
    DiscountCodes,
    GiftCardCodes,
    BuyerIdentity,
    MegaSaver,
}

fn parse_action_tag(tag: &str) -> Option<ActionTag> {
    match tag.trim() {
        "LinesAdd" | "addLines" => Some(ActionTag::AddLines),
        "LinesUpdate" | "updateLines" => Some(ActionTag::UpdateLines),
        "LinesRemove" | "removeLines" => Some(ActionTag::RemoveLines),
        "DiscountCodesUpdate" | "updateDiscountCodes" => Some(ActionTag::DiscountCodes),
        "GiftCardCodesUpdate" | "updateGiftCardCodes" => Some(ActionTag::GiftCardCodes),
        "BuyerIdentityUpdate" | "updateBuyerIdentity" => Some(ActionTag::BuyerIdentity),
        "MegaSaverLinesAdd" | "addMegaSaverItem" => Some(ActionTag::MegaSaver),
        _ => None,
    }
}

/// Quantity fields arrive as numbers or strings depending on client vintage.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FlexibleInt {
    Number(i64),
    Text(String),
}

impl FlexibleInt {
    fn value(&self) -> Option<i64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// One `{merchandiseId, quantity}` add entry.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LineEntry {
    merchandise_id: String,
    #[serde(default)]
    quantity: Option<FlexibleInt>,
    #[serde(default)]
    attributes: Option<Vec<AttributeInput>>,
}

impl LineEntry {
    fn into_line_input(self) -> CartLineInput {
        // Absent quantity means one; an unparseable quantity yields zero and
        // is dropped at dispatch.
        let quantity = match &self.quantity {
            None => 1,
            Some(q) => q.value().unwrap_or(0),
        };
        CartLineInput {
            merchandise_id: self.merchandise_id,
            quantity,
            attributes: self.attributes,
        }
    }
}

/// One `{id, quantity}` update entry.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LineUpdateEntry {
    id: String,
    #[serde(default)]
    quantity: Option<FlexibleInt>,
    #[serde(default)]
    merchandise_id: Option<String>,
}

impl LineUpdateEntry {
    fn into_update_input(self) -> CartLineUpdateInput {
        CartLineUpdateInput {
            id: self.id,
            quantity: self.quantity.as_ref().and_then(FlexibleInt::value),
            merchandise_id: self.merchandise_id,
            attributes: None,
        }
    }
}

// =============================================================================
// JSON body parsing
// =============================================================================

/// Parse a JSON `{action, inputs}` body.
///
/// # Errors
///
/// `InvalidRequest` when the body carries no action or unusable inputs;
/// `UnsupportedAction` for an unknown action tag; `InvalidLineItems` when a
/// lines payload fails to decode.
pub fn parse_json_request(body: &serde_json::Value) -> Result<ParsedRequest, CartActionError> {
    let Some(action) = body.get("action").and_then(serde_json::Value::as_str) else {
        return Err(CartActionError::InvalidRequest);
    };
    let tag = parse_action_tag(action)
        .ok_or_else(|| CartActionError::UnsupportedAction(action.to_string()))?;

    let inputs = body.get("inputs").cloned().unwrap_or(serde_json::Value::Null);
    let redirect_to = string_field(body, "redirectTo")
        .or_else(|| string_field(&inputs, "redirectTo"));

    let intent = intent_from_json(tag, &inputs)?;
    Ok(ParsedRequest { intent, redirect_to })
}

fn string_field(value: &serde_json::Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
}

fn intent_from_json(
    tag: ActionTag,
    inputs: &serde_json::Value,
) -> Result<CartIntent, CartActionError> {
    match tag {
        ActionTag::AddLines => {
            let entries: Vec<LineEntry> = inputs
                .get("lines")
                .cloned()
                .map(serde_json::from_value)
                .transpose()
                .map_err(|_| CartActionError::InvalidLineItems)?
                .unwrap_or_default();
            if entries.is_empty() {
                return Err(CartActionError::InvalidLineItems);
            }
            Ok(CartIntent::AddLines {
                lines: entries.into_iter().map(LineEntry::into_line_input).collect(),
                hamper: hamper_context_from_json(inputs),
            })
        }
        ActionTag::MegaSaver => {
            let item: MegaSaverItem = serde_json::from_value(inputs.clone())
                .map_err(|_| CartActionError::InvalidLineItems)?;
            Ok(CartIntent::AddMegaSaverItem(item))
        }
        ActionTag::UpdateLines => {
            let entries: Vec<LineUpdateEntry> = inputs
                .get("lines")
                .cloned()
                .map(serde_json::from_value)
                .transpose()
                .map_err(|_| CartActionError::InvalidLineItems)?
                .unwrap_or_default();
            if entries.is_empty() {
                return Err(CartActionError::InvalidLineItems);
            }
            Ok(CartIntent::UpdateLines {
                lines: entries
                    .into_iter()
                    .map(LineUpdateEntry::into_update_input)
                    .collect(),
            })
        }
        ActionTag::RemoveLines => {
            let line_ids: Vec<String> = inputs
                .get("lineIds")
                .cloned()
                .map(serde_json::from_value)
                .transpose()
                .map_err(|_| CartActionError::InvalidLineItems)?
                .unwrap_or_default();
            if line_ids.is_empty() {
                return Err(CartActionError::InvalidLineItems);
            }
            Ok(CartIntent::RemoveLines { line_ids })
        }
        ActionTag::DiscountCodes => Ok(CartIntent::UpdateDiscountCodes {
            codes: codes_from_json(inputs, "discountCode", "discountCodes"),
        }),
        ActionTag::GiftCardCodes => Ok(CartIntent::UpdateGiftCardCodes {
            codes: codes_from_json(inputs, "giftCardCode", "giftCardCodes"),
        }),
        ActionTag::BuyerIdentity => {
            let identity_value = inputs.get("buyerIdentity").cloned().unwrap_or_else(|| inputs.clone());
            let identity: CartBuyerIdentityInput = serde_json::from_value(identity_value)
                .map_err(|_| CartActionError::InvalidRequest)?;
            Ok(CartIntent::UpdateBuyerIdentity { identity })
        }
    }
}

fn codes_from_json(inputs: &serde_json::Value, single: &str, plural: &str) -> Vec<String> {
    let mut codes = Vec::new();
    if let Some(code) = string_field(inputs, single) {
        codes.push(code);
    }
    if let Some(list) = inputs.get(plural).and_then(serde_json::Value::as_array) {
        codes.extend(
            list.iter()
                .filter_map(serde_json::Value::as_str)
                .map(str::to_string),
        );
    }
    codes
}

fn hamper_context_from_json(inputs: &serde_json::Value) -> Option<HamperContext> {
    let flagged = inputs
        .get("useBundleMetafields")
        .is_some_and(|v| v.as_bool().unwrap_or_else(|| v.as_str().is_some_and(is_truthy)));
    if !flagged {
        return None;
    }
    Some(HamperContext {
        bundle_id: string_field(inputs, "bundleId"),
        bundle_name: string_field(inputs, "bundleName"),
    })
}

// =============================================================================
// Form body parsing (the cascade)
// =============================================================================

/// Decoded form fields in submission order.
pub struct FormFields<'a> {
    fields: &'a [(String, String)],
}

impl<'a> FormFields<'a> {
    #[must_use]
    pub const fn new(fields: &'a [(String, String)]) -> Self {
        Self { fields }
    }

    fn get(&self, name: &str) -> Option<&'a str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn get_non_empty(&self, name: &str) -> Option<&'a str> {
        self.get(name).map(str::trim).filter(|v| !v.is_empty())
    }
}

/// Parse a form-encoded (urlencoded or multipart) body.
///
/// Strategies are tried in priority order until one yields a usable
/// `(action, inputs)` pair:
///
/// 1. explicit action field plus JSON-encoded structured inputs;
/// 2. direct scalar fields (`merchandiseId` + `quantity`, mega-saver flag);
/// 3. the platform SDK's `cartFormInput` envelope;
/// 4. indexed `lines[N][...]` field names.
///
/// # Errors
///
/// `InvalidRequest` when no strategy recognizes the body;
/// `UnsupportedAction`/`InvalidLineItems` when a strategy recognizes it but
/// the content is unusable.
pub fn parse_form_request(fields: &[(String, String)]) -> Result<ParsedRequest, CartActionError> {
    let form = FormFields::new(fields);
    let redirect_to = form.get_non_empty("redirectTo").map(str::to_string);

    let mut intent = try_explicit_action(&form)?;
    if intent.is_none() {
        intent = try_scalar_fields(&form)?;
    }
    if intent.is_none() {
        intent = try_form_envelope(&form)?;
    }
    if intent.is_none() {
        intent = try_indexed_lines(&form);
    }

    let intent = intent.ok_or(CartActionError::InvalidRequest)?;
    Ok(ParsedRequest { intent, redirect_to })
}

/// Strategy 1: explicit `cartAction`/`_action` plus structured inputs.
fn try_explicit_action(form: &FormFields<'_>) -> Result<Option<CartIntent>, CartActionError> {
    let Some(tag_raw) = form
        .get_non_empty("cartAction")
        .or_else(|| form.get_non_empty("_action"))
    else {
        return Ok(None);
    };
    let tag = parse_action_tag(tag_raw)
        .ok_or_else(|| CartActionError::UnsupportedAction(tag_raw.to_string()))?;

    match tag {
        ActionTag::AddLines => {
            let Some(raw) = form.get_non_empty("lines") else {
                // No structured lines; the scalar strategy may still apply.
                return Ok(None);
            };
            let entries: Vec<LineEntry> =
                serde_json::from_str(raw).map_err(|_| CartActionError::InvalidLineItems)?;
            if entries.is_empty() {
                return Err(CartActionError::InvalidLineItems);
            }
            Ok(Some(CartIntent::AddLines {
                lines: entries.into_iter().map(LineEntry::into_line_input).collect(),
                hamper: hamper_context_from_form(form),
            }))
        }
        ActionTag::UpdateLines => {
            let Some(raw) = form.get_non_empty("lines") else {
                return Ok(scalar_line_update(form));
            };
            let entries: Vec<LineUpdateEntry> =
                serde_json::from_str(raw).map_err(|_| CartActionError::InvalidLineItems)?;
            if entries.is_empty() {
                return Err(CartActionError::InvalidLineItems);
            }
            Ok(Some(CartIntent::UpdateLines {
                lines: entries
                    .into_iter()
                    .map(LineUpdateEntry::into_update_input)
                    .collect(),
            }))
        }
        ActionTag::RemoveLines => {
            if let Some(raw) = form.get_non_empty("lineIds") {
                let line_ids: Vec<String> =
                    serde_json::from_str(raw).map_err(|_| CartActionError::InvalidLineItems)?;
                if line_ids.is_empty() {
                    return Err(CartActionError::InvalidLineItems);
                }
                return Ok(Some(CartIntent::RemoveLines { line_ids }));
            }
            Ok(form.get_non_empty("lineId").map(|id| CartIntent::RemoveLines {
                line_ids: vec![id.to_string()],
            }))
        }
        ActionTag::DiscountCodes => {
            let codes = codes_from_form(form, "discountCode", "discountCodes");
            if codes.is_empty() {
                return Ok(None);
            }
            Ok(Some(CartIntent::UpdateDiscountCodes { codes }))
        }
        ActionTag::GiftCardCodes => {
            let codes = codes_from_form(form, "giftCardCode", "giftCardCodes");
            if codes.is_empty() {
                return Ok(None);
            }
            Ok(Some(CartIntent::UpdateGiftCardCodes { codes }))
        }
        ActionTag::BuyerIdentity => {
            let Some(raw) = form.get_non_empty("buyerIdentity") else {
                return Ok(None);
            };
            let identity: CartBuyerIdentityInput =
                serde_json::from_str(raw).map_err(|_| CartActionError::InvalidRequest)?;
            Ok(Some(CartIntent::UpdateBuyerIdentity { identity }))
        }
        ActionTag::MegaSaver => Ok(mega_saver_from_form(form)),
    }
}

/// Strategy 2: bare scalar fields from legacy product pages.
fn try_scalar_fields(form: &FormFields<'_>) -> Result<Option<CartIntent>, CartActionError> {
    let Some(merchandise_id) = form.get_non_empty("merchandiseId") else {
        return Ok(None);
    };

    if form.get("from_mega_saver").is_some_and(is_truthy) {
        return Ok(mega_saver_from_form(form));
    }

    let tag = match form.get_non_empty("cartAction") {
        Some(raw) => parse_action_tag(raw)
            .ok_or_else(|| CartActionError::UnsupportedAction(raw.to_string()))?,
        None => ActionTag::AddLines,
    };
    if tag != ActionTag::AddLines {
        return Ok(None);
    }

    let quantity = scalar_quantity(form, 1);
    Ok(Some(CartIntent::AddLines {
        lines: vec![CartLineInput {
            merchandise_id: merchandise_id.to_string(),
            quantity,
            attributes: None,
        }],
        hamper: hamper_context_from_form(form),
    }))
}

/// Strategy 3: the platform SDK's JSON envelope field.
fn try_form_envelope(form: &FormFields<'_>) -> Result<Option<CartIntent>, CartActionError> {
    let Some(raw) = form.get_non_empty("cartFormInput") else {
        return Ok(None);
    };
    let body: serde_json::Value =
        serde_json::from_str(raw).map_err(|_| CartActionError::InvalidRequest)?;
    parse_json_request(&body).map(|parsed| Some(parsed.intent))
}

/// Strategy 4: indexed `lines[N][merchandiseId]` fields, scanned until a gap.
fn try_indexed_lines(form: &FormFields<'_>) -> Option<CartIntent> {
    let mut lines = Vec::new();
    for n in 0usize.. {
        let Some(merchandise_id) = form.get_non_empty(&format!("lines[{n}][merchandiseId]"))
        else {
            break;
        };
        let quantity = form
            .get_non_empty(&format!("lines[{n}][quantity]"))
            .map_or(1, |q| q.parse().unwrap_or(0));
        lines.push(CartLineInput {
            merchandise_id: merchandise_id.to_string(),
            quantity,
            attributes: None,
        });
    }
    if lines.is_empty() {
        None
    } else {
        Some(CartIntent::AddLines {
            lines,
            hamper: hamper_context_from_form(form),
        })
    }
}

fn scalar_quantity(form: &FormFields<'_>, default: i64) -> i64 {
    form.get_non_empty("quantity")
        .map_or(default, |q| q.parse().unwrap_or(0))
}

fn scalar_line_update(form: &FormFields<'_>) -> Option<CartIntent> {
    let line_id = form.get_non_empty("lineId")?;
    let quantity = form.get_non_empty("quantity")?.parse().ok()?;
    Some(CartIntent::UpdateLines {
        lines: vec![CartLineUpdateInput {
            id: line_id.to_string(),
            quantity: Some(quantity),
            merchandise_id: None,
            attributes: None,
        }],
    })
}

fn mega_saver_from_form(form: &FormFields<'_>) -> Option<CartIntent> {
    let merchandise_id = form.get_non_empty("merchandiseId")?;
    let quantity = u32::try_from(scalar_quantity(form, 1)).unwrap_or(0).max(1);
    Some(CartIntent::AddMegaSaverItem(MegaSaverItem {
        merchandise_id: merchandise_id.to_string(),
        quantity,
        price: form.get_non_empty("price").and_then(|v| v.parse().ok()),
        original_price: form
            .get_non_empty("originalPrice")
            .and_then(|v| v.parse().ok()),
        product_title: form.get_non_empty("productTitle").map(str::to_string),
        special_quantity: form
            .get_non_empty("specialQuantity")
            .and_then(|v| v.parse().ok()),
    }))
}

fn codes_from_form(form: &FormFields<'_>, single: &str, plural: &str) -> Vec<String> {
    let mut codes = Vec::new();
    if let Some(code) = form.get_non_empty(single) {
        codes.push(code.to_string());
    }
    if let Some(raw) = form.get_non_empty(plural)
        && let Ok(list) = serde_json::from_str::<Vec<String>>(raw)
    {
        codes.extend(list);
    }
    codes
}

fn hamper_context_from_form(form: &FormFields<'_>) -> Option<HamperContext> {
    if !form.get("useBundleMetafields").is_some_and(is_truthy) {
        return None;
    }
    Some(HamperContext {
        bundle_id: form.get_non_empty("bundleId").map(str::to_string),
        bundle_name: form.get_non_empty("bundleName").map(str::to_string),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn json_add_lines() {
        let body = json!({
            "action": "LinesAdd",
            "inputs": { "lines": [{ "merchandiseId": "123", "quantity": 2 }] }
        });
        let parsed = parse_json_request(&body).unwrap();
        let CartIntent::AddLines { lines, hamper } = parsed.intent else {
            panic!("expected AddLines");
        };
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].merchandise_id, "123");
        assert_eq!(lines[0].quantity, 2);
        assert!(hamper.is_none());
    }

    #[test]
    fn json_quantity_accepts_string_numbers() {
        let body = json!({
            "action": "LinesAdd",
            "inputs": { "lines": [{ "merchandiseId": "123", "quantity": "4" }] }
        });
        let parsed = parse_json_request(&body).unwrap();
        let CartIntent::AddLines { lines, .. } = parsed.intent else {
            panic!("expected AddLines");
        };
        assert_eq!(lines[0].quantity, 4);
    }

    #[test]
    fn json_unknown_action_is_unsupported() {
        let body = json!({ "action": "NotesUpdate", "inputs": {} });
        assert!(matches!(
            parse_json_request(&body),
            Err(CartActionError::UnsupportedAction(_))
        ));
    }

    #[test]
    fn json_missing_action_is_invalid() {
        let body = json!({ "inputs": {} });
        assert!(matches!(
            parse_json_request(&body),
            Err(CartActionError::InvalidRequest)
        ));
    }

    #[test]
    fn json_redirect_is_surfaced() {
        let body = json!({
            "action": "DiscountCodesUpdate",
            "redirectTo": "/cart",
            "inputs": { "discountCode": "SPRING" }
        });
        let parsed = parse_json_request(&body).unwrap();
        assert_eq!(parsed.redirect_to.as_deref(), Some("/cart"));
        assert_eq!(
            parsed.intent,
            CartIntent::UpdateDiscountCodes {
                codes: vec!["SPRING".to_string()]
            }
        );
    }

    #[test]
    fn form_explicit_action_with_json_lines() {
        let form = fields(&[
            ("cartAction", "LinesAdd"),
            ("lines", r#"[{"merchandiseId":"111","quantity":1},{"merchandiseId":"222","quantity":"2"}]"#),
        ]);
        let parsed = parse_form_request(&form).unwrap();
        let CartIntent::AddLines { lines, .. } = parsed.intent else {
            panic!("expected AddLines");
        };
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].quantity, 2);
    }

    #[test]
    fn form_explicit_action_outranks_scalar_fields() {
        // Both shapes present: the structured lines win.
        let form = fields(&[
            ("cartAction", "LinesAdd"),
            ("lines", r#"[{"merchandiseId":"111","quantity":5}]"#),
            ("merchandiseId", "999"),
            ("quantity", "1"),
        ]);
        let parsed = parse_form_request(&form).unwrap();
        let CartIntent::AddLines { lines, .. } = parsed.intent else {
            panic!("expected AddLines");
        };
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].merchandise_id, "111");
        assert_eq!(lines[0].quantity, 5);
    }

    #[test]
    fn form_scalar_defaults_to_add() {
        let form = fields(&[("merchandiseId", "123"), ("quantity", "3")]);
        let parsed = parse_form_request(&form).unwrap();
        assert_eq!(
            parsed.intent,
            CartIntent::AddLines {
                lines: vec![CartLineInput {
                    merchandise_id: "123".to_string(),
                    quantity: 3,
                    attributes: None,
                }],
                hamper: None,
            }
        );
    }

    #[test]
    fn form_scalar_missing_quantity_means_one() {
        let form = fields(&[("merchandiseId", "123")]);
        let parsed = parse_form_request(&form).unwrap();
        let CartIntent::AddLines { lines, .. } = parsed.intent else {
            panic!("expected AddLines");
        };
        assert_eq!(lines[0].quantity, 1);
    }

    #[test]
    fn form_mega_saver_flag_routes_to_bundle_intent() {
        let form = fields(&[
            ("merchandiseId", "123"),
            ("quantity", "2"),
            ("from_mega_saver", "1"),
            ("price", "4.99"),
            ("originalPrice", "7.99"),
            ("productTitle", "Orchard Apples 1kg"),
            ("specialQuantity", "3"),
        ]);
        let parsed = parse_form_request(&form).unwrap();
        let CartIntent::AddMegaSaverItem(item) = parsed.intent else {
            panic!("expected AddMegaSaverItem");
        };
        assert_eq!(item.merchandise_id, "123");
        assert_eq!(item.quantity, 2);
        assert_eq!(item.price, Some(Decimal::new(499, 2)));
        assert_eq!(item.original_price, Some(Decimal::new(799, 2)));
        assert_eq!(item.product_title.as_deref(), Some("Orchard Apples 1kg"));
        assert_eq!(item.special_quantity, Some(3));
    }

    #[test]
    fn form_envelope_is_used_when_no_direct_fields_match() {
        let envelope = json!({
            "action": "GiftCardCodesUpdate",
            "inputs": { "giftCardCode": "ABCD1234" }
        });
        let form = fields(&[("cartFormInput", &envelope.to_string())]);
        let parsed = parse_form_request(&form).unwrap();
        assert_eq!(
            parsed.intent,
            CartIntent::UpdateGiftCardCodes {
                codes: vec!["ABCD1234".to_string()]
            }
        );
    }

    #[test]
    fn form_indexed_lines_assemble_until_gap() {
        let form = fields(&[
            ("lines[0][merchandiseId]", "111"),
            ("lines[0][quantity]", "1"),
            ("lines[1][merchandiseId]", "222"),
            ("lines[1][quantity]", "2"),
            // index 3 exists but index 2 does not: scan stops at the gap
            ("lines[3][merchandiseId]", "444"),
        ]);
        let parsed = parse_form_request(&form).unwrap();
        let CartIntent::AddLines { lines, .. } = parsed.intent else {
            panic!("expected AddLines");
        };
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].merchandise_id, "111");
        assert_eq!(lines[1].merchandise_id, "222");
    }

    #[test]
    fn form_with_nothing_recognizable_is_invalid() {
        let form = fields(&[("utm_source", "newsletter")]);
        assert!(matches!(
            parse_form_request(&form),
            Err(CartActionError::InvalidRequest)
        ));
    }

    #[test]
    fn form_unknown_explicit_action_does_not_fall_through() {
        let form = fields(&[
            ("cartAction", "SelfDestruct"),
            ("merchandiseId", "123"),
        ]);
        assert!(matches!(
            parse_form_request(&form),
            Err(CartActionError::UnsupportedAction(_))
        ));
    }

    #[test]
    fn form_hamper_flags_attach_context() {
        let form = fields(&[
            ("cartAction", "LinesAdd"),
            ("lines", r#"[{"merchandiseId":"111","quantity":1,"attributes":[{"key":"_hamper","value":"true"},{"key":"_bundle_price","value":"12.50"}]}]"#),
            ("useBundleMetafields", "true"),
            ("bundleId", "gid://shopify/Collection/42"),
            ("bundleName", "Autumn Hamper"),
        ]);
        let parsed = parse_form_request(&form).unwrap();
        let CartIntent::AddLines { hamper, lines } = parsed.intent else {
            panic!("expected AddLines");
        };
        let hamper = hamper.unwrap();
        assert_eq!(hamper.bundle_name.as_deref(), Some("Autumn Hamper"));
        assert!(lines[0].attributes.is_some());
    }

    #[test]
    fn form_scalar_update_by_line_id() {
        let form = fields(&[
            ("cartAction", "LinesUpdate"),
            ("lineId", "gid://shopify/CartLine/abc"),
            ("quantity", "0"),
        ]);
        let parsed = parse_form_request(&form).unwrap();
        let CartIntent::UpdateLines { lines } = parsed.intent else {
            panic!("expected UpdateLines");
        };
        assert_eq!(lines[0].quantity, Some(0));
    }

    #[test]
    fn mega_saver_line_input_carries_bundle_attributes() {
        let item = MegaSaverItem {
            merchandise_id: "123".to_string(),
            quantity: 2,
            price: Some(Decimal::new(499, 2)),
            original_price: Some(Decimal::new(799, 2)),
            product_title: Some("Orchard Apples 1kg".to_string()),
            special_quantity: Some(3),
        };
        let gid = VariantGid::normalize("123").unwrap();
        let line = item.to_line_input(&gid);
        assert_eq!(line.merchandise_id, "gid://shopify/ProductVariant/123");
        assert_eq!(line.quantity, 2);
        let attributes = line.attributes.unwrap();
        let membership = BundleMembership::from_attribute_inputs(&attributes).unwrap();
        assert_eq!(membership.kind, bundle::BundleKind::MegaSaver);
        assert_eq!(membership.unit_price, Some(Decimal::new(499, 2)));
        assert!(
            attributes
                .iter()
                .any(|a| a.key == bundle::ATTR_PRODUCT_TITLE)
        );
    }
}
