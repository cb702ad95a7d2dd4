//! # Wire models
//!
//! Shapes exchanged with the commerce backend and the storefront.
//!
//! The backend is not consistent about scalar types: quantities and ids
//! arrive as strings or numbers depending on the endpoint, prices sometimes
//! carry a trailing currency symbol, and the cart `order` field is returned
//! either as a sequence or as an object keyed by package id. Everything is
//! normalized here, at decode time, so the rest of the crate works on one
//! representation.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

/// Quantity the backend uses to mark a line item as a priced extra.
///
/// The wire protocol has no explicit tag for extras; a line created through
/// the add-extra call carries this quantity. Decoded into [`LineKind`] once,
/// here, and never re-inferred downstream.
pub const EXTRA_QUANTITY: u32 = 10;

/// Whether a line item counts toward a category quota or is a priced extra.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    Included,
    Extra,
}

/// One line item of the remote cart, mirrored locally for display.
#[derive(Debug, Clone, Serialize)]
pub struct CartProduct {
    pub cart_id: String,
    pub product_id: String,
    pub name: String,
    pub image: String,
    pub quantity: u32,
    pub price: f64,
    pub total: f64,
    pub kind: LineKind,
}

#[derive(Deserialize)]
struct CartProductWire {
    #[serde(default, deserialize_with = "de_string")]
    cart_id: String,
    #[serde(default, deserialize_with = "de_string")]
    product_id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    image: String,
    #[serde(default, deserialize_with = "de_count")]
    quantity: u32,
    #[serde(default, deserialize_with = "de_money")]
    price: f64,
    #[serde(default, deserialize_with = "de_money")]
    total: f64,
}

impl From<CartProductWire> for CartProduct {
    fn from(wire: CartProductWire) -> Self {
        let kind = if wire.quantity == EXTRA_QUANTITY && wire.price > 0.0 {
            LineKind::Extra
        } else {
            LineKind::Included
        };
        CartProduct {
            cart_id: wire.cart_id,
            product_id: wire.product_id,
            name: wire.name,
            image: wire.image,
            quantity: wire.quantity,
            price: wire.price,
            total: wire.total,
            kind,
        }
    }
}

impl<'de> Deserialize<'de> for CartProduct {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        CartProductWire::deserialize(deserializer).map(Into::into)
    }
}

/// One configured package inside the cart, created by the add-package call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageOrder {
    #[serde(default, deserialize_with = "de_opt_string")]
    pub id: Option<String>,
    #[serde(default)]
    pub package: String,
    #[serde(default, deserialize_with = "de_money")]
    pub price: f64,
    #[serde(default, deserialize_with = "de_opt_count")]
    pub guests: Option<u32>,
    #[serde(default)]
    pub products: BTreeMap<String, Vec<CartProduct>>,
}

/// One step of the configurator: a category with a required selection count.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MenuContent {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub ids: Vec<u32>,
    #[serde(default, deserialize_with = "de_count")]
    pub count: u32,
    #[serde(default, rename = "currentCount", deserialize_with = "de_opt_count")]
    pub current_count: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Menu {
    #[serde(default, deserialize_with = "de_count")]
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "de_money")]
    pub price: f64,
    #[serde(default)]
    pub contents: Vec<MenuContent>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cart {
    #[serde(default, deserialize_with = "de_order")]
    pub order: Vec<PackageOrder>,
    #[serde(default)]
    pub menu: Option<Menu>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TotalLine {
    pub title: String,
    pub text: String,
}

/// The get-cart response: nested packages plus a flattened display list and
/// the backend's own formatted totals.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CartEnvelope {
    #[serde(default)]
    pub cart: Cart,
    #[serde(default)]
    pub products: Vec<CartProduct>,
    #[serde(default)]
    pub totals: Vec<TotalLine>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MenuContentResponse {
    #[serde(default)]
    pub contents: Vec<MenuContent>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductSummary {
    #[serde(default, deserialize_with = "de_string")]
    pub product_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub thumb: String,
    #[serde(default, deserialize_with = "de_money")]
    pub price: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductsResponse {
    #[serde(default)]
    pub products: Vec<ProductSummary>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub api_token: String,
}

/// Address as the checkout steps submit it. The shipping and billing steps
/// share the shape; only the trailing id field differs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Address {
    #[serde(default)]
    pub firstname: String,
    #[serde(default)]
    pub lastname: String,
    #[serde(default)]
    pub address_1: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country_id: String,
    #[serde(default)]
    pub zone_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_address_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_address_id: Option<String>,
}

/// Customer block of a submitted order, as the checkout form posts it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
}

// Request payloads of the storefront-facing routes.

#[derive(Debug, Deserialize)]
pub struct MenuContentRequest {
    pub menu: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRequest {
    pub category_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductByIdRequest {
    pub product_id: String,
}

#[derive(Debug, Deserialize)]
pub struct AddProductRequest {
    #[serde(deserialize_with = "de_string")]
    pub id: String,
    #[serde(deserialize_with = "de_count")]
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct EditProductRequest {
    #[serde(deserialize_with = "de_string")]
    pub id: String,
    #[serde(deserialize_with = "de_count")]
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct RemoveProductRequest {
    #[serde(deserialize_with = "de_string")]
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct AddExtraRequest {
    #[serde(deserialize_with = "de_string")]
    pub product_id: String,
}

#[derive(Debug, Deserialize)]
pub struct PaymentMethodRequest {
    pub payment_method: String,
}

#[derive(Debug, Deserialize)]
pub struct ShippingMethodRequest {
    pub shipping_method: String,
}

#[derive(Debug, Deserialize)]
pub struct FlowStartRequest {
    pub menu: u32,
    #[serde(default, deserialize_with = "de_count")]
    pub guests: u32,
}

#[derive(Debug, Deserialize)]
pub struct FlowJumpRequest {
    pub step: usize,
}

#[derive(Debug, Serialize)]
pub struct FlowSnapshot {
    pub step: usize,
    pub total_steps: usize,
    pub category: String,
    pub required: u32,
    pub current: u32,
    pub modal_open: bool,
    pub completed: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitOrderRequest {
    pub customer_info: CustomerInfo,
    pub cart_data: CartEnvelope,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitOrderResponse {
    pub success: bool,
    pub message: String,
    pub order_number: String,
}

// Lenient scalar decoding. The backend mixes strings and numbers freely.

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Num(f64),
    Str(String),
}

fn de_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Scalar::deserialize(deserializer)? {
        Scalar::Num(n) => {
            if n.fract() == 0.0 {
                Ok(format!("{}", n as i64))
            } else {
                Ok(n.to_string())
            }
        }
        Scalar::Str(s) => Ok(s),
    }
}

fn de_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Scalar>::deserialize(deserializer)?;
    Ok(value.map(|s| match s {
        Scalar::Num(n) if n.fract() == 0.0 => format!("{}", n as i64),
        Scalar::Num(n) => n.to_string(),
        Scalar::Str(s) => s,
    }))
}

fn parse_money(s: &str) -> Result<f64, std::num::ParseFloatError> {
    s.trim()
        .trim_end_matches('€')
        .trim()
        .replace(',', ".")
        .parse::<f64>()
}

fn de_money<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match Scalar::deserialize(deserializer)? {
        Scalar::Num(n) => Ok(n),
        Scalar::Str(s) if s.trim().is_empty() => Ok(0.0),
        Scalar::Str(s) => parse_money(&s).map_err(de::Error::custom),
    }
}

fn de_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    match Scalar::deserialize(deserializer)? {
        Scalar::Num(n) => Ok(n.max(0.0) as u32),
        Scalar::Str(s) if s.trim().is_empty() => Ok(0),
        Scalar::Str(s) => s
            .trim()
            .parse::<f64>()
            .map(|n| n.max(0.0) as u32)
            .map_err(de::Error::custom),
    }
}

fn de_opt_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Scalar>::deserialize(deserializer)?;
    match value {
        None => Ok(None),
        Some(Scalar::Num(n)) => Ok(Some(n.max(0.0) as u32)),
        Some(Scalar::Str(s)) if s.trim().is_empty() => Ok(None),
        Some(Scalar::Str(s)) => s
            .trim()
            .parse::<f64>()
            .map(|n| Some(n.max(0.0) as u32))
            .map_err(de::Error::custom),
    }
}

/// The cart `order` field arrives as a sequence, an object keyed by package
/// id, or not at all. All three decode to the same ordered sequence.
fn de_order<'de, D>(deserializer: D) -> Result<Vec<PackageOrder>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OrderRepr {
        Seq(Vec<PackageOrder>),
        Map(BTreeMap<String, PackageOrder>),
        Missing(()),
    }

    match OrderRepr::deserialize(deserializer)? {
        OrderRepr::Seq(packages) => Ok(packages),
        OrderRepr::Map(map) => Ok(map
            .into_iter()
            .map(|(key, mut package)| {
                if package.id.is_none() {
                    package.id = Some(key);
                }
                package
            })
            .collect()),
        OrderRepr::Missing(()) => Ok(Vec::new()),
    }
}

impl fmt::Display for LineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineKind::Included => write!(f, "included"),
            LineKind::Extra => write!(f, "extra"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(json: &str) -> CartProduct {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn quantity_and_price_accept_strings_and_numbers() {
        let a = product(r#"{"cart_id":1,"product_id":"7","name":"Falafel","quantity":"3","price":"4.50€","total":13.5}"#);
        assert_eq!(a.cart_id, "1");
        assert_eq!(a.quantity, 3);
        assert_eq!(a.price, 4.5);
        assert_eq!(a.total, 13.5);

        let b = product(r#"{"cart_id":"9","product_id":12,"name":"Ayran","quantity":2,"price":1.5,"total":"3.00"}"#);
        assert_eq!(b.product_id, "12");
        assert_eq!(b.quantity, 2);
        assert_eq!(b.total, 3.0);
    }

    #[test]
    fn line_kind_is_decided_at_decode_time() {
        let extra = product(r#"{"cart_id":"1","product_id":"7","name":"Baklava","quantity":10,"price":7.5,"total":7.5}"#);
        assert_eq!(extra.kind, LineKind::Extra);

        // The sentinel quantity without a price is a bulk inclusion, not an extra.
        let bulk = product(r#"{"cart_id":"2","product_id":"8","name":"Brot","quantity":10,"price":0,"total":0}"#);
        assert_eq!(bulk.kind, LineKind::Included);

        let plain = product(r#"{"cart_id":"3","product_id":"9","name":"Salat","quantity":2,"price":3.0,"total":6.0}"#);
        assert_eq!(plain.kind, LineKind::Included);
    }

    #[test]
    fn order_decodes_from_sequence_and_keyed_object() {
        let seq: Cart = serde_json::from_str(
            r#"{"order":[{"package":"Menü Klassik","price":25,"guests":4,"products":{}}]}"#,
        )
        .unwrap();
        let map: Cart = serde_json::from_str(
            r#"{"order":{"31":{"package":"Menü Klassik","price":25,"guests":4,"products":{}}}}"#,
        )
        .unwrap();

        assert_eq!(seq.order.len(), 1);
        assert_eq!(map.order.len(), 1);
        assert_eq!(seq.order[0].package, map.order[0].package);
        assert_eq!(map.order[0].id.as_deref(), Some("31"));
    }

    #[test]
    fn missing_order_yields_empty_cart() {
        let cart: Cart = serde_json::from_str(r#"{"order":null}"#).unwrap();
        assert!(cart.order.is_empty());

        let cart: Cart = serde_json::from_str(r#"{}"#).unwrap();
        assert!(cart.order.is_empty());
    }
}
