//! Product catalogue models.

use serde::{Deserialize, Deserializer, Serialize};

use super::{ProductId, UserId};

/// A product as returned by the storefront API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Backend identifier (`_id` on the wire is accepted too).
    #[serde(alias = "_id")]
    pub id: ProductId,
    /// Product title.
    pub title: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Unit price; malformed values coerce to `0.0`.
    #[serde(default, deserialize_with = "lenient_price")]
    pub price: f64,
    /// Category name.
    #[serde(default)]
    pub category: String,
    /// Owning merchant, when the backend includes it as a plain id.
    #[serde(default, deserialize_with = "lenient_merchant", skip_serializing_if = "Option::is_none")]
    pub merchant: Option<UserId>,
}

/// Fields a merchant submits to create or update a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDraft {
    /// Product title.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Unit price.
    pub price: f64,
    /// Category name.
    pub category: String,
}

impl From<&Product> for ProductDraft {
    #[inline]
    fn from(product: &Product) -> Self {
        Self {
            title: product.title.clone(),
            description: product.description.clone(),
            price: product.price,
            category: product.category.clone(),
        }
    }
}

/// Coerces an arbitrary JSON value into a finite price.
///
/// Numbers and numeric strings are accepted; everything else, including
/// `NaN` and infinities, becomes `0.0`.
#[inline]
#[must_use]
pub fn coerce_price(value: &serde_json::Value) -> f64 {
    let raw = match *value {
        serde_json::Value::Number(ref number) => number.as_f64().unwrap_or(0.0_f64),
        serde_json::Value::String(ref text) => text.trim().parse::<f64>().unwrap_or(0.0_f64),
        serde_json::Value::Bool(_)
        | serde_json::Value::Null
        | serde_json::Value::Array(_)
        | serde_json::Value::Object(_) => 0.0_f64,
    };
    if raw.is_finite() { raw } else { 0.0_f64 }
}

/// Deserializes a price without ever failing.
pub(super) fn lenient_price<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(coerce_price(&value))
}

/// Accepts a merchant given as an id string, a populated object with an
/// id, or anything else (ignored).
fn lenient_merchant<'de, D>(deserializer: D) -> Result<Option<UserId>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(id) => Some(UserId::new(id)),
        serde_json::Value::Object(ref fields) => fields
            .get("_id")
            .or_else(|| fields.get("id"))
            .and_then(serde_json::Value::as_str)
            .map(UserId::new),
        serde_json::Value::Null
        | serde_json::Value::Bool(_)
        | serde_json::Value::Number(_)
        | serde_json::Value::Array(_) => None,
    })
}
