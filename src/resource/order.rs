//! Restaurant orders.
//!
//! An order's `total` is always derived from its items. Items arrive loosely
//! typed from the client, so normalization is done on raw JSON values:
//! quantities fall back to 1, and a missing or zero price is looked up in the
//! catalog by SKU.

use super::{Catalog, CollectionRecord};
use crate::error::ServiceError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_CUSTOMER: &str = "Mostrador";
pub const INITIAL_STATUS: &str = "nuevo";
pub const TOTAL_OUT_OF_RANGE: &str = "El total del pedido excede el rango permitido";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct OrderItem {
    pub sku: String,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "precio")]
    pub unit_price: f64,
    #[serde(rename = "cantidad")]
    pub quantity: u32,
}

impl OrderItem {
    pub fn subtotal(&self) -> f64 {
        self.unit_price * f64::from(self.quantity)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Order {
    pub id: String,
    #[serde(rename = "categoria")]
    pub category: String,
    #[serde(rename = "cliente")]
    pub customer: String,
    pub items: Vec<OrderItem>,
    pub total: f64,
    #[serde(rename = "estado")]
    pub status: String,
    #[serde(rename = "creadaEn")]
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize, Debug, Default)]
pub struct OrderDraft {
    #[serde(default, rename = "categoria", alias = "category")]
    pub category: Option<String>,
    #[serde(default, rename = "cliente", alias = "customer")]
    pub customer: Option<String>,
    #[serde(default)]
    pub items: Option<Value>,
}

#[derive(Deserialize, Debug, Default)]
pub struct OrderPatch {
    #[serde(default, rename = "estado", alias = "status")]
    pub status: Option<String>,
    #[serde(default, rename = "cliente", alias = "customer")]
    pub customer: Option<String>,
    #[serde(default, rename = "categoria", alias = "category")]
    pub category: Option<String>,
    #[serde(default)]
    pub items: Option<Value>,
}

/// Sum of `unit_price * quantity` over `items`.
pub fn compute_total(items: &[OrderItem]) -> f64 {
    items.iter().map(OrderItem::subtotal).sum()
}

/// Turn one raw client item into a priced line item.
pub fn normalize_item(raw: &Value, catalog: &Catalog) -> OrderItem {
    let sku = text_field(raw, &["sku"]);
    let mut name = text_field(raw, &["nombre", "name"]);

    let quantity = field(raw, &["cantidad", "quantity"])
        .and_then(as_number)
        .filter(|q| q.fract() == 0.0 && *q >= 1.0 && *q <= f64::from(u32::MAX))
        .map(|q| q as u32)
        .unwrap_or(1);

    let supplied = field(raw, &["precio", "price"])
        .and_then(as_number)
        .filter(|p| *p != 0.0);

    let unit_price = match supplied {
        Some(price) => price,
        None => match catalog.find(&sku) {
            Some(product) => {
                if name.is_empty() {
                    name = product.name.clone();
                }
                product.price
            }
            None => 0.0,
        },
    };

    OrderItem {
        sku,
        name,
        unit_price,
        quantity,
    }
}

pub fn normalize_items(raw: &[Value], catalog: &Catalog) -> Vec<OrderItem> {
    raw.iter().map(|item| normalize_item(item, catalog)).collect()
}

/// Normalize `raw` and total it. A total that overflows `f64` cannot be stored
/// as a JSON number, so it is rejected.
pub fn price_items(raw: &[Value], catalog: &Catalog) -> Result<(Vec<OrderItem>, f64), ServiceError> {
    let items = normalize_items(raw, catalog);
    let total = compute_total(&items);
    if !total.is_finite() {
        return Err(ServiceError::Validation(TOTAL_OUT_OF_RANGE.to_string()));
    }
    Ok((items, total))
}

fn field<'a>(raw: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|k| raw.get(*k))
        .find(|v| !v.is_null())
}

fn text_field(raw: &Value, keys: &[&str]) -> String {
    match field(raw, keys) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// Numbers and numeric strings; NaN and infinities are rejected.
fn as_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl CollectionRecord for Order {
    type Draft = OrderDraft;
    type Patch = OrderPatch;

    const ENVELOPE_KEY: &'static str = "pedido";
    const CREATED_MESSAGE: &'static str = "Pedido creado";
    const UPDATED_MESSAGE: &'static str = "Pedido actualizado";
    const DELETED_MESSAGE: &'static str = "Pedido eliminado";
    const NOT_FOUND_MESSAGE: &'static str = "Pedido no encontrado";
    const HAS_MENU: bool = true;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_draft(
        draft: OrderDraft,
        id: String,
        created_at: DateTime<Utc>,
        catalog: &Catalog,
    ) -> Result<Self, ServiceError> {
        let invalid = || {
            ServiceError::Validation(
                "Debes enviar categoria e items (array con al menos 1 producto)".to_string(),
            )
        };

        let category = non_empty(draft.category).ok_or_else(invalid)?;
        let raw_items = match &draft.items {
            Some(Value::Array(items)) if !items.is_empty() => items,
            _ => return Err(invalid()),
        };

        let (items, total) = price_items(raw_items, catalog)?;

        Ok(Order {
            id,
            category,
            customer: non_empty(draft.customer).unwrap_or_else(|| DEFAULT_CUSTOMER.to_string()),
            items,
            total,
            status: INITIAL_STATUS.to_string(),
            created_at,
        })
    }

    fn apply_patch(&mut self, patch: OrderPatch, catalog: &Catalog) -> Result<(), ServiceError> {
        // A supplied list replaces items and total wholesale; anything else keeps both.
        // Priced first so a rejected patch leaves the order untouched.
        let priced = match &patch.items {
            Some(Value::Array(raw_items)) => Some(price_items(raw_items, catalog)?),
            _ => None,
        };

        if let Some(status) = non_empty(patch.status) {
            self.status = status;
        }
        if let Some(customer) = non_empty(patch.customer) {
            self.customer = customer;
        }
        if let Some(category) = non_empty(patch.category) {
            self.category = category;
        }
        if let Some((items, total)) = priced {
            self.items = items;
            self.total = total;
        }
        Ok(())
    }
}
