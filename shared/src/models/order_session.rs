//! Order Session Model
//!
//! Snapshot of a dine-in session as delivered by the job source. Immutable for
//! the duration of one print cycle.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::serde_helpers::{null_default, timestamp_string};

/// Order session (bill) to be printed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderSession {
    #[serde(deserialize_with = "null_default")]
    pub restaurant_name: String,
    pub restaurant_address: Option<String>,
    #[serde(deserialize_with = "null_default")]
    pub bill_no: String,
    #[serde(deserialize_with = "null_default")]
    pub representative_name: String,
    #[serde(deserialize_with = "null_default")]
    pub representative_phone: String,
    /// Raw creation timestamp, formatted at render time
    #[serde(deserialize_with = "timestamp_string")]
    pub created_at: String,
    #[serde(deserialize_with = "null_default")]
    pub number_of_customers: u32,
    #[serde(deserialize_with = "null_default")]
    pub table_names: Vec<String>,

    // -- Amounts --
    #[serde(deserialize_with = "null_default")]
    pub pretax_payment_amount: Decimal,
    #[serde(deserialize_with = "null_default")]
    pub tax_payment_amount: Decimal,
    #[serde(deserialize_with = "null_default")]
    pub payment_amount: Decimal,
    #[serde(deserialize_with = "null_default")]
    pub customer_paid_amount: Decimal,
    #[serde(deserialize_with = "null_default")]
    pub return_amount: Decimal,

    #[serde(deserialize_with = "null_default")]
    pub order_details: Vec<OrderDetail>,
    /// Order-detail sequence number. Non-zero means the bill is a reprint.
    pub order_detail_number: Option<u32>,
}

/// One ordering round inside a session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderDetail {
    #[serde(deserialize_with = "null_default")]
    pub dish_order: Vec<DishOrder>,
}

/// Dish line item
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DishOrder {
    #[serde(deserialize_with = "null_default")]
    pub dish_name: String,
    #[serde(deserialize_with = "null_default")]
    pub quantity: Decimal,
    /// Unit price
    #[serde(deserialize_with = "null_default")]
    pub price: Decimal,
    #[serde(deserialize_with = "null_default")]
    pub dish_type: String,
    pub note: Option<String>,
}

impl OrderSession {
    /// Reprint sequence number (absent counts as 0)
    pub fn sequence_number(&self) -> u32 {
        self.order_detail_number.unwrap_or(0)
    }

    /// A session with a non-zero sequence number has been printed before
    pub fn is_reprint(&self) -> bool {
        self.sequence_number() > 0
    }

    /// All dish orders, flattened across order details in arrival order
    pub fn dish_orders(&self) -> impl Iterator<Item = &DishOrder> {
        self.order_details.iter().flat_map(|d| d.dish_order.iter())
    }
}
