use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Format used for order timestamps in storage, CSV exports and receipts.
pub const ORDER_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A catalog entry. Rows are never physically deleted; `active == false`
/// marks a soft-deleted product that still backs historical orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub title: String,
    pub description: String,
    /// Unit price, rounded to 2 decimal places before it is stored
    pub price: f64,
    /// Units in stock (never negative)
    pub quantity: i64,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    /// Digits only
    pub phone: String,
    pub address: String,
    pub email: String,
}

impl Client {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// An order links one client to one product. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub client_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    /// Line total snapshotted at order time (unit price x quantity)
    pub price: f64,
    pub order_date: NaiveDateTime,
}

impl Order {
    pub fn formatted_date(&self) -> String {
        self.order_date.format(ORDER_DATE_FORMAT).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_order_date_formatting() {
        let order = Order {
            id: 1,
            client_id: 2,
            product_id: 3,
            quantity: 2,
            price: 20.0,
            order_date: NaiveDate::from_ymd_opt(2024, 3, 9)
                .unwrap()
                .and_hms_opt(14, 5, 7)
                .unwrap(),
        };

        assert_eq!(order.formatted_date(), "2024-03-09 14:05:07");
    }

    #[test]
    fn test_client_full_name() {
        let client = Client {
            id: 1,
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            phone: "5551234".to_string(),
            address: "1 Main St".to_string(),
            email: "jane@example.com".to_string(),
        };

        assert_eq!(client.full_name(), "Jane Doe");
    }
}
