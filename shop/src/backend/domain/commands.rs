//! Domain-level command and result types
//! These structs are built by the interactive shell from validated prompt
//! input and consumed by the services. They never travel past the process.

/// Result of an unconditional overwrite-by-id. Updating an id that does not
/// exist succeeds with `rows_affected == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub rows_affected: u64,
}

impl UpdateOutcome {
    pub fn matched(&self) -> bool {
        self.rows_affected > 0
    }
}

pub mod products {
    /// Input for adding a catalog entry.
    #[derive(Debug, Clone)]
    pub struct CreateProductCommand {
        pub title: String,
        pub description: String,
        pub price: f64,
        pub quantity: i64,
    }

    /// Input for overwriting a catalog entry.
    #[derive(Debug, Clone)]
    pub struct UpdateProductCommand {
        pub product_id: i64,
        pub title: String,
        pub description: String,
        pub price: f64,
        pub quantity: i64,
    }
}

pub mod clients {
    /// Input for registering a client.
    #[derive(Debug, Clone)]
    pub struct CreateClientCommand {
        pub first_name: String,
        pub last_name: String,
        pub phone: String,
        pub address: String,
        pub email: String,
    }

    /// Input for overwriting a client.
    #[derive(Debug, Clone)]
    pub struct UpdateClientCommand {
        pub client_id: i64,
        pub first_name: String,
        pub last_name: String,
        pub phone: String,
        pub address: String,
        pub email: String,
    }
}

pub mod orders {
    use std::path::PathBuf;

    use crate::backend::domain::email_service::Delivery;
    use shared::Order;

    /// Input for placing an order.
    #[derive(Debug, Clone, Copy)]
    pub struct PlaceOrderCommand {
        pub client_id: i64,
        pub product_id: i64,
        pub quantity: i64,
    }

    /// Everything the order workflow produced.
    #[derive(Debug, Clone)]
    pub struct PlacedOrder {
        pub order: Order,
        pub receipt_path: PathBuf,
        pub delivery: Delivery,
    }
}
