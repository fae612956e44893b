//! Order placement workflow.
//!
//! Checks that the client and product exist, snapshots the line total,
//! persists the order, writes the PDF receipt and emails it to the client.
//! The first failing step ends the workflow. Once the order row is inserted
//! it is kept even if the receipt or the email fails afterwards; those
//! errors carry the id of the stored order.

use anyhow::Context;
use chrono::Local;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::backend::domain::commands::orders::{PlaceOrderCommand, PlacedOrder};
use crate::backend::domain::email_service::OrderNotifier;
use crate::backend::domain::receipt_service::ReceiptService;
use crate::backend::domain::validation::round_to;
use crate::backend::storage::DbConnection;
use shared::Order;

#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Client ID {0} does not exist")]
    ClientNotFound(i64),
    #[error("Product ID {0} does not exist")]
    ProductNotFound(i64),
    #[error("Order could not be stored: {0:#}")]
    Storage(#[from] anyhow::Error),
    #[error("Order {order_id} was stored but the receipt failed: {source:#}")]
    Receipt {
        order_id: i64,
        source: anyhow::Error,
    },
    #[error("Order {order_id} was stored but the confirmation email failed: {source:#}")]
    Notification {
        order_id: i64,
        source: anyhow::Error,
    },
}

impl OrderError {
    /// Id of the order row that was persisted before the failure, if any
    pub fn stored_order_id(&self) -> Option<i64> {
        match self {
            OrderError::Receipt { order_id, .. } | OrderError::Notification { order_id, .. } => {
                Some(*order_id)
            }
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct OrderService {
    db: Arc<DbConnection>,
    receipts: ReceiptService,
    notifier: Arc<dyn OrderNotifier>,
}

impl OrderService {
    pub fn new(
        db: Arc<DbConnection>,
        receipts: ReceiptService,
        notifier: Arc<dyn OrderNotifier>,
    ) -> Self {
        Self {
            db,
            receipts,
            notifier,
        }
    }

    pub async fn place_order(&self, command: PlaceOrderCommand) -> Result<PlacedOrder, OrderError> {
        let PlaceOrderCommand {
            client_id,
            product_id,
            quantity,
        } = command;
        info!(
            "🛒 Placing order: client {} product {} quantity {}",
            client_id, product_id, quantity
        );

        let client = match self.db.get_client(client_id).await? {
            Some(client) => client,
            None => {
                warn!("Order rejected, client not found: {}", client_id);
                return Err(OrderError::ClientNotFound(client_id));
            }
        };

        let product = match self.db.get_product(product_id).await? {
            Some(product) => product,
            None => {
                warn!("Order rejected, product not found: {}", product_id);
                return Err(OrderError::ProductNotFound(product_id));
            }
        };

        let price = round_to(product.price * quantity as f64, 2);
        let order_date = Local::now().naive_local();

        let order_id = self
            .db
            .store_order(client_id, product_id, quantity, price, order_date)
            .await
            .context("Failed to store order")?;
        info!("✅ Stored order {} with total {:.2}", order_id, price);

        // Round-trip through the text column so the returned date matches what
        // a later read of the row yields.
        let order = stored_or_local(
            self.db.get_order(order_id).await,
            Order {
                id: order_id,
                client_id,
                product_id,
                quantity,
                price,
                order_date,
            },
        );

        let receipt = self.receipts.write_receipt(&order).map_err(|source| {
            error!("❌ Receipt generation failed for order {}: {:#}", order_id, source);
            OrderError::Receipt { order_id, source }
        })?;

        let notifier = Arc::clone(&self.notifier);
        let attachment = receipt.temp_path().to_path_buf();
        let (mail_client, mail_order) = (client.clone(), order.clone());
        let delivery = tokio::task::spawn_blocking(move || {
            notifier.send_order_confirmation(&mail_client, &mail_order, &attachment)
        })
        .await
        .map_err(anyhow::Error::from)
        .and_then(|result| result)
        .map_err(|source| {
            error!("❌ Confirmation email failed for order {}: {:#}", order_id, source);
            OrderError::Notification { order_id, source }
        })?;

        Ok(PlacedOrder {
            order,
            receipt_path: receipt.path.clone(),
            delivery,
        })
    }

    pub async fn list_orders(&self) -> anyhow::Result<Vec<Order>> {
        let orders = self.db.list_orders().await.context("Failed to list orders")?;
        info!("Found {} orders", orders.len());
        Ok(orders)
    }
}

/// The row as read back after the insert, or `local` when the read fails
/// or finds nothing.
fn stored_or_local(read_back: anyhow::Result<Option<Order>>, local: Order) -> Order {
    match read_back {
        Ok(Some(order)) => order,
        Ok(None) => {
            warn!("Order {} missing right after insert", local.id);
            local
        }
        Err(e) => {
            warn!("Could not re-read order {}: {:#}", local.id, e);
            local
        }
    }
}
