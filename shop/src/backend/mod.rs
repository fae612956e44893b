//! # Backend Module
//!
//! Wires configuration, storage and the domain services together for the
//! interactive shell.
//!
//! ## Layers
//!
//! - **storage**: the SQLite gateway
//! - **domain**: services, validation and the order workflow
//! - **io**: prompts and the menu loop
//! - **config**: file, environment and command-line settings

pub mod config;
pub mod domain;
pub mod io;
pub mod storage;

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::backend::config::AppConfig;
use crate::backend::domain::{
    ClientService, EmailService, ExportService, OrderNotifier, OrderService, ProductService,
    ReceiptService,
};
use crate::backend::storage::DbConnection;

/// Main application state that holds all services
#[derive(Clone)]
pub struct AppState {
    pub product_service: ProductService,
    pub client_service: ClientService,
    pub order_service: OrderService,
    pub export_service: ExportService,
}

impl AppState {
    pub fn new(db: Arc<DbConnection>, output_dir: &Path, notifier: Arc<dyn OrderNotifier>) -> Self {
        Self {
            product_service: ProductService::new(db.clone()),
            client_service: ClientService::new(db.clone()),
            order_service: OrderService::new(db, ReceiptService::new(output_dir), notifier),
            export_service: ExportService::new(output_dir),
        }
    }
}

/// Initialize the backend with all required services
pub async fn initialize_backend(config: &AppConfig) -> Result<AppState> {
    info!("Setting up database at {}", config.database.url);
    let db_conn = Arc::new(DbConnection::new(&config.database.url).await?);

    info!("Setting up email service");
    let email_service = EmailService::new(config.smtp.clone())?;

    info!("Setting up application state");
    Ok(AppState::new(
        db_conn,
        &config.output.directory,
        Arc::new(email_service),
    ))
}
