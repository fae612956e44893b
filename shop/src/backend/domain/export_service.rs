//! CSV export for the shop manager.
//!
//! Dumps the full product catalog (active and inactive rows), the client
//! roster and the order history to fixed file names in the configured output
//! directory. Each export overwrites the previous file and starts with a
//! header row. Numbers use their default `Display` form, so a price of
//! `20.0` is written as `20`.

use anyhow::{Context, Result};
use csv::Writer;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::{error, info};

use crate::backend::domain::client_service::ClientService;
use crate::backend::domain::order_service::OrderService;
use crate::backend::domain::product_service::ProductService;
use shared::{Client, Order, Product};

pub const PRODUCTS_FILE_NAME: &str = "products.csv";
pub const CLIENTS_FILE_NAME: &str = "clients.csv";
pub const ORDERS_FILE_NAME: &str = "orders.csv";

const PRODUCT_HEADER: [&str; 5] = ["ID", "Title", "Description", "Price", "Quantity"];
const CLIENT_HEADER: [&str; 6] = ["ID", "First Name", "Last Name", "Phone", "Address", "Email"];
const ORDER_HEADER: [&str; 6] = ["ID", "Client ID", "Product ID", "Quantity", "Price", "Order Date"];

/// What an export wrote
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub row_count: usize,
}

/// Export service that writes the three tables to CSV files
#[derive(Debug, Clone)]
pub struct ExportService {
    output_dir: PathBuf,
}

impl ExportService {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Export every product, including deactivated ones, to `products.csv`
    pub async fn export_products(&self, product_service: &ProductService) -> Result<ExportSummary> {
        info!("📄 EXPORT: Exporting products");
        let products = product_service.list_products().await?;
        self.write_file(PRODUCTS_FILE_NAME, products.len(), |writer| {
            write_products_csv(writer, &products)
        })
    }

    pub async fn export_clients(&self, client_service: &ClientService) -> Result<ExportSummary> {
        info!("📄 EXPORT: Exporting clients");
        let clients = client_service.list_clients().await?;
        self.write_file(CLIENTS_FILE_NAME, clients.len(), |writer| {
            write_clients_csv(writer, &clients)
        })
    }

    pub async fn export_orders(&self, order_service: &OrderService) -> Result<ExportSummary> {
        info!("📄 EXPORT: Exporting orders");
        let orders = order_service.list_orders().await?;
        self.write_file(ORDERS_FILE_NAME, orders.len(), |writer| {
            write_orders_csv(writer, &orders)
        })
    }

    fn write_file<F>(&self, file_name: &str, row_count: usize, write_rows: F) -> Result<ExportSummary>
    where
        F: FnOnce(&mut BufWriter<File>) -> Result<()>,
    {
        fs::create_dir_all(&self.output_dir)
            .with_context(|| format!("Failed to create export directory {:?}", self.output_dir))?;

        let path = self.output_dir.join(file_name);
        let file = File::create(&path).with_context(|| format!("Failed to create {:?}", path))?;
        let mut writer = BufWriter::new(file);

        if let Err(e) = write_rows(&mut writer).and_then(|_| writer.flush().map_err(Into::into)) {
            error!("❌ EXPORT: Failed to write {:?}: {}", path, e);
            return Err(e);
        }

        info!("✅ EXPORT: Wrote {} rows to {:?}", row_count, path);
        Ok(ExportSummary { path, row_count })
    }
}

pub fn write_products_csv<W: Write>(writer: W, products: &[Product]) -> Result<()> {
    let mut csv_writer = Writer::from_writer(writer);
    csv_writer.write_record(PRODUCT_HEADER)?;

    for product in products {
        csv_writer.write_record([
            product.id.to_string(),
            product.title.clone(),
            product.description.clone(),
            product.price.to_string(),
            product.quantity.to_string(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}

pub fn write_clients_csv<W: Write>(writer: W, clients: &[Client]) -> Result<()> {
    let mut csv_writer = Writer::from_writer(writer);
    csv_writer.write_record(CLIENT_HEADER)?;

    for client in clients {
        csv_writer.write_record([
            client.id.to_string(),
            client.first_name.clone(),
            client.last_name.clone(),
            client.phone.clone(),
            client.address.clone(),
            client.email.clone(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}

pub fn write_orders_csv<W: Write>(writer: W, orders: &[Order]) -> Result<()> {
    let mut csv_writer = Writer::from_writer(writer);
    csv_writer.write_record(ORDER_HEADER)?;

    for order in orders {
        csv_writer.write_record([
            order.id.to_string(),
            order.client_id.to_string(),
            order.product_id.to_string(),
            order.quantity.to_string(),
            order.price.to_string(),
            order.formatted_date(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}
