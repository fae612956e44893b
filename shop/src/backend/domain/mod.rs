//! # Domain Module
//!
//! Business logic for the shop manager: the catalog, the client roster and
//! the order workflow, plus the file and mail side effects that hang off
//! them. Nothing here knows about the terminal; the interactive shell in
//! `io` builds commands and hands them to these services.
//!
//! ## Module Organization
//!
//! - **validation**: field parsers and the phone/email/price rules
//! - **commands**: command and result types passed between shell and services
//! - **product_service** / **client_service**: catalog and roster CRUD
//! - **order_service**: the order placement workflow
//! - **receipt_service**: PDF receipt rendering
//! - **email_service**: order confirmation mail over SMTP
//! - **export_service**: CSV dumps of the three tables
//! - **table**: text tables for the listing commands

pub mod client_service;
pub mod commands;
pub mod email_service;
pub mod export_service;
pub mod order_service;
pub mod product_service;
pub mod receipt_service;
pub mod table;
pub mod validation;

pub use client_service::ClientService;
pub use email_service::{EmailService, OrderNotifier};
pub use export_service::{ExportService, ExportSummary};
pub use order_service::{OrderError, OrderService};
pub use product_service::ProductService;
pub use receipt_service::ReceiptService;
pub use validation::ValidationError;
