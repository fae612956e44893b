//! # Storage Module
//!
//! Handles all data persistence for the shop manager.
//!
//! The persistence gateway opens one long-lived SQLite handle, makes sure the
//! `products`, `clients` and `orders` tables exist, and exposes parameterised
//! CRUD calls. Callers hand it fields that have already been validated; it
//! binds them positionally and surfaces any connectivity or constraint error
//! as an `anyhow::Error` for the caller to report.

pub mod db;

pub use db::DbConnection;
