use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

use crate::backend::domain::commands::clients::{CreateClientCommand, UpdateClientCommand};
use crate::backend::domain::commands::UpdateOutcome;
use crate::backend::domain::validation::{self, ValidationError};
use crate::backend::storage::DbConnection;
use shared::Client;

/// Service for managing the client roster
#[derive(Clone)]
pub struct ClientService {
    db: Arc<DbConnection>,
}

/// Client fields after trimming and validation
struct ClientFields {
    first_name: String,
    last_name: String,
    phone: String,
    address: String,
    email: String,
}

impl ClientService {
    /// Create a new ClientService
    pub fn new(db: Arc<DbConnection>) -> Self {
        Self { db }
    }

    /// Register a new client. Duplicate emails are allowed.
    pub async fn add_client(&self, command: CreateClientCommand) -> Result<Client> {
        info!("Adding client: {} {}", command.first_name, command.last_name);

        let fields = Self::validate(
            &command.first_name,
            &command.last_name,
            &command.phone,
            &command.address,
            &command.email,
        )?;

        let id = self
            .db
            .store_client(
                &fields.first_name,
                &fields.last_name,
                &fields.phone,
                &fields.address,
                &fields.email,
            )
            .await
            .context("Failed to store client")?;

        info!("Added client {} {} with ID: {}", fields.first_name, fields.last_name, id);

        Ok(Client {
            id,
            first_name: fields.first_name,
            last_name: fields.last_name,
            phone: fields.phone,
            address: fields.address,
            email: fields.email,
        })
    }

    /// Get a client by ID
    pub async fn get_client(&self, client_id: i64) -> Result<Option<Client>> {
        let client = self.db.get_client(client_id).await?;

        if client.is_none() {
            warn!("Client not found: {}", client_id);
        }

        Ok(client)
    }

    /// List all clients
    pub async fn list_clients(&self) -> Result<Vec<Client>> {
        let clients = self.db.list_clients().await.context("Failed to list clients")?;
        info!("Found {} clients", clients.len());
        Ok(clients)
    }

    /// Overwrite every field of a client by ID; unknown IDs are a no-op
    pub async fn update_client(&self, command: UpdateClientCommand) -> Result<UpdateOutcome> {
        info!("Updating client: {}", command.client_id);

        let fields = Self::validate(
            &command.first_name,
            &command.last_name,
            &command.phone,
            &command.address,
            &command.email,
        )?;

        let rows_affected = self
            .db
            .update_client(
                command.client_id,
                &fields.first_name,
                &fields.last_name,
                &fields.phone,
                &fields.address,
                &fields.email,
            )
            .await
            .context("Failed to update client")?;

        if rows_affected == 0 {
            warn!("Update matched no client with ID: {}", command.client_id);
        }

        Ok(UpdateOutcome { rows_affected })
    }

    fn validate(
        first_name: &str,
        last_name: &str,
        phone: &str,
        address: &str,
        email: &str,
    ) -> Result<ClientFields, ValidationError> {
        Ok(ClientFields {
            first_name: validation::require_text("First name", first_name)?,
            last_name: validation::require_text("Last name", last_name)?,
            phone: validation::parse_phone(phone)?,
            address: validation::require_text("Address", address)?,
            email: validation::parse_email(email)?,
        })
    }
}
