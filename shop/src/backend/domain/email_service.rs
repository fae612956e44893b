use anyhow::{anyhow, Context, Result};
use lettre::message::{header::ContentType, Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{Address, Message, SmtpTransport, Transport};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::backend::config::{SmtpConfig, SmtpSecurity};
use shared::{Client, Order};

pub const CONFIRMATION_SUBJECT: &str = "Order Confirmation";

/// Whether a confirmation actually left the process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// No relay configured
    Skipped,
}

/// Sends the order confirmation with the receipt attached.
pub trait OrderNotifier: Send + Sync {
    fn send_order_confirmation(&self, client: &Client, order: &Order, receipt: &Path) -> Result<Delivery>;
}

pub struct EmailService {
    config: SmtpConfig,
    transport: Option<SmtpTransport>,
}

impl EmailService {
    /// Build the service; the SMTP transport is only set up when a relay host
    /// is configured.
    pub fn new(config: SmtpConfig) -> Result<Self> {
        let transport = if config.is_enabled() {
            Some(Self::build_transport(&config)?)
        } else {
            info!("📧 No SMTP host configured, order confirmations will not be emailed");
            None
        };

        Ok(Self { config, transport })
    }

    fn build_transport(config: &SmtpConfig) -> Result<SmtpTransport> {
        info!(
            "📧 Initializing email service for SMTP server: {}:{}",
            config.host, config.port
        );

        let builder = match config.security {
            SmtpSecurity::StartTls => {
                let tls_params = TlsParameters::new(config.host.clone())
                    .context("Failed to create TLS parameters")?;
                SmtpTransport::relay(&config.host)
                    .context("Failed to create SMTP relay")?
                    .tls(Tls::Required(tls_params))
            }
            SmtpSecurity::Tls => {
                let tls_params = TlsParameters::new(config.host.clone())
                    .context("Failed to create TLS parameters")?;
                SmtpTransport::relay(&config.host)
                    .context("Failed to create SMTP relay")?
                    .tls(Tls::Wrapper(tls_params))
            }
            SmtpSecurity::None => SmtpTransport::builder_dangerous(&config.host),
        };

        let mut builder = builder.port(config.port);
        if config.has_credentials() {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ));
        }

        Ok(builder.build())
    }

    /// Build the confirmation message for `client` with `receipt` attached
    pub fn compose_order_confirmation(
        &self,
        client: &Client,
        order: &Order,
        receipt: &Path,
    ) -> Result<Message> {
        let from = self
            .config
            .from
            .parse::<Mailbox>()
            .context("Failed to parse from email")?;
        let to_address = client
            .email
            .parse::<Address>()
            .with_context(|| format!("Failed to parse client email: {}", client.email))?;
        let to = Mailbox::new(Some(client.full_name()), to_address);

        let receipt_bytes = fs::read(receipt)
            .with_context(|| format!("Failed to read receipt {:?}", receipt))?;
        let receipt_name = receipt
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "order.pdf".to_string());
        let pdf_type = ContentType::parse("application/pdf")
            .map_err(|e| anyhow!("Invalid attachment content type: {}", e))?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(CONFIRMATION_SUBJECT)
            .multipart(
                MultiPart::mixed()
                    .singlepart(SinglePart::plain(confirmation_body(client, order)))
                    .singlepart(Attachment::new(receipt_name).body(receipt_bytes, pdf_type)),
            )
            .context("Failed to build email")
    }
}

impl OrderNotifier for EmailService {
    fn send_order_confirmation(&self, client: &Client, order: &Order, receipt: &Path) -> Result<Delivery> {
        let Some(transport) = self.transport.as_ref() else {
            warn!("📧 Email disabled, skipping confirmation for order {}", order.id);
            return Ok(Delivery::Skipped);
        };

        let email = self.compose_order_confirmation(client, order, receipt)?;
        transport.send(&email).context("Failed to send email")?;

        info!("📧 Order confirmation for order {} sent to {}", order.id, client.email);
        Ok(Delivery::Sent)
    }
}

/// Plain-text body: the same fields as the receipt
pub fn confirmation_body(client: &Client, order: &Order) -> String {
    format!(
        "Dear {},\n\nThank you for your order.\nOrder ID: {}\nProduct ID: {}\nQuantity: {}\nTotal Price: {:.2}\n\nBest regards,\nYour Company",
        client.first_name, order.id, order.product_id, order.quantity, order.price
    )
}
