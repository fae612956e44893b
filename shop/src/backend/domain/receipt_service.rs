//! Order receipt generation.
//!
//! Produces a single-page A4 PDF with a bold title followed by one line per
//! order field. The document is written to `order.pdf` in the output
//! directory and, with identical bytes, to a temporary file that the email
//! step attaches.

use anyhow::{anyhow, Context, Result};
use printpdf::{BuiltinFont, Mm, PdfDocument};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

use shared::Order;

pub const RECEIPT_FILE_NAME: &str = "order.pdf";
const RECEIPT_TITLE: &str = "Order Confirmation";

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const LEFT_MARGIN_MM: f32 = 10.0;
const TOP_MM: f32 = 280.0;
const TITLE_GAP_MM: f32 = 12.0;
const LINE_GAP_MM: f32 = 10.0;

/// A written receipt. The temporary copy is removed when this is dropped.
#[derive(Debug)]
pub struct Receipt {
    pub path: PathBuf,
    temp_file: NamedTempFile,
}

impl Receipt {
    pub fn temp_path(&self) -> &Path {
        self.temp_file.path()
    }
}

#[derive(Debug, Clone)]
pub struct ReceiptService {
    output_dir: PathBuf,
}

impl ReceiptService {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// The text lines printed below the title
    pub fn receipt_lines(order: &Order) -> Vec<String> {
        vec![
            format!("Order ID: {}", order.id),
            format!("Client ID: {}", order.client_id),
            format!("Product ID: {}", order.product_id),
            format!("Quantity: {}", order.quantity),
            format!("Total Price: {:.2}", order.price),
        ]
    }

    /// Render the receipt PDF in memory
    pub fn render(&self, order: &Order) -> Result<Vec<u8>> {
        let (doc, page, layer) = PdfDocument::new(
            RECEIPT_TITLE,
            Mm(PAGE_WIDTH_MM),
            Mm(PAGE_HEIGHT_MM),
            "Receipt",
        );
        let title_font = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| anyhow!("Failed to load title font: {:?}", e))?;
        let body_font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| anyhow!("Failed to load body font: {:?}", e))?;

        let canvas = doc.get_page(page).get_layer(layer);
        canvas.use_text(RECEIPT_TITLE, 16.0, Mm(LEFT_MARGIN_MM), Mm(TOP_MM), &title_font);

        let mut y = TOP_MM - TITLE_GAP_MM;
        for line in Self::receipt_lines(order) {
            canvas.use_text(line, 12.0, Mm(LEFT_MARGIN_MM), Mm(y), &body_font);
            y -= LINE_GAP_MM;
        }

        doc.save_to_bytes()
            .map_err(|e| anyhow!("Failed to render receipt PDF: {:?}", e))
    }

    /// Write the receipt to the output directory and to a temporary file
    pub fn write_receipt(&self, order: &Order) -> Result<Receipt> {
        let bytes = self.render(order)?;

        fs::create_dir_all(&self.output_dir)
            .with_context(|| format!("Failed to create output directory {:?}", self.output_dir))?;
        let path = self.output_dir.join(RECEIPT_FILE_NAME);
        fs::write(&path, &bytes).with_context(|| format!("Failed to write receipt {:?}", path))?;

        let mut temp_file = tempfile::Builder::new()
            .prefix("order_confirmation_")
            .suffix(".pdf")
            .tempfile()
            .context("Could not create temporary receipt file")?;
        temp_file
            .write_all(&bytes)
            .context("Could not save receipt to temporary file")?;
        temp_file.flush()?;

        info!("🧾 Receipt for order {} written to {:?}", order.id, path);

        Ok(Receipt { path, temp_file })
    }
}
