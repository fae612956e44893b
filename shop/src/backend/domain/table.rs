//! Plain-text tables for the product and client listings.
//!
//! Columns are padded to their widest cell and separated by `|`, with a
//! dashed rule under the header. Cell widths count characters, not bytes.

use shared::{Client, Product};

const PRODUCT_COLUMNS: [&str; 5] = ["ID", "Title", "Description", "Price", "Quantity"];
const CLIENT_COLUMNS: [&str; 6] = ["ID", "First Name", "Last Name", "Phone", "Address", "Email"];

#[derive(Debug, Clone, PartialEq)]
pub struct TextTable {
    rows: Vec<Vec<String>>,
}

impl TextTable {
    pub fn new(headers: &[&str]) -> Self {
        let header: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
        let rule: Vec<String> = headers.iter().map(|h| "-".repeat(h.chars().count())).collect();
        Self {
            rows: vec![header, rule],
        }
    }

    pub fn push_row(&mut self, cells: Vec<String>) {
        self.rows.push(cells);
    }

    /// Number of data rows, excluding the header and rule
    pub fn len(&self) -> usize {
        self.rows.len() - 2
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn render(&self) -> String {
        let columns = self.rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut widths = vec![0usize; columns];
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        let mut out = String::new();
        for row in &self.rows {
            let line: Vec<String> = row
                .iter()
                .enumerate()
                .map(|(i, cell)| format!("{:<width$}", cell, width = widths[i]))
                .collect();
            out.push_str(line.join(" |").trim_end());
            out.push('\n');
        }
        out
    }
}

pub fn products_table(products: &[Product]) -> TextTable {
    let mut table = TextTable::new(&PRODUCT_COLUMNS);
    for product in products {
        table.push_row(vec![
            product.id.to_string(),
            product.title.clone(),
            product.description.clone(),
            format!("{:.2}", product.price),
            product.quantity.to_string(),
        ]);
    }
    table
}

pub fn clients_table(clients: &[Client]) -> TextTable {
    let mut table = TextTable::new(&CLIENT_COLUMNS);
    for client in clients {
        table.push_row(vec![
            client.id.to_string(),
            client.first_name.clone(),
            client.last_name.clone(),
            client.phone.clone(),
            client.address.clone(),
            client.email.clone(),
        ]);
    }
    table
}
