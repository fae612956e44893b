//! The interactive menu loop.
//!
//! Prints the twelve-entry menu, reads a choice and runs the matching
//! operation against the services in [`AppState`]. Operation failures are
//! printed and the loop continues; only end of input, an I/O failure on the
//! terminal or the Exit entry stop it.

use anyhow::Result;
use std::io::{BufRead, Write};
use tracing::{error, info};

use crate::backend::domain::commands::clients::{CreateClientCommand, UpdateClientCommand};
use crate::backend::domain::commands::orders::PlaceOrderCommand;
use crate::backend::domain::commands::products::{CreateProductCommand, UpdateProductCommand};
use crate::backend::domain::email_service::Delivery;
use crate::backend::domain::table;
use crate::backend::domain::validation;
use crate::backend::io::prompt::{PromptError, Prompter};
use crate::backend::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuOption {
    AddProduct,
    DisplayProducts,
    ModifyProduct,
    DeactivateProduct,
    ExportProducts,
    AddClient,
    DisplayClients,
    ModifyClient,
    ExportClients,
    MakeOrder,
    ExportOrders,
    Exit,
}

impl MenuOption {
    pub const ALL: [MenuOption; 12] = [
        MenuOption::AddProduct,
        MenuOption::DisplayProducts,
        MenuOption::ModifyProduct,
        MenuOption::DeactivateProduct,
        MenuOption::ExportProducts,
        MenuOption::AddClient,
        MenuOption::DisplayClients,
        MenuOption::ModifyClient,
        MenuOption::ExportClients,
        MenuOption::MakeOrder,
        MenuOption::ExportOrders,
        MenuOption::Exit,
    ];

    /// Map a raw menu line to an entry; anything but 1..=12 is `None`
    pub fn from_choice(input: &str) -> Option<Self> {
        let number = input.trim().parse::<usize>().ok()?;
        number
            .checked_sub(1)
            .and_then(|index| Self::ALL.get(index))
            .copied()
    }

    pub fn label(&self) -> &'static str {
        match self {
            MenuOption::AddProduct => "Add Product",
            MenuOption::DisplayProducts => "Display Products",
            MenuOption::ModifyProduct => "Modify Product",
            MenuOption::DeactivateProduct => "Deactivate Product",
            MenuOption::ExportProducts => "Export Products to CSV",
            MenuOption::AddClient => "Add Client",
            MenuOption::DisplayClients => "Display Clients",
            MenuOption::ModifyClient => "Modify Client",
            MenuOption::ExportClients => "Export Clients to CSV",
            MenuOption::MakeOrder => "Make an Order",
            MenuOption::ExportOrders => "Export Orders to CSV",
            MenuOption::Exit => "Exit",
        }
    }
}

pub struct Shell<R, W> {
    prompter: Prompter<R, W>,
    state: AppState,
}

impl<R: BufRead, W: Write> Shell<R, W> {
    pub fn new(state: AppState, input: R, output: W) -> Self {
        Self {
            prompter: Prompter::new(input, output),
            state,
        }
    }

    pub async fn run(&mut self) -> Result<(), PromptError> {
        loop {
            self.print_menu()?;

            let Some(choice) = self.prompter.read_choice()? else {
                info!("Input closed, leaving the menu");
                return Ok(());
            };

            let option = match MenuOption::from_choice(&choice) {
                Some(MenuOption::Exit) => {
                    self.prompter.farewell("Exiting program.")?;
                    return Ok(());
                }
                Some(option) => option,
                None => {
                    self.prompter.notice("Invalid option. Please try again.")?;
                    continue;
                }
            };

            if let Err(e) = self.dispatch(option).await {
                match e.downcast::<PromptError>() {
                    Ok(PromptError::Aborted) => {
                        info!("Input closed during {:?}", option);
                        return Ok(());
                    }
                    Ok(io_error) => return Err(io_error),
                    Err(e) => {
                        error!("❌ {} failed: {:#}", option.label(), e);
                        self.prompter.failure(&format!("Error: {:#}", e))?;
                    }
                }
            }
        }
    }

    pub fn into_output(self) -> W {
        self.prompter.into_output()
    }

    fn print_menu(&mut self) -> Result<(), PromptError> {
        self.prompter.line("Menu:")?;
        for (i, option) in MenuOption::ALL.iter().enumerate() {
            self.prompter.line(format!("{}. {}", i + 1, option.label()))?;
        }
        Ok(())
    }

    async fn dispatch(&mut self, option: MenuOption) -> Result<()> {
        match option {
            MenuOption::AddProduct => self.add_product().await,
            MenuOption::DisplayProducts => self.display_products().await,
            MenuOption::ModifyProduct => self.modify_product().await,
            MenuOption::DeactivateProduct => self.deactivate_product().await,
            MenuOption::ExportProducts => {
                let summary = self
                    .state
                    .export_service
                    .export_products(&self.state.product_service)
                    .await?;
                self.prompter.success(&format!(
                    "Products exported to CSV successfully ({} rows in {}).",
                    summary.row_count,
                    summary.path.display()
                ))?;
                Ok(())
            }
            MenuOption::AddClient => self.add_client().await,
            MenuOption::DisplayClients => self.display_clients().await,
            MenuOption::ModifyClient => self.modify_client().await,
            MenuOption::ExportClients => {
                let summary = self
                    .state
                    .export_service
                    .export_clients(&self.state.client_service)
                    .await?;
                self.prompter.success(&format!(
                    "Clients exported to CSV successfully ({} rows in {}).",
                    summary.row_count,
                    summary.path.display()
                ))?;
                Ok(())
            }
            MenuOption::MakeOrder => self.make_order().await,
            MenuOption::ExportOrders => {
                let summary = self
                    .state
                    .export_service
                    .export_orders(&self.state.order_service)
                    .await?;
                self.prompter.success(&format!(
                    "Orders exported to CSV successfully ({} rows in {}).",
                    summary.row_count,
                    summary.path.display()
                ))?;
                Ok(())
            }
            // Handled by the loop before dispatch
            MenuOption::Exit => Ok(()),
        }
    }

    fn ask_product_fields(&mut self, prefix: &str) -> Result<(String, String, f64, i64), PromptError> {
        let title = self.prompter.ask(&format!("Enter {} title:", prefix), |s| {
            validation::require_text("Title", s)
        })?;
        let description = self.prompter.ask(&format!("Enter {} description:", prefix), |s| {
            validation::require_text("Description", s)
        })?;
        let price = self
            .prompter
            .ask(&format!("Enter {} price:", prefix), validation::parse_price)?;
        let quantity = self
            .prompter
            .ask(&format!("Enter {} quantity:", prefix), validation::parse_stock_quantity)?;
        Ok((title, description, price, quantity))
    }

    async fn add_product(&mut self) -> Result<()> {
        let (title, description, price, quantity) = self.ask_product_fields("product")?;

        self.state
            .product_service
            .add_product(CreateProductCommand {
                title,
                description,
                price,
                quantity,
            })
            .await?;

        self.prompter.success("Product added successfully.")?;
        Ok(())
    }

    async fn display_products(&mut self) -> Result<()> {
        let products = self.state.product_service.list_active_products().await?;
        self.prompter.line("List of Products:")?;
        self.prompter.write_raw(&table::products_table(&products).render())?;
        Ok(())
    }

    async fn modify_product(&mut self) -> Result<()> {
        let product_id = self
            .prompter
            .ask("Enter product ID to modify:", |s| validation::parse_id("product ID", s))?;
        let (title, description, price, quantity) = self.ask_product_fields("new")?;

        let outcome = self
            .state
            .product_service
            .update_product(UpdateProductCommand {
                product_id,
                title,
                description,
                price,
                quantity,
            })
            .await?;

        if outcome.matched() {
            self.prompter.success("Product modified successfully.")?;
        } else {
            self.prompter
                .notice(&format!("No product with ID {}; nothing was changed.", product_id))?;
        }
        Ok(())
    }

    async fn deactivate_product(&mut self) -> Result<()> {
        let product_id = self
            .prompter
            .ask("Enter product ID to deactivate:", |s| validation::parse_id("product ID", s))?;

        let outcome = self.state.product_service.deactivate_product(product_id).await?;

        if outcome.matched() {
            self.prompter.success("Product deactivated successfully.")?;
        } else {
            self.prompter
                .notice(&format!("No product with ID {}; nothing was changed.", product_id))?;
        }
        Ok(())
    }

    fn ask_client_fields(&mut self, prefix: &str) -> Result<CreateClientCommand, PromptError> {
        let first_name = self.prompter.ask(&format!("Enter {} first name:", prefix), |s| {
            validation::require_text("First name", s)
        })?;
        let last_name = self.prompter.ask(&format!("Enter {} last name:", prefix), |s| {
            validation::require_text("Last name", s)
        })?;
        let phone = self
            .prompter
            .ask(&format!("Enter {} phone number:", prefix), validation::parse_phone)?;
        let address = self.prompter.ask(&format!("Enter {} address:", prefix), |s| {
            validation::require_text("Address", s)
        })?;
        let email = self
            .prompter
            .ask(&format!("Enter {} email:", prefix), validation::parse_email)?;

        Ok(CreateClientCommand {
            first_name,
            last_name,
            phone,
            address,
            email,
        })
    }

    async fn add_client(&mut self) -> Result<()> {
        let command = self.ask_client_fields("client")?;
        self.state.client_service.add_client(command).await?;
        self.prompter.success("Client added successfully.")?;
        Ok(())
    }

    async fn display_clients(&mut self) -> Result<()> {
        let clients = self.state.client_service.list_clients().await?;
        self.prompter.line("List of Clients:")?;
        self.prompter.write_raw(&table::clients_table(&clients).render())?;
        Ok(())
    }

    async fn modify_client(&mut self) -> Result<()> {
        let client_id = self
            .prompter
            .ask("Enter client ID to modify:", |s| validation::parse_id("client ID", s))?;
        let fields = self.ask_client_fields("new")?;

        let outcome = self
            .state
            .client_service
            .update_client(UpdateClientCommand {
                client_id,
                first_name: fields.first_name,
                last_name: fields.last_name,
                phone: fields.phone,
                address: fields.address,
                email: fields.email,
            })
            .await?;

        if outcome.matched() {
            self.prompter.success("Client modified successfully.")?;
        } else {
            self.prompter
                .notice(&format!("No client with ID {}; nothing was changed.", client_id))?;
        }
        Ok(())
    }

    async fn make_order(&mut self) -> Result<()> {
        let client_id = self
            .prompter
            .ask("Enter client ID:", |s| validation::parse_id("client ID", s))?;
        let product_id = self
            .prompter
            .ask("Enter product ID:", |s| validation::parse_id("product ID", s))?;
        let quantity = self
            .prompter
            .ask("Enter quantity:", validation::parse_order_quantity)?;

        let placed = self
            .state
            .order_service
            .place_order(PlaceOrderCommand {
                client_id,
                product_id,
                quantity,
            })
            .await?;

        self.prompter.success(&format!(
            "Order PDF generated successfully ({}).",
            placed.receipt_path.display()
        ))?;
        match placed.delivery {
            Delivery::Sent => self
                .prompter
                .success("Order confirmation email sent successfully.")?,
            Delivery::Skipped => self
                .prompter
                .notice("Email is not configured; no confirmation was sent.")?,
        }
        self.prompter.success(&format!(
            "Order {} placed successfully. Total: {:.2}",
            placed.order.id, placed.order.price
        ))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::config::SmtpConfig;
    use crate::backend::domain::email_service::EmailService;
    use crate::backend::storage::DbConnection;
    use std::io::Cursor;
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn setup_test() -> (AppState, TempDir) {
        colored::control::set_override(false);
        let dir = tempfile::tempdir().unwrap();
        let db = Arc::new(DbConnection::init_test().await.expect("Failed to create test database"));
        let notifier = Arc::new(EmailService::new(SmtpConfig::default()).unwrap());
        (AppState::new(db, dir.path(), notifier), dir)
    }

    async fn run_script(state: AppState, script: &str) -> String {
        let mut shell = Shell::new(state, Cursor::new(script.as_bytes().to_vec()), Vec::new());
        shell.run().await.expect("Shell should finish cleanly");
        String::from_utf8(shell.into_output()).unwrap()
    }

    #[test]
    fn test_menu_choice_parsing() {
        assert_eq!(MenuOption::from_choice("1"), Some(MenuOption::AddProduct));
        assert_eq!(MenuOption::from_choice(" 10 "), Some(MenuOption::MakeOrder));
        assert_eq!(MenuOption::from_choice("12"), Some(MenuOption::Exit));
        assert_eq!(MenuOption::from_choice("0"), None);
        assert_eq!(MenuOption::from_choice("13"), None);
        assert_eq!(MenuOption::from_choice("abc"), None);
        assert_eq!(MenuOption::from_choice(""), None);
    }

    #[tokio::test]
    async fn test_invalid_option_then_exit() {
        let (state, _dir) = setup_test().await;

        let out = run_script(state, "abc\n99\n12\n").await;

        assert_eq!(out.matches("Invalid option. Please try again.").count(), 2);
        assert!(out.contains("1. Add Product\n"));
        assert!(out.contains("12. Exit\n"));
        assert!(out.ends_with("Exiting program.\n"));
    }

    #[tokio::test]
    async fn test_non_utf8_choice_is_invalid_option() {
        let (state, _dir) = setup_test().await;
        let mut input = vec![0xff, 0xfe, b'\n'];
        input.extend_from_slice(b"12\n");

        let mut shell = Shell::new(state, Cursor::new(input), Vec::new());
        shell.run().await.expect("Bad bytes must not end the shell with an error");
        let out = String::from_utf8(shell.into_output()).unwrap();

        assert!(out.contains("Invalid option. Please try again."));
        assert!(out.ends_with("Exiting program.\n"));
    }

    #[tokio::test]
    async fn test_add_and_display_product() {
        let (state, _dir) = setup_test().await;
        let products = state.product_service.clone();

        let out = run_script(state, "1\nWidget\nA widget\nfree\n9.999\n5\n2\n12\n").await;

        assert!(out.contains("Invalid price. Please enter a valid number."));
        assert!(out.contains("Product added successfully."));
        assert!(out.contains("List of Products:"));
        assert!(out.contains("Widget |A widget    |10.00 |5"));
        assert_eq!(products.list_products().await.unwrap()[0].price, 10.0);
    }

    #[tokio::test]
    async fn test_deactivated_product_hidden_but_exported() {
        let (state, dir) = setup_test().await;

        let out = run_script(state, "1\nWidget\nA widget\n2.5\n1\n4\n1\n2\n5\n12\n").await;

        assert!(out.contains("Product deactivated successfully."));
        assert!(!out.contains("Widget |"));
        let csv = std::fs::read_to_string(dir.path().join("products.csv")).unwrap();
        assert!(csv.contains("1,Widget,A widget,2.5,1"));
    }

    #[tokio::test]
    async fn test_order_for_unknown_client_reports_error() {
        let (state, dir) = setup_test().await;
        let orders = state.order_service.clone();

        let out = run_script(state, "10\n9999\n1\n1\n12\n").await;

        assert!(out.contains("Error: Client ID 9999 does not exist"));
        assert!(out.ends_with("Exiting program.\n"));
        assert!(orders.list_orders().await.unwrap().is_empty());
        assert!(!dir.path().join("order.pdf").exists());
    }

    #[tokio::test]
    async fn test_full_order_flow_without_email() {
        let (state, dir) = setup_test().await;
        let script = concat!(
            "1\nWidget\nA widget\n9.999\n5\n",
            "6\nJane\nDoe\n555-1234\n5551234\n1 Main St\njane@example\njane@example.com\n",
            "10\n1\n1\n0\n2\n",
            "11\n12\n",
        );

        let out = run_script(state, script).await;

        assert!(out.contains("Phone number must contain only digits"));
        assert!(out.contains("Invalid email format"));
        assert!(out.contains("Client added successfully."));
        assert!(out.contains("Quantity must be at least 1"));
        assert!(out.contains("Email is not configured; no confirmation was sent."));
        assert!(out.contains("Order 1 placed successfully. Total: 20.00"));
        assert!(dir.path().join("order.pdf").exists());

        let csv = std::fs::read_to_string(dir.path().join("orders.csv")).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("ID,Client ID,Product ID,Quantity,Price,Order Date"));
        assert!(lines.next().unwrap().starts_with("1,1,1,2,20,"));
    }

    #[tokio::test]
    async fn test_modify_missing_client_is_noop() {
        let (state, _dir) = setup_test().await;

        let out = run_script(state, "8\n42\nA\nB\n1\nC\nd@e.fg\n12\n").await;

        assert!(out.contains("No client with ID 42; nothing was changed."));
    }

    #[tokio::test]
    async fn test_end_of_input_mid_prompt_stops_quietly() {
        let (state, _dir) = setup_test().await;

        let out = run_script(state, "6\nJane\n").await;

        assert!(out.contains("Enter client last name:"));
        assert!(!out.contains("Error:"));
    }
}
