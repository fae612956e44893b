//! Terminal input and output: the prompt helpers and the menu shell.

pub mod prompt;
pub mod shell;

pub use prompt::{PromptError, Prompter};
pub use shell::{MenuOption, Shell};
