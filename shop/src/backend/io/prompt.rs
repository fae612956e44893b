//! Line-oriented terminal prompting.
//!
//! `Prompter` owns the input and output streams of the interactive shell.
//! Field prompts repeat until the supplied parser accepts the line; the
//! parser's error is shown in red before asking again.

use colored::Colorize;
use std::fmt::Display;
use std::io::{self, BufRead, Write};
use thiserror::Error;

use crate::backend::domain::validation::ValidationError;

pub const CHOICE_PROMPT: &str = "Choose an option: ";

#[derive(Debug, Error)]
pub enum PromptError {
    /// Input reached end of file while a value was still expected
    #[error("input closed")]
    Aborted,
    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),
}

pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Read one line without its terminator; `None` at end of input.
    /// Invalid UTF-8 is replaced, not rejected.
    pub fn read_line(&mut self) -> Result<Option<String>, PromptError> {
        let mut buf = Vec::new();
        if self.input.read_until(b'\n', &mut buf)? == 0 {
            return Ok(None);
        }
        let line = String::from_utf8_lossy(&buf);
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    /// Ask for a field until `parse` accepts it
    pub fn ask<T, F>(&mut self, label: &str, parse: F) -> Result<T, PromptError>
    where
        F: Fn(&str) -> Result<T, ValidationError>,
    {
        loop {
            writeln!(self.output, "{}", label)?;
            self.output.flush()?;

            let line = self.read_line()?.ok_or(PromptError::Aborted)?;
            match parse(&line) {
                Ok(value) => return Ok(value),
                Err(e) => writeln!(self.output, "{}", e.to_string().as_str().red())?,
            }
        }
    }

    /// Print the choice prompt and read the operator's selection
    pub fn read_choice(&mut self) -> Result<Option<String>, PromptError> {
        write!(self.output, "{}", CHOICE_PROMPT)?;
        self.output.flush()?;
        self.read_line()
    }

    pub fn line(&mut self, text: impl Display) -> Result<(), PromptError> {
        writeln!(self.output, "{}", text)?;
        Ok(())
    }

    /// Raw text such as a rendered table, printed as-is
    pub fn write_raw(&mut self, text: &str) -> Result<(), PromptError> {
        self.output.write_all(text.as_bytes())?;
        self.output.flush()?;
        Ok(())
    }

    pub fn success(&mut self, text: &str) -> Result<(), PromptError> {
        self.line(text.green())
    }

    pub fn failure(&mut self, text: &str) -> Result<(), PromptError> {
        self.line(text.red())
    }

    pub fn notice(&mut self, text: &str) -> Result<(), PromptError> {
        self.line(text.yellow())
    }

    pub fn farewell(&mut self, text: &str) -> Result<(), PromptError> {
        self.line(text.cyan())
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::domain::validation;
    use std::io::Cursor;

    fn prompter(input: &str) -> Prompter<Cursor<Vec<u8>>, Vec<u8>> {
        colored::control::set_override(false);
        Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn test_ask_reprompts_until_valid() {
        let mut p = prompter("\nabc\n12.345\n");

        let price = p.ask("Enter product price:", validation::parse_price).unwrap();

        assert_eq!(price, 12.35);
        let out = String::from_utf8(p.into_output()).unwrap();
        assert_eq!(out.matches("Enter product price:").count(), 3);
        assert!(out.contains("Invalid price. Please enter a valid number."));
    }

    #[test]
    fn test_ask_aborts_at_end_of_input() {
        let mut p = prompter("   \n");

        let result = p.ask("Enter product title:", |s| validation::require_text("Title", s));

        assert!(matches!(result, Err(PromptError::Aborted)));
    }

    #[test]
    fn test_read_line_strips_crlf() {
        let mut p = prompter("7\r\nlast");

        assert_eq!(p.read_line().unwrap().as_deref(), Some("7"));
        assert_eq!(p.read_line().unwrap().as_deref(), Some("last"));
        assert_eq!(p.read_line().unwrap(), None);
    }

    #[test]
    fn test_read_line_tolerates_invalid_utf8() {
        colored::control::set_override(false);
        let mut p = Prompter::new(Cursor::new(vec![0xff, 0xfe, b'\n', b'5', b'\n']), Vec::new());

        let first = p.read_line().unwrap().expect("line should be returned");
        assert!(first.contains('\u{FFFD}'));
        assert_eq!(p.read_line().unwrap().as_deref(), Some("5"));
    }

    #[test]
    fn test_read_choice_prints_prompt() {
        let mut p = prompter("3\n");

        assert_eq!(p.read_choice().unwrap().as_deref(), Some("3"));
        let out = String::from_utf8(p.into_output()).unwrap();
        assert_eq!(out, CHOICE_PROMPT);
    }
}
