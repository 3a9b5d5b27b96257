//! # Argument Parsing
//!
//! Splits the text after a command into words. Double quotes group words together, and
//! "rest" arguments take whatever raw text is left.

use crate::application::commands::CommandError;

#[derive(Debug, Clone)]
pub struct Args<'a> {
    rest: &'a str,
}

impl<'a> Args<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { rest: text }
    }

    pub fn is_empty(&self) -> bool {
        self.rest.trim().is_empty()
    }

    /// Unparsed text, untrimmed.
    pub fn remaining(&self) -> &'a str {
        self.rest
    }

    fn split_word(text: &'a str) -> Result<Option<(String, &'a str)>, CommandError> {
        let text = text.trim_start();
        if text.is_empty() {
            return Ok(None);
        }
        if let Some(quoted) = text.strip_prefix('"') {
            let end = quoted.find('"').ok_or(CommandError::UnclosedQuote)?;
            return Ok(Some((quoted[..end].to_string(), &quoted[end + 1..])));
        }
        let end = text.find(char::is_whitespace).unwrap_or(text.len());
        Ok(Some((text[..end].to_string(), &text[end..])))
    }

    pub fn next_word(&mut self) -> Result<Option<String>, CommandError> {
        match Self::split_word(self.rest)? {
            Some((word, rest)) => {
                self.rest = rest;
                Ok(Some(word))
            }
            None => Ok(None),
        }
    }

    /// The next word without consuming it.
    pub fn peek_word(&self) -> Result<Option<String>, CommandError> {
        Ok(Self::split_word(self.rest)?.map(|(word, _)| word))
    }

    pub fn required(&mut self, name: &str) -> Result<String, CommandError> {
        self.next_word()?
            .ok_or_else(|| CommandError::MissingArgument(name.to_string()))
    }

    /// Remaining text, trimmed. `None` when nothing is left.
    pub fn rest(&mut self) -> Option<String> {
        let text = self.rest.trim();
        self.rest = "";
        (!text.is_empty()).then(|| text.to_string())
    }

    pub fn required_rest(&mut self, name: &str) -> Result<String, CommandError> {
        self.rest().ok_or_else(|| CommandError::MissingArgument(name.to_string()))
    }

    /// Parses the next word as an integer.
    pub fn required_int(&mut self, name: &str) -> Result<i64, CommandError> {
        let word = self.required(name)?;
        word.parse()
            .map_err(|_| CommandError::bad_argument(format!("Converting to \"int\" failed for parameter \"{name}\".")))
    }
}
