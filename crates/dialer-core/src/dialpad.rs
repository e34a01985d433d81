//! Dial pad input model
//!
//! Holds the number being composed. The key grid itself is a rendering
//! concern; [`DIALPAD_KEYS`] only records its layout so front-ends agree on it.

use serde::{Deserialize, Serialize};

use crate::config::DialerConfig;

/// Key layout of the dial pad, row by row
pub const DIALPAD_KEYS: [[char; 3]; 4] = [
    ['1', '2', '3'],
    ['4', '5', '6'],
    ['7', '8', '9'],
    ['*', '0', '#'],
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialpadInputModel {
    value: String,
}

impl DialpadInputModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a prefilled number
    pub fn with_number(number: impl Into<String>) -> Self {
        Self {
            value: number.into(),
        }
    }

    /// Start from the configured prefill number, if any
    pub fn from_config(config: &DialerConfig) -> Self {
        config
            .prefill_number
            .as_deref()
            .map(Self::with_number)
            .unwrap_or_default()
    }

    pub fn append(&mut self, key: char) {
        self.value.push(key);
    }

    /// Remove the last character; no-op when empty
    pub fn backspace(&mut self) {
        self.value.pop();
    }

    pub fn clear(&mut self) {
        self.value.clear();
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}
