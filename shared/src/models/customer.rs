//! Customer Model

use serde::{Deserialize, Serialize};

/// Customer details used when talking to the remote platform
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct CustomerSnapshot {
    /// Remote platform customer id (required for order push/pull)
    #[serde(default)]
    pub remote_customer_id: Option<u64>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

impl CustomerSnapshot {
    /// Split a display name into first/last at the first whitespace
    pub fn from_display_name(display_name: &str, email: &str, phone: &str) -> Self {
        let trimmed = display_name.trim();
        let (first, last) = match trimmed.split_once(char::is_whitespace) {
            Some((f, l)) => (f.to_string(), l.trim().to_string()),
            None => (trimmed.to_string(), String::new()),
        };
        Self {
            remote_customer_id: None,
            first_name: first,
            last_name: last,
            email: email.trim().to_string(),
            phone: phone.to_string(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}
