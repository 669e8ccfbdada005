//! Mail address value type

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::MAILTO_PREFIX;
use crate::errors::{CalarmError, Result};

/// Normalized (trimmed, lower case) mail address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MailAddress(String);

impl MailAddress {
    /// Parse and normalize a bare `local@domain` address.
    ///
    /// # Errors
    /// Returns `CalarmError::InvalidInput` when the value is not a plausible
    /// mail address.
    pub fn parse(raw: &str) -> Result<Self> {
        let normalized = raw.trim().to_lowercase();
        let (local, domain) = normalized
            .split_once('@')
            .ok_or_else(|| CalarmError::InvalidInput(format!("Not a mail address: {raw}")))?;

        let valid = !local.is_empty()
            && !domain.is_empty()
            && !domain.contains('@')
            && !domain.starts_with('.')
            && !domain.ends_with('.')
            && !normalized.chars().any(|c| c.is_whitespace() || c == '<' || c == '>');

        if valid {
            Ok(Self(normalized))
        } else {
            Err(CalarmError::InvalidInput(format!("Not a mail address: {raw}")))
        }
    }

    /// Extract an address from an iCalendar `CAL-ADDRESS` value
    /// (`mailto:user@domain`). The scheme is matched case-insensitively and
    /// is optional.
    pub fn from_cal_address(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        let bare = match trimmed.get(..MAILTO_PREFIX.len()) {
            Some(prefix) if prefix.eq_ignore_ascii_case(MAILTO_PREFIX) => {
                &trimmed[MAILTO_PREFIX.len()..]
            }
            _ => trimmed,
        };
        Self::parse(bare).ok()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Domain part, after the `@`.
    pub fn domain(&self) -> &str {
        self.0.split_once('@').map_or("", |(_, domain)| domain)
    }
}

impl fmt::Display for MailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for MailAddress {
    type Err = CalarmError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for MailAddress {
    type Error = CalarmError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<MailAddress> for String {
    fn from(value: MailAddress) -> Self {
        value.0
    }
}
