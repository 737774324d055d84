//! Mailing-list subscribers.
//!
//! A list of `{email, subscribedAt}` rows, unique by exact email. Operations
//! report an [`Outcome`] with a user-facing message instead of an error: a
//! storage failure becomes `"An error occurred"` and is logged.

use crate::sidetable::{self, SideTableError};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscriber {
    pub email: String,
    pub subscribed_at: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SubscriberList {
    subscribers: Vec<Subscriber>,
}

/// Result of a subscribe/unsubscribe request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub success: bool,
    pub message: String,
}

impl Outcome {
    fn ok(message: &str) -> Self {
        Self {
            success: true,
            message: message.to_string(),
        }
    }

    fn fail(message: &str) -> Self {
        Self {
            success: false,
            message: message.to_string(),
        }
    }
}

/// Loose shape check: something@something.something, no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static regex"))
        .is_match(email)
}

#[derive(Debug, Clone)]
pub struct SubscriberTable {
    path: PathBuf,
}

impl SubscriberTable {
    /// The table stored in `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            path: dir.join(sidetable::SUBSCRIBERS_FILENAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn list(&self) -> Result<Vec<Subscriber>, SideTableError> {
        let list: SubscriberList = sidetable::load(&self.path)?;
        Ok(list.subscribers)
    }

    pub fn subscribe(&self, email: &str, now: DateTime<Utc>) -> Outcome {
        if !is_valid_email(email) {
            return Outcome::fail("Invalid email format");
        }
        self.update(|list| {
            if list.subscribers.iter().any(|s| s.email == email) {
                return (false, Outcome::fail("Email already subscribed"));
            }
            list.subscribers.push(Subscriber {
                email: email.to_string(),
                subscribed_at: now,
            });
            (true, Outcome::ok("Subscription successful"))
        })
    }

    pub fn unsubscribe(&self, email: &str) -> Outcome {
        self.update(|list| match list.subscribers.iter().position(|s| s.email == email) {
            Some(i) => {
                list.subscribers.remove(i);
                (true, Outcome::ok("Unsubscribed successfully"))
            }
            None => (false, Outcome::fail("Email not found")),
        })
    }

    /// Number of subscribers; 0 when the table cannot be read.
    pub fn count(&self) -> usize {
        match self.list() {
            Ok(list) => list.len(),
            Err(err) => {
                tracing::error!(error = %err, "cannot read subscriber table");
                0
            }
        }
    }

    /// Load, apply `change` (which says whether it modified the list), save.
    fn update(&self, change: impl FnOnce(&mut SubscriberList) -> (bool, Outcome)) -> Outcome {
        let result = sidetable::load::<SubscriberList>(&self.path).and_then(|mut list| {
            let (modified, outcome) = change(&mut list);
            if modified {
                sidetable::save(&self.path, &list)?;
            }
            Ok(outcome)
        });
        result.unwrap_or_else(|err| {
            tracing::error!(error = %err, "subscriber table update failed");
            Outcome::fail("An error occurred")
        })
    }
}
