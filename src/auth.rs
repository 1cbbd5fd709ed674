//! Access gate for studio operations.
//!
//! Identity comes from an upstream sign-in; this module only decides
//! whether a signed-in user may use the studio.

use crate::error::{Result, StudioError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// E-mail address reported by the identity provider.
    pub email: String,
    /// Whether the provider verified the address.
    pub email_verified: bool,
}

impl Session {
    /// Creates a session for a verified address.
    pub fn verified(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            email_verified: true,
        }
    }
}

/// E-mail allow-list.
///
/// An empty list admits every verified address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessPolicy {
    allowed: HashSet<String>,
}

impl AccessPolicy {
    /// Builds a policy from a list of addresses. Entries are trimmed and
    /// lower-cased; blank entries are skipped.
    pub fn new<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed = emails
            .into_iter()
            .map(|e| e.as_ref().trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();
        Self { allowed }
    }

    /// Parses a comma-separated list.
    pub fn parse(list: &str) -> Self {
        Self::new(list.split(','))
    }

    /// Reads `ALLOWED_EMAILS`. Unset means no restriction.
    pub fn from_env() -> Self {
        std::env::var("ALLOWED_EMAILS")
            .map(|list| Self::parse(&list))
            .unwrap_or_default()
    }

    /// Returns true if any address is allowed.
    pub fn is_open(&self) -> bool {
        self.allowed.is_empty()
    }

    /// Returns true if the session may use the studio.
    pub fn permits(&self, session: &Session) -> bool {
        let email = session.email.trim().to_lowercase();
        if email.is_empty() || !session.email_verified {
            return false;
        }
        self.is_open() || self.allowed.contains(&email)
    }

    /// Checks a request's session.
    pub fn authorize<'a>(&self, session: Option<&'a Session>) -> Result<&'a Session> {
        let session = session
            .ok_or_else(|| StudioError::Unauthorized("sign-in required".into()))?;

        if !self.permits(session) {
            tracing::warn!(email = %session.email, "access denied");
            return Err(StudioError::Unauthorized(format!(
                "{} is not allowed to use the studio",
                session.email
            )));
        }
        Ok(session)
    }
}
