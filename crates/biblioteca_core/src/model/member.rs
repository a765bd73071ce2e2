//! Member domain model.
//!
//! # Invariants
//! - `national_id` and `email` are unique across members (enforced by
//!   storage-level UNIQUE constraints; violations surface as `Duplicate`).
//! - `registered_on` is assigned by storage at creation and never edited.

use crate::model::{require_non_empty, ValidationError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Stable identifier for a member row.
pub type MemberId = i64;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

/// Canonical member record as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    pub national_id: String,
    pub phone: Option<String>,
    pub email: String,
    pub address: Option<String>,
    /// ISO `YYYY-MM-DD`, set by storage at insert time.
    pub registered_on: String,
}

/// Input for registering a member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMember {
    pub name: String,
    pub national_id: String,
    pub phone: Option<String>,
    pub email: String,
    pub address: Option<String>,
}

impl NewMember {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("member", "name", &self.name)?;
        require_non_empty("member", "national_id", &self.national_id)?;
        require_non_empty("member", "email", &self.email)?;
        validate_email(&self.email)
    }
}

/// Partial update for a member's contact fields. `None` keeps stored values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberPatch {
    pub name: Option<String>,
    pub national_id: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

impl MemberPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.national_id.is_none()
            && self.phone.is_none()
            && self.email.is_none()
            && self.address.is_none()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.is_empty() {
            return Err(ValidationError::EmptyUpdate { entity: "member" });
        }
        if let Some(name) = &self.name {
            require_non_empty("member", "name", name)?;
        }
        if let Some(national_id) = &self.national_id {
            require_non_empty("member", "national_id", national_id)?;
        }
        if let Some(email) = &self.email {
            require_non_empty("member", "email", email)?;
            validate_email(email)?;
        }
        Ok(())
    }
}

fn validate_email(email: &str) -> Result<(), ValidationError> {
    if EMAIL_RE.is_match(email.trim()) {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail(email.to_string()))
    }
}
