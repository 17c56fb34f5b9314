//! Account records and their public projection.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub phone: Option<String>,
    pub profile_image: Option<String>,
    /// Only the ledger writes this; see [`crate::domain::ledger`].
    pub(crate) balance: Decimal,
    pub is_admin: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: &str, password_hash: String, name: &str) -> Self {
        User {
            id: uuid::Uuid::new_v4().to_string(),
            email: normalize_email(email),
            password_hash,
            name: name.trim().to_string(),
            phone: None,
            profile_image: None,
            balance: Decimal::ZERO,
            is_admin: false,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn to_public(&self) -> PublicUser {
        PublicUser {
            id: self.id.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
            phone: self.phone.clone(),
            profile_image: self.profile_image.clone(),
            balance: self.balance,
            is_admin: self.is_admin,
            is_active: self.is_active,
            created_at: self.created_at,
        }
    }
}

/// What callers may see of a user: everything except the credential hash.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: String,
    pub email: String,
    pub name: String,
    pub phone: Option<String>,
    pub profile_image: Option<String>,
    pub balance: Decimal,
    pub is_admin: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Column-level change to a stored user. Unset fields keep their stored value,
/// so concurrent patches touching different fields never undo each other.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserPatch {
    pub name: Option<String>,
    /// `Some(None)` clears the phone number.
    pub phone: Option<Option<String>>,
    pub profile_image: Option<String>,
    pub is_admin: Option<bool>,
    pub is_active: Option<bool>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        *self == UserPatch::default()
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
