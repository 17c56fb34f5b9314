//! Access gateway: registration, login, bearer verification and profiles.

use std::sync::{Arc, OnceLock};

use base64::Engine;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::error::StockfolioError;
use super::notification::{Notification, NotificationKind};
use super::user::{normalize_email, PublicUser, User, UserPatch};
use crate::ports::credential_port::CredentialPort;
use crate::ports::notify_port::NotifyPort;
use crate::ports::store_port::StorePort;
use crate::ports::token_port::TokenPort;

const INVALID_LOGIN: &str = "Invalid email or password";
const DUMMY_PASSWORD: &str = "stockfolio-unknown-account";
pub const MAX_PROFILE_IMAGE_BYTES: usize = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    pub token: String,
    pub user: PublicUser,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub profile_image: Option<String>,
}

pub struct AccessGateway {
    store: Arc<dyn StorePort>,
    credentials: Arc<dyn CredentialPort>,
    tokens: Arc<dyn TokenPort>,
    notifier: Arc<dyn NotifyPort>,
    dummy_hash: OnceLock<Option<String>>,
}

fn required<'a>(value: &'a str, field: &str) -> Result<&'a str, StockfolioError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(StockfolioError::missing(field));
    }
    Ok(value)
}

impl AccessGateway {
    pub fn new(
        store: Arc<dyn StorePort>,
        credentials: Arc<dyn CredentialPort>,
        tokens: Arc<dyn TokenPort>,
        notifier: Arc<dyn NotifyPort>,
    ) -> Self {
        AccessGateway {
            store,
            credentials,
            tokens,
            notifier,
            dummy_hash: OnceLock::new(),
        }
    }

    /// Unknown or disabled accounts still pay for one hash verification so
    /// login latency does not reveal which emails are registered.
    fn verify_dummy(&self, password: &str) {
        let hash = self
            .dummy_hash
            .get_or_init(|| self.credentials.hash(DUMMY_PASSWORD).ok());
        if let Some(hash) = hash {
            let _ = self.credentials.verify(password, hash);
        }
    }

    /// Creates and stores a user without issuing a token.
    pub fn create_user(
        &self,
        email: &str,
        password: &str,
        name: &str,
        is_admin: bool,
    ) -> Result<User, StockfolioError> {
        let email = required(email, "email")?;
        if password.is_empty() {
            return Err(StockfolioError::missing("password"));
        }
        let name = required(name, "name")?;
        if !email.contains('@') {
            return Err(StockfolioError::validation("invalid email address"));
        }
        if self.store.find_user_by_email(email)?.is_some() {
            return Err(StockfolioError::Conflict {
                reason: "User already exists".into(),
            });
        }
        let hash = self.credentials.hash(password)?;
        let mut user = User::new(email, hash, name);
        user.is_admin = is_admin;
        self.store.insert_user(&user)?;
        Ok(user)
    }

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<Session, StockfolioError> {
        let user = self.create_user(email, password, name, false)?;
        let token = self.tokens.issue(&user.id)?;
        info!("registered user {}", user.id);
        self.notify(&user.email, NotificationKind::Registration).await;
        Ok(Session {
            token,
            user: user.to_public(),
        })
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session, StockfolioError> {
        let found = self
            .store
            .find_user_by_email(&normalize_email(email))?
            .filter(|u| u.is_active);
        let Some(user) = found else {
            self.verify_dummy(password);
            return Err(StockfolioError::unauthorized(INVALID_LOGIN));
        };
        if !self.credentials.verify(password, &user.password_hash)? {
            return Err(StockfolioError::unauthorized(INVALID_LOGIN));
        }
        let token = self.tokens.issue(&user.id)?;
        info!("user {} logged in", user.id);
        self.notify(&user.email, NotificationKind::Login).await;
        Ok(Session {
            token,
            user: user.to_public(),
        })
    }

    async fn notify(&self, to: &str, kind: NotificationKind) {
        let notification = Notification::new(to, kind);
        if let Err(e) = self.notifier.send(&notification).await {
            warn!("failed to send {:?} notification to {}: {}", kind, to, e);
        }
    }

    /// Resolves a token to the current stored user.
    pub fn authenticate(&self, token: &str) -> Result<User, StockfolioError> {
        let user_id = self.tokens.verify(token)?;
        self.store
            .find_user(&user_id)?
            .filter(|u| u.is_active)
            .ok_or_else(|| StockfolioError::unauthorized("Token is not valid"))
    }

    /// Accepts a raw `Authorization` header value.
    pub fn authenticate_bearer(&self, header: Option<&str>) -> Result<User, StockfolioError> {
        let header =
            header.ok_or_else(|| StockfolioError::unauthorized("No token, authorization denied"))?;
        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| StockfolioError::unauthorized("No token, authorization denied"))?;
        self.authenticate(token)
    }

    pub fn require_admin(&self, user: &User) -> Result<(), StockfolioError> {
        if !user.is_admin {
            return Err(StockfolioError::forbidden("Admin access required"));
        }
        Ok(())
    }

    pub fn profile(&self, user: &User) -> Result<PublicUser, StockfolioError> {
        self.store
            .find_user(&user.id)?
            .map(|u| u.to_public())
            .ok_or_else(|| StockfolioError::not_found("User"))
    }

    pub fn update_profile(
        &self,
        user: &User,
        update: &ProfileUpdate,
    ) -> Result<PublicUser, StockfolioError> {
        let image = non_empty(&update.profile_image);
        if let Some(image) = image {
            validate_profile_image(image)?;
        }
        let patch = UserPatch {
            name: non_empty(&update.name).map(str::to_string),
            phone: non_empty(&update.phone).map(|p| Some(p.to_string())),
            profile_image: image.map(str::to_string),
            ..UserPatch::default()
        };
        self.store.patch_user(&user.id, &patch)?;
        self.profile(user)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// A profile image is a base64 data URL no larger than 1 MiB once decoded.
pub fn validate_profile_image(image: &str) -> Result<(), StockfolioError> {
    let (_, payload) = image
        .split_once("base64,")
        .ok_or_else(|| StockfolioError::validation("Invalid image format"))?;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|_| StockfolioError::validation("Invalid image format"))?;
    if bytes.len() > MAX_PROFILE_IMAGE_BYTES {
        return Err(StockfolioError::validation("Image size should be less than 1MB"));
    }
    Ok(())
}
