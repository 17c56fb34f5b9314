//! Bearer-token extractors.
//!
//! Handlers take `CurrentUser` for any signed-in account and `AdminUser`
//! for operator routes. Both re-read the account on every request.

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::domain::user::User;

use super::{AppState, WebError};

pub struct CurrentUser(pub User);

pub struct AdminUser(pub User);

fn bearer_user(parts: &Parts, state: &AppState) -> Result<User, WebError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    Ok(state.access.authenticate_bearer(header)?)
}

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = WebError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        bearer_user(parts, state).map(CurrentUser)
    }
}

impl FromRequestParts<Arc<AppState>> for AdminUser {
    type Rejection = WebError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let user = bearer_user(parts, state)?;
        state.access.require_admin(&user)?;
        Ok(AdminUser(user))
    }
}
