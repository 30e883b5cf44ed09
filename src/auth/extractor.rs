//! Request extractors for the identity resolved by the gate.

use crate::{entities::user, errors::Error};
use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{Extensions, request::Parts},
};
use std::{convert::Infallible, net::SocketAddr};

/// The authenticated caller, inserted into request extensions by
/// [`crate::auth::require_auth`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    /// Internal id
    pub id: i64,
    /// Public uuid
    pub uuid: String,
    /// Login name
    pub username: String,
    /// Admin flag as stored on the user row
    pub admin: bool,
}

impl From<&user::Model> for CurrentUser {
    fn from(value: &user::Model) -> Self {
        Self {
            id: value.id,
            uuid: value.uuid.clone(),
            username: value.username.clone(),
            admin: value.admin,
        }
    }
}

/// Handlers behind the gate take `CurrentUser` as an argument; outside of it
/// the extraction fails with 401.
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or(Error::Unauthorized)
    }
}

/// Caller IP address, when the server was started with connect info.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub Option<String>);

impl ClientIp {
    /// Reads the peer address from request extensions.
    #[must_use]
    pub fn from_extensions(extensions: &Extensions) -> Self {
        Self(
            extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string()),
        )
    }
}

impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_extensions(&parts.extensions))
    }
}
