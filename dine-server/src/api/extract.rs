//! Actor Extractor
//!
//! The caller's role comes from the `x-dine-role` header, set by the trusted
//! front proxy. A missing header means a diner.

use axum::{extract::FromRequestParts, http::request::Parts};
use shared::order::ActorRole;

use crate::error::DiningError;

pub const ROLE_HEADER: &str = "x-dine-role";

/// Role of the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor(pub ActorRole);

impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = DiningError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(ROLE_HEADER) else {
            return Ok(Actor(ActorRole::Customer));
        };

        value
            .to_str()
            .ok()
            .and_then(ActorRole::parse)
            .map(Actor)
            .ok_or_else(|| {
                tracing::debug!(header = ?value, "Rejected unknown role header");
                DiningError::validation(ROLE_HEADER, "role must be CUSTOMER, KITCHEN or STAFF")
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Request;

    async fn extract(role: Option<&str>) -> Result<Actor, DiningError> {
        let mut builder = Request::builder().uri("/");
        if let Some(role) = role {
            builder = builder.header(ROLE_HEADER, role);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        Actor::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_role_header() {
        assert_eq!(extract(None).await.unwrap(), Actor(ActorRole::Customer));
        assert_eq!(extract(Some("kitchen")).await.unwrap(), Actor(ActorRole::Kitchen));
        assert_eq!(extract(Some("STAFF")).await.unwrap(), Actor(ActorRole::Staff));
        assert!(extract(Some("chef")).await.is_err());
    }
}
