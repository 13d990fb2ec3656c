//! Axum extractor for [`Session`].

use super::Session;
use axum::extract::FromRequestParts;
use http::{request::Parts, StatusCode};

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Session>().cloned().ok_or((
            StatusCode::INTERNAL_SERVER_ERROR,
            "Can't extract session. Is SessionLayer enabled?",
        ))
    }
}
