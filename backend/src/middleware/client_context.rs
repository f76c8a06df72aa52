use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{
    models::activity_log::ClientContext,
    utils::security::{extract_ip, extract_user_agent},
};

impl<S> FromRequestParts<S> for ClientContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ClientContext {
            ip: extract_ip(&parts.headers),
            user_agent: extract_user_agent(&parts.headers),
        })
    }
}
