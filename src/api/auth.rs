// Copyright (c) Teacup Team
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::ApiError;

/// Header carrying the viewer's user id. Authentication terminates at the
/// upstream identity provider; requests arrive here with the resolved id.
pub const IDENTITY_HEADER: &str = "x-user-id";

/// Authenticated viewer identity. Rejects the request when the header is
/// missing or malformed.
#[derive(Debug, Clone, Copy)]
pub struct Viewer(pub i32);

/// Viewer identity for endpoints that also serve anonymous readers.
#[derive(Debug, Clone, Copy)]
pub struct MaybeViewer(pub Option<i32>);

fn viewer_from_parts(parts: &Parts) -> Option<i32> {
    parts
        .headers
        .get(IDENTITY_HEADER)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

#[async_trait]
impl<S> FromRequestParts<S> for Viewer
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        viewer_from_parts(parts)
            .map(Viewer)
            .ok_or_else(|| ApiError::Unauthorized("authentication required".to_string()))
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for MaybeViewer
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeViewer(viewer_from_parts(parts)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with_header(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/feed");
        if let Some(value) = value {
            builder = builder.header(IDENTITY_HEADER, value);
        }
        let request = builder.body(()).expect("request builds");
        request.into_parts().0
    }

    #[test]
    fn parses_numeric_identity() {
        assert_eq!(viewer_from_parts(&parts_with_header(Some("42"))), Some(42));
    }

    #[test]
    fn missing_header_yields_no_viewer() {
        assert_eq!(viewer_from_parts(&parts_with_header(None)), None);
    }

    #[test]
    fn malformed_identity_yields_no_viewer() {
        assert_eq!(viewer_from_parts(&parts_with_header(Some("tea"))), None);
        assert_eq!(viewer_from_parts(&parts_with_header(Some(""))), None);
    }
}
