//! Request extractors whose rejections speak the error envelope.
//!
//! Axum's built-in extractors reject with plain-text bodies; these wrappers
//! route every rejection through [`ApiError`] so malformed input gets the
//! same `{statusCode, message, success, errors}` shape as every other
//! failure.

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, OptionalFromRequest, Request};
use axum::http::header::CONTENT_TYPE;
use axum::http::request::Parts;
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// JSON body extractor. Unparseable or mis-typed bodies reject with a 400
/// envelope carrying the deserializer's message.
#[derive(Debug)]
pub struct Json<T>(pub T);

impl<S, T> FromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match <axum::Json<T> as FromRequest<S>>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(from_json_rejection(rejection)),
        }
    }
}

// `Option<Json<T>>` means the body is optional: no content-type header is
// treated as no body, while a present body must still parse.
impl<S, T> OptionalFromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Option<Self>, Self::Rejection> {
        if req.headers().get(CONTENT_TYPE).is_none() {
            return Ok(None);
        }
        <Self as FromRequest<S>>::from_request(req, state)
            .await
            .map(Some)
    }
}

fn from_json_rejection(rejection: JsonRejection) -> ApiError {
    ApiError::validation(rejection.body_text())
}

/// Query-string extractor with enveloped rejections.
#[derive(Debug)]
pub struct Query<T>(pub T);

impl<S, T> FromRequestParts<S> for Query<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match axum::extract::Query::<T>::from_request_parts(parts, state).await {
            Ok(axum::extract::Query(value)) => Ok(Self(value)),
            Err(rejection) => Err(from_query_rejection(rejection)),
        }
    }
}

fn from_query_rejection(rejection: QueryRejection) -> ApiError {
    ApiError::validation(rejection.body_text())
}

/// Multipart extractor with enveloped rejections (wrong or missing
/// content-type on an upload route).
pub struct Multipart(pub axum::extract::Multipart);

impl<S> FromRequest<S> for Multipart
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match <axum::extract::Multipart as FromRequest<S>>::from_request(req, state).await {
            Ok(inner) => Ok(Self(inner)),
            Err(rejection) => Err(from_multipart_rejection(rejection)),
        }
    }
}

fn from_multipart_rejection(rejection: MultipartRejection) -> ApiError {
    ApiError::validation(rejection.body_text())
}
