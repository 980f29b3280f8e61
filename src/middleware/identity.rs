//! Identity middleware
//!
//! The identity provider sits in front of this service and asserts the signed-in user
//! with `x-user-id` / `x-user-email`. When API keys are configured, the proxy must also
//! present one of them as a bearer token, otherwise those headers are not trusted.

use axum::{
    body::Body,
    http::{header::AUTHORIZATION, HeaderMap, Request},
    response::{IntoResponse, Response},
};
use futures::future::BoxFuture;
use std::{
    collections::HashSet,
    sync::Arc,
    task::{Context, Poll},
};
use tower::{Layer, Service};
use tracing::warn;

use crate::error::AppError;
use crate::identity::Identity;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_EMAIL_HEADER: &str = "x-user-email";

const MISSING_KEY_MESSAGE: &str =
    "API key required. Provide via Authorization header: 'Bearer YOUR_API_KEY'";

/// Identity layer
#[derive(Clone)]
pub struct IdentityLayer {
    api_keys: Arc<HashSet<String>>,
}

impl IdentityLayer {
    pub fn new(api_keys: Vec<String>) -> Self {
        Self {
            api_keys: Arc::new(api_keys.into_iter().collect()),
        }
    }
}

impl<S> Layer<S> for IdentityLayer {
    type Service = IdentityMiddleware<S>;

    fn layer(&self, inner: S) -> Self::Service {
        IdentityMiddleware {
            inner,
            api_keys: self.api_keys.clone(),
        }
    }
}

/// Identity middleware service
#[derive(Clone)]
pub struct IdentityMiddleware<S> {
    inner: S,
    api_keys: Arc<HashSet<String>>,
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Identity asserted by the request headers, if any
pub fn identity_from_headers(headers: &HeaderMap) -> Option<Identity> {
    let user_id = header_value(headers, USER_ID_HEADER)?;
    let email = header_value(headers, USER_EMAIL_HEADER).map(str::to_string);
    Some(Identity::new(user_id, email))
}

impl<S> Service<Request<Body>> for IdentityMiddleware<S>
where
    S: Service<Request<Body>, Response = Response> + Send + Clone + 'static,
    S::Future: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: Request<Body>) -> Self::Future {
        if request.uri().path() == "/health" {
            return Box::pin(self.inner.call(request));
        }

        if !self.api_keys.is_empty() {
            let api_key = request
                .headers()
                .get(AUTHORIZATION)
                .and_then(|h| h.to_str().ok())
                .map(|h| h.strip_prefix("Bearer ").unwrap_or(h).to_string());

            match api_key {
                Some(key) if self.api_keys.contains(&key) => {}
                Some(_) => {
                    warn!("Invalid API key provided");
                    return Box::pin(async move {
                        Ok(AppError::Unauthenticated("invalid API key".to_string()).into_response())
                    });
                }
                None => {
                    warn!("No API key provided");
                    return Box::pin(async move {
                        Ok(AppError::Unauthenticated(MISSING_KEY_MESSAGE.to_string())
                            .into_response())
                    });
                }
            }
        }

        if let Some(identity) = identity_from_headers(request.headers()) {
            request.extensions_mut().insert(identity);
        }

        Box::pin(self.inner.call(request))
    }
}
