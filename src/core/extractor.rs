use axum::{
    body::Body,
    extract::{rejection::JsonRejection, FromRequest, FromRequestParts, Request},
    http::{header, request::Parts},
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use url::Url;

use crate::core::config::AppConfig;
use crate::core::error::AppError;
use crate::features::auth::model::AuthenticatedUser;

/// JSON extractor that reports body errors through the API envelope
pub struct AppJson<T>(pub T);

impl<T, S> FromRequest<S> for AppJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppJsonRejection;

    async fn from_request(req: Request<Body>, state: &S) -> Result<Self, Self::Rejection> {
        Json::<T>::from_request(req, state)
            .await
            .map(|Json(value)| Self(value))
            .map_err(AppJsonRejection)
    }
}

pub struct AppJsonRejection(JsonRejection);

impl IntoResponse for AppJsonRejection {
    fn into_response(self) -> Response {
        let message = match self.0 {
            JsonRejection::JsonDataError(err) => format!("Invalid JSON data: {}", err),
            JsonRejection::JsonSyntaxError(err) => format!("Invalid JSON syntax: {}", err),
            JsonRejection::MissingJsonContentType(err) => {
                format!("Missing JSON content type: {}", err)
            }
            _ => "Failed to parse JSON body".to_string(),
        };

        AppError::BadRequest(message).into_response()
    }
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }
}

/// Which request hosts absolute links may be built for. Installed as an
/// `Arc<HostPolicy>` request extension; without one only local hosts pass.
#[derive(Debug, Clone)]
pub struct HostPolicy {
    allowed_hosts: Vec<String>,
    use_x_forwarded_host: bool,
}

impl Default for HostPolicy {
    fn default() -> Self {
        Self::new(
            vec![
                "localhost".to_string(),
                "127.0.0.1".to_string(),
                "[::1]".to_string(),
            ],
            false,
        )
    }
}

impl HostPolicy {
    pub fn new(allowed_hosts: Vec<String>, use_x_forwarded_host: bool) -> Self {
        Self {
            allowed_hosts: allowed_hosts
                .into_iter()
                .map(|h| h.to_ascii_lowercase())
                .collect(),
            use_x_forwarded_host,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.allowed_hosts.clone(), config.use_x_forwarded_host)
    }

    /// `*` matches anything, `.example.com` matches `example.com` and its
    /// subdomains, anything else must match exactly. Ports are ignored.
    pub fn is_allowed(&self, host: &str) -> bool {
        let Some(domain) = host_domain(host) else {
            return false;
        };

        self.allowed_hosts.iter().any(|pattern| {
            pattern == "*"
                || match pattern.strip_prefix('.') {
                    Some(parent) => domain == parent || domain.ends_with(pattern.as_str()),
                    None => domain == *pattern,
                }
        })
    }
}

/// Lowercased host without its port, `None` when malformed
fn host_domain(host: &str) -> Option<String> {
    let host = host.to_ascii_lowercase();
    let well_formed = !host.is_empty()
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | ':' | '[' | ']' | '_'));
    if !well_formed {
        return None;
    }

    if host.ends_with(']') {
        return Some(host);
    }

    let domain = match host.rsplit_once(':') {
        Some((domain, port)) if port.chars().all(|c| c.is_ascii_digit()) => domain,
        Some(_) => return None,
        None => host.as_str(),
    };

    Some(domain.trim_end_matches('.').to_string()).filter(|d| !d.is_empty())
}

/// Host the request was addressed to, checked against the [`HostPolicy`].
/// `X-Forwarded-Host` is only read when the policy trusts it.
#[derive(Debug, Clone)]
pub struct RequestHost(pub String);

impl<S> FromRequestParts<S> for RequestHost
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let policy = parts
            .extensions
            .get::<Arc<HostPolicy>>()
            .cloned()
            .unwrap_or_default();

        let forwarded = if policy.use_x_forwarded_host {
            parts
                .headers
                .get("x-forwarded-host")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .map(str::trim)
        } else {
            None
        };

        let host = forwarded
            .or_else(|| {
                parts
                    .headers
                    .get(header::HOST)
                    .and_then(|v| v.to_str().ok())
            })
            .or_else(|| parts.uri.authority().map(|a| a.as_str()))
            .filter(|h| !h.is_empty())
            .ok_or_else(|| AppError::BadRequest("Missing host header".to_string()))?;

        if !policy.is_allowed(host) {
            tracing::warn!("Rejected request for disallowed host {}", host);
            return Err(AppError::BadRequest(format!(
                "Invalid host header: '{}'",
                host
            )));
        }

        Ok(RequestHost(host.to_string()))
    }
}

impl RequestHost {
    /// Resolve `link` against `https://{host}/`. Absolute links are kept.
    pub fn absolute(&self, link: &str) -> Result<String, AppError> {
        Url::parse(&format!("https://{}/", self.0))
            .and_then(|base| base.join(link))
            .map(String::from)
            .map_err(|e| AppError::BadRequest(format!("Invalid link {}: {}", link, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::get, Extension, Router};
    use tower::ServiceExt;

    async fn echo_host(host: RequestHost) -> String {
        host.0
    }

    fn host_router(policy: HostPolicy) -> Router {
        Router::new()
            .route("/host", get(echo_host))
            .layer(Extension(Arc::new(policy)))
    }

    async fn send(router: Router, headers: &[(&str, &str)]) -> (StatusCode, String) {
        let mut builder = axum::http::Request::builder().uri("/host");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let response = router
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    fn app_hosts() -> Vec<String> {
        vec!["app.example.com".to_string()]
    }

    #[tokio::test]
    async fn test_forwarded_host_ignored_by_default() {
        let router = host_router(HostPolicy::new(app_hosts(), false));
        let (status, body) = send(
            router,
            &[("host", "app.example.com"), ("x-forwarded-host", "evil.example.net")],
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "app.example.com");
    }

    #[tokio::test]
    async fn test_forwarded_host_must_be_allowed_when_trusted() {
        let (status, _) = send(
            host_router(HostPolicy::new(app_hosts(), true)),
            &[("host", "app.example.com"), ("x-forwarded-host", "evil.example.net")],
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            host_router(HostPolicy::new(app_hosts(), true)),
            &[("host", "10.0.0.5:8080"), ("x-forwarded-host", "app.example.com")],
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "app.example.com");
    }

    #[tokio::test]
    async fn test_disallowed_host_rejected() {
        let (status, _) = send(
            host_router(HostPolicy::new(app_hosts(), false)),
            &[("host", "evil.example.net")],
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_host_patterns() {
        let policy = HostPolicy::new(
            vec![".example.com".to_string(), "LOCALHOST".to_string()],
            false,
        );
        assert!(policy.is_allowed("example.com"));
        assert!(policy.is_allowed("files.example.com:8443"));
        assert!(policy.is_allowed("localhost:3000"));
        assert!(!policy.is_allowed("notexample.com"));
        assert!(!policy.is_allowed("example.com.evil.net"));
        assert!(!policy.is_allowed("bad host"));
        assert!(!policy.is_allowed("localhost:port"));

        assert!(HostPolicy::new(vec!["*".to_string()], false).is_allowed("anything.net"));
        assert!(HostPolicy::default().is_allowed("[::1]:8000"));
        assert!(!HostPolicy::default().is_allowed("app.example.com"));
    }

    #[test]
    fn test_absolute_joins_relative_links() {
        let host = RequestHost("docs.example.com".to_string());
        assert_eq!(
            host.absolute("/api/attachments/file/7").unwrap(),
            "https://docs.example.com/api/attachments/file/7"
        );
        assert_eq!(
            host.absolute("media/files/report.pdf").unwrap(),
            "https://docs.example.com/media/files/report.pdf"
        );
    }

    #[test]
    fn test_absolute_keeps_absolute_links() {
        let host = RequestHost("docs.example.com".to_string());
        assert_eq!(
            host.absolute("http://cdn.example.org/a.png?x=1").unwrap(),
            "http://cdn.example.org/a.png?x=1"
        );
    }
}
