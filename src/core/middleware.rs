use crate::core::error::AppError;
use crate::features::attachments::extensions::AttachmentPermission;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::auth::JwtValidator;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use base64::prelude::*;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestId, RequestId};
use tracing::Span;
use uuid::Uuid;

/// Request ID generator using UUID v7 (time-ordered)
#[derive(Clone, Copy)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::now_v7().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// MakeSpan that carries the request id into the tracing span
#[derive(Clone, Debug)]
pub struct MakeSpanWithRequestId;

impl<B> tower_http::trace::MakeSpan<B> for MakeSpanWithRequestId {
    fn make_span(&mut self, request: &axum::http::Request<B>) -> Span {
        let request_id = request
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");

        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = %request_id,
        )
    }
}

pub fn cors_layer(allowed_origins: Vec<String>) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if allowed_origins.iter().any(|o| o == "*") {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(AllowOrigin::list(origins))
    }
}

/// Basic auth gate for the Swagger UI
pub async fn basic_auth_middleware(
    State(credentials): State<Arc<String>>,
    req: Request,
    next: Next,
) -> Response {
    let authorized = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Basic "))
        .and_then(|encoded| BASE64_STANDARD.decode(encoded).ok())
        .and_then(|decoded| String::from_utf8(decoded).ok())
        .is_some_and(|creds| creds == *credentials);

    if authorized {
        return next.run(req).await;
    }

    let mut response = Response::new(Body::from("Unauthorized"));
    *response.status_mut() = StatusCode::UNAUTHORIZED;
    response.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"Swagger UI\""),
    );
    response
}

/// Resolve the bearer token, if any, into an `AuthenticatedUser`.
///
/// Requests without an Authorization header pass through anonymously so the
/// configured permission policy can decide; a malformed or invalid token is
/// rejected with 401.
pub async fn auth_middleware(
    State(validator): State<Arc<JwtValidator>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(auth_header) = req.headers().get(header::AUTHORIZATION) else {
        return Ok(next.run(req).await);
    };

    let auth_header = auth_header
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid authorization header".to_string()))?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        AppError::Unauthorized("Invalid authorization header format".to_string())
    })?;

    let user = validator.validate_token(token)?;

    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// Enforce the configured attachment permission policy
pub async fn permission_middleware(
    State(permission): State<Arc<dyn AttachmentPermission>>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = req.extensions().get::<AuthenticatedUser>();

    if !permission.has_permission(user, req.method()) {
        return Err(match user {
            None => AppError::Unauthorized(
                "Authentication credentials were not provided.".to_string(),
            ),
            Some(_) => AppError::Forbidden(
                "You do not have permission to perform this action.".to_string(),
            ),
        });
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::AuthConfig;
    use crate::features::attachments::extensions::{IsStaff, ReadOnlyOrAuthenticated};
    use crate::features::auth::guards::MaybeUser;
    use axum::{
        http::Method,
        middleware::{from_fn, from_fn_with_state},
        routing::get,
        Router,
    };
    use std::time::Duration;
    use tower::ServiceExt;

    async fn whoami(MaybeUser(user): MaybeUser) -> String {
        user.map(|u| u.sub).unwrap_or_else(|| "anonymous".to_string())
    }

    fn auth_router() -> Router {
        let validator = Arc::new(JwtValidator::new(&AuthConfig {
            jwt_secret: "test-secret".to_string(),
            issuer: None,
            audience: None,
            jwt_leeway: Duration::from_secs(0),
        }));

        Router::new()
            .route("/whoami", get(whoami))
            .layer(from_fn_with_state(validator, auth_middleware))
    }

    fn request(method: Method, authorization: Option<&str>) -> Request {
        let mut builder = axum::http::Request::builder().method(method).uri("/whoami");
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_missing_token_passes_through() {
        let response = auth_router()
            .oneshot(request(Method::GET, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_bad_tokens_are_rejected() {
        for value in ["Token abc", "Bearer not-a-jwt"] {
            let response = auth_router()
                .oneshot(request(Method::GET, Some(value)))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }
    }

    #[tokio::test]
    async fn test_permission_policy() {
        let read_only: Arc<dyn AttachmentPermission> = Arc::new(ReadOnlyOrAuthenticated);
        let router = Router::new()
            .route("/whoami", get(whoami).post(whoami))
            .route_layer(from_fn_with_state(read_only, permission_middleware));

        let response = router
            .clone()
            .oneshot(request(Method::GET, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = router
            .oneshot(request(Method::POST, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_permission_denied_for_authenticated_user_is_forbidden() {
        let staff_only: Arc<dyn AttachmentPermission> = Arc::new(IsStaff);
        let router = Router::new()
            .route("/whoami", get(whoami))
            .route_layer(from_fn_with_state(staff_only, permission_middleware))
            .layer(from_fn(|mut req: Request, next: Next| async move {
                req.extensions_mut()
                    .insert(crate::shared::test_helpers::create_user(&["viewer"]));
                next.run(req).await
            }));

        let response = router
            .oneshot(request(Method::GET, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}
