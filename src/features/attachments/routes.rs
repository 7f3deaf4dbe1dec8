use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, FromRef},
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};

use crate::core::middleware::permission_middleware;
use crate::features::attachments::extensions::AttachmentPermission;
use crate::features::attachments::handlers;
use crate::features::attachments::services::{AttachmentService, LinkService};
use crate::features::content_types::ContentTypeService;

/// Multipart framing on top of the file itself
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

#[derive(Clone, FromRef)]
pub struct AttachmentsState {
    pub attachments: Arc<AttachmentService>,
    pub links: Arc<LinkService>,
    pub content_types: Arc<ContentTypeService>,
}

/// Public attachment routes, see [`with_permission`]
pub fn routes(state: AttachmentsState) -> Router {
    let body_limit = DefaultBodyLimit::max(state.attachments.max_file_size() + MULTIPART_OVERHEAD);

    Router::new()
        .route(
            "/api/attachments",
            get(handlers::list_attachments).post(handlers::create_attachment),
        )
        .route(
            "/api/attachments/upload",
            post(handlers::upload_attachment).layer(body_limit),
        )
        .route(
            "/api/attachments/upload/{id}",
            put(handlers::replace_attachment_file)
                .patch(handlers::replace_attachment_file)
                .layer(body_limit),
        )
        .route("/api/attachments/file/{id}", get(handlers::redirect_to_file))
        .route(
            "/api/attachments/links/{app_label}/{model}/{object_id}",
            get(handlers::list_links).post(handlers::create_link),
        )
        .route("/api/attachments/links/{id}", delete(handlers::delete_link))
        .route(
            "/api/attachments/owner/{app_label}/{model}/{object_id}",
            get(handlers::list_owner_attachments),
        )
        .route(
            "/api/attachments/owner/{app_label}/{model}/{object_id}/latest",
            get(handlers::latest_owner_attachment),
        )
        .route(
            "/api/attachments/{id}",
            get(handlers::get_attachment).patch(handlers::update_attachment),
        )
        .route(
            "/api/attachments/{id}/owner",
            put(handlers::associate_attachment),
        )
        .with_state(state)
}

/// Guard every route of `router` with the configured permission policy
pub fn with_permission(router: Router, permission: Arc<dyn AttachmentPermission>) -> Router {
    router.route_layer(from_fn_with_state(permission, permission_middleware))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, StatusCode};
    use axum::Extension;
    use axum_test::multipart::{MultipartForm, Part};
    use axum_test::TestServer;
    use serde_json::{json, Value};
    use sqlx::PgPool;
    use tower::ServiceExt;

    use crate::core::extractor::HostPolicy;
    use crate::features::attachments::dtos::CreateAttachmentDto;
    use crate::shared::test_helpers::{
        attachments_state, create_user, public_router, public_router_with_pool, with_user,
    };

    fn server(root: &std::path::Path, authenticated: bool) -> TestServer {
        let router = public_router(root);
        let router = if authenticated {
            with_user(router, create_user(&[]))
        } else {
            router
        };
        TestServer::new(router).unwrap()
    }

    #[tokio::test]
    async fn test_anonymous_requests_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let server = server(dir.path(), false);

        let response = server.get("/api/attachments").await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        let body: Value = response.json();
        assert_eq!(body["message"], "Authentication credentials were not provided.");

        server
            .get("/api/file-types")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_wrong_method_is_not_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let server = server(dir.path(), true);

        server
            .delete("/api/attachments")
            .await
            .assert_status(StatusCode::METHOD_NOT_ALLOWED);
        server
            .post("/api/attachments/file/1")
            .await
            .assert_status(StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_upload_rejects_scripts() {
        let dir = tempfile::tempdir().unwrap();
        let server = server(dir.path(), true);

        let part = Part::bytes(b"#!/usr/bin/env python\nprint('hi')\n".to_vec())
            .file_name("notes.txt")
            .mime_type("text/plain");
        let response = server
            .post("/api/attachments/upload")
            .multipart(MultipartForm::new().add_part("file", part))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["message"], "Unsupported file type: text/x-python.");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_upload_requires_file_part() {
        let dir = tempfile::tempdir().unwrap();
        let server = server(dir.path(), true);

        let response = server
            .post("/api/attachments/upload")
            .multipart(MultipartForm::new().add_text("code", "invoice"))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["message"], "File is required");
    }

    #[tokio::test]
    async fn test_create_requires_file_or_hyperlink() {
        let dir = tempfile::tempdir().unwrap();
        let server = server(dir.path(), true);

        let response = server.post("/api/attachments").json(&json!({})).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["message"], "Please provide file or hyperlink.");

        let response = server
            .post("/api/attachments")
            .json(&json!({
                "file": "data:text/plain;base64,aGVsbG8=",
                "hyperlink": "https://example.com/report.pdf"
            }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["errors"][0], "Please provide file or hyperlink.");
    }

    #[tokio::test]
    async fn test_create_rejects_bad_base64() {
        let dir = tempfile::tempdir().unwrap();
        let server = server(dir.path(), true);

        for file in [json!("aGVsbG8="), json!(42), json!("data:text/plain;base64,@@@")] {
            let response = server
                .post("/api/attachments")
                .json(&json!({ "file": file }))
                .await;
            response.assert_status(StatusCode::BAD_REQUEST);
            let body: Value = response.json();
            assert_eq!(body["message"], "Incorrect base64 format.");
        }
    }

    #[tokio::test]
    async fn test_links_of_invalid_content_type_are_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let server = server(dir.path(), true);

        server
            .get("/api/attachments/links/bad-label/author/1")
            .await
            .assert_status(StatusCode::NOT_FOUND);
        server
            .get("/api/attachments/owner/sample/author-image/1")
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_upload_responds_with_flat_row(pool: PgPool) {
        let dir = tempfile::tempdir().unwrap();
        let server = TestServer::new(with_user(
            public_router_with_pool(pool, dir.path()),
            create_user(&[]),
        ))
        .unwrap();

        let part = Part::bytes(b"minutes of the meeting\n".to_vec())
            .file_name("report..v2.txt")
            .mime_type("text/plain");
        let response = server
            .post("/api/attachments/upload")
            .multipart(MultipartForm::new().add_part("file", part))
            .await;

        response.assert_status(StatusCode::OK);
        let body: Value = response.json();
        let id = body["data"]["id"].as_i64().unwrap();
        assert_eq!(body["data"]["filename"], "report..v2.txt");
        assert_eq!(body["data"]["uploaded_by"], "Test User");
        assert_eq!(
            body["data"]["file_link"],
            format!("/api/attachments/file/{}", id)
        );

        let listed: Value = server.get("/api/attachments").await.json();
        assert_eq!(listed["data"].as_array().unwrap().len(), 1);
        assert_eq!(listed["data"][0]["id"], id);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_file_redirect_uses_trusted_host(pool: PgPool) {
        let dir = tempfile::tempdir().unwrap();
        let created = attachments_state(pool.clone(), dir.path())
            .attachments
            .create(
                None,
                CreateAttachmentDto {
                    file: None,
                    file_name: None,
                    hyperlink: Some("/docs/handbook.pdf".to_string()),
                    file_type: None,
                },
            )
            .await
            .unwrap();

        let router = with_user(public_router_with_pool(pool, dir.path()), create_user(&[]))
            .layer(Extension(Arc::new(HostPolicy::new(
                vec!["app.example.com".to_string()],
                false,
            ))));
        let request = |host: &str| {
            axum::http::Request::builder()
                .uri(format!("/api/attachments/file/{}", created.id))
                .header(header::HOST, host)
                .header("x-forwarded-host", "evil.example.net")
                .body(Body::empty())
                .unwrap()
        };

        let response = router
            .clone()
            .oneshot(request("app.example.com"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers()[header::LOCATION],
            "https://app.example.com/docs/handbook.pdf"
        );

        let response = router.oneshot(request("evil.example.net")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
