use std::sync::Arc;

use axum::{
    extract::FromRef,
    routing::{delete, get, post},
    Router,
};

use crate::features::admin::handlers;
use crate::features::admin::services::AdminService;
use crate::features::content_types::ContentTypeService;
use crate::features::file_types::FileTypeService;

#[derive(Clone, FromRef)]
pub struct AdminState {
    pub admin: Arc<AdminService>,
    pub file_types: Arc<FileTypeService>,
    pub content_types: Arc<ContentTypeService>,
}

/// Create admin routes (all require staff access)
pub fn routes(state: AdminState) -> Router {
    Router::new()
        .route("/attachments", get(handlers::list_attachments))
        .route(
            "/attachments/denormalize",
            post(handlers::denormalize_attachments),
        )
        .route("/attachments/{id}", delete(handlers::delete_attachment))
        .route(
            "/file-types",
            get(handlers::list_file_types).post(handlers::create_file_type),
        )
        .route("/file-types/cleanup", post(handlers::cleanup_file_types))
        .route(
            "/file-types/{id}",
            get(handlers::get_file_type)
                .patch(handlers::update_file_type)
                .delete(handlers::delete_file_type),
        )
        .route("/file-types/{id}/move", post(handlers::move_file_type))
        .route(
            "/content-types",
            get(handlers::list_content_types).post(handlers::create_content_type),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::{json, Value};

    use crate::core::config::AttachmentConfig;
    use crate::features::attachments::extensions::ExtensionRegistry;
    use crate::features::attachments::AttachmentService;
    use crate::modules::storage::LocalStorage;
    use crate::shared::test_helpers::{create_staff_user, create_user, lazy_pool, with_user};

    fn admin_router(root: &std::path::Path) -> Router {
        let pool = lazy_pool();
        let config = AttachmentConfig::default();
        let extensions = ExtensionRegistry::with_defaults().resolve(&config).unwrap();
        let content_types = Arc::new(ContentTypeService::new(pool.clone()));
        let file_types = Arc::new(FileTypeService::new(pool.clone()));
        let attachments = Arc::new(
            AttachmentService::new(
                pool.clone(),
                Arc::new(LocalStorage::new(root, "http://localhost/media")),
                &extensions,
                &config,
                content_types.clone(),
                file_types.clone(),
            )
            .unwrap(),
        );

        Router::new().nest(
            "/api/admin",
            routes(AdminState {
                admin: Arc::new(AdminService::new(pool, attachments)),
                file_types,
                content_types,
            }),
        )
    }

    #[tokio::test]
    async fn test_admin_requires_authentication() {
        let dir = tempfile::tempdir().unwrap();
        let server = TestServer::new(admin_router(dir.path())).unwrap();

        server
            .get("/api/admin/attachments")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_admin_requires_staff() {
        let dir = tempfile::tempdir().unwrap();
        let router = with_user(admin_router(dir.path()), create_user(&["viewer"]));
        let server = TestServer::new(router).unwrap();

        let response = server.post("/api/admin/file-types/cleanup").await;
        response.assert_status(StatusCode::FORBIDDEN);
        let body: Value = response.json();
        assert_eq!(body["message"], "Staff access required");
    }

    #[tokio::test]
    async fn test_create_file_type_validates_before_saving() {
        let dir = tempfile::tempdir().unwrap();
        let router = with_user(admin_router(dir.path()), create_staff_user());
        let server = TestServer::new(router).unwrap();

        server
            .post("/api/admin/file-types")
            .json(&json!({"name": "", "label": "Invoice"}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_content_type_table_name_is_validated() {
        let dir = tempfile::tempdir().unwrap();
        let router = with_user(admin_router(dir.path()), create_staff_user());
        let server = TestServer::new(router).unwrap();

        server
            .post("/api/admin/content-types")
            .json(&json!({
                "app_label": "shop",
                "model": "order",
                "table_name": "orders; DROP TABLE attachments"
            }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}
