use std::sync::Arc;

use axum::{routing::get, Router};

use crate::features::file_types::handlers;
use crate::features::file_types::services::FileTypeService;

/// Public file type routes; management lives under the admin feature
pub fn routes(service: Arc<FileTypeService>) -> Router {
    Router::new()
        .route("/api/file-types", get(handlers::list_file_types))
        .with_state(service)
}
