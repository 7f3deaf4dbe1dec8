use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::features::file_types::dtos::MoveDirection;
use crate::shared::constants::DEFAULT_PAGE_SIZE;
use crate::shared::types::PaginationQuery;

// =============================================================================
// ATTACHMENT DTOs
// =============================================================================

/// Query params for the admin attachment listing
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct AdminAttachmentQueryParams {
    /// Page number (1-indexed)
    #[serde(default = "default_page")]
    #[param(minimum = 1)]
    pub page: i64,
    /// Items per page
    #[serde(default = "default_page_size")]
    #[param(minimum = 1, maximum = 100)]
    pub page_size: i64,
    pub file_type_id: Option<i64>,
    /// Subject of the uploader
    pub uploaded_by: Option<String>,
    /// Owner application label, combined with `model`
    pub app_label: Option<String>,
    pub model: Option<String>,
    pub object_id: Option<i64>,
    pub code: Option<String>,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

impl AdminAttachmentQueryParams {
    pub fn pagination(&self) -> PaginationQuery {
        PaginationQuery {
            page: self.page,
            page_size: self.page_size,
        }
    }
}

/// Attachment with owner and file type details, as listed for admins
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdminAttachmentDto {
    pub id: i64,
    pub file_type_id: Option<i64>,
    pub file_type: Option<String>,
    pub filename: String,
    /// URL of the stored file
    pub file: Option<String>,
    pub hyperlink: String,
    pub app_label: Option<String>,
    pub model: Option<String>,
    pub object_id: Option<i64>,
    pub object_link: String,
    pub code: String,
    pub uploaded_by: Option<String>,
    pub uploaded_by_name: Option<String>,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DenormalizeReportDto {
    /// Flat rows written
    pub denormalized: usize,
}

// =============================================================================
// FILE TYPE DTOs
// =============================================================================

#[derive(Debug, Deserialize, ToSchema)]
pub struct MoveFileTypeDto {
    pub direction: MoveDirection,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_defaults() {
        let params: AdminAttachmentQueryParams =
            serde_json::from_value(serde_json::json!({"code": "invoice"})).unwrap();
        assert_eq!(params.page, 1);
        assert_eq!(params.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(params.code.as_deref(), Some("invoice"));
        assert_eq!(params.pagination().offset(), 0);
    }

    #[test]
    fn test_move_direction_parsing() {
        let dto: MoveFileTypeDto =
            serde_json::from_value(serde_json::json!({"direction": "up"})).unwrap();
        assert_eq!(dto.direction, MoveDirection::Up);
        assert!(
            serde_json::from_value::<MoveFileTypeDto>(serde_json::json!({"direction": "left"}))
                .is_err()
        );
    }
}
