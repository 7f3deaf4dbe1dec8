use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::features::file_types::models::{FileType, MergePlan};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FileTypeResponseDto {
    pub id: i64,
    pub name: String,
    pub label: String,
    pub code: String,
    pub order: i32,
    pub group: Vec<String>,
}

impl From<FileType> for FileTypeResponseDto {
    fn from(ft: FileType) -> Self {
        Self {
            id: ft.id,
            name: ft.name,
            label: ft.label,
            code: ft.code,
            order: ft.position,
            group: ft.groups,
        }
    }
}

/// Filters for listing file types
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct FileTypeQueryParams {
    /// Exact code match
    pub code: Option<String>,
    /// Comma-separated groups; a file type must belong to all of them
    pub group: Option<String>,
}

impl FileTypeQueryParams {
    pub fn groups(&self) -> Vec<String> {
        self.group
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|g| !g.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateFileTypeDto {
    #[validate(length(min = 1, max = 64))]
    pub name: String,

    #[validate(length(min = 1, max = 64))]
    pub label: String,

    #[validate(length(max = 64))]
    #[serde(default)]
    pub code: String,

    #[serde(default)]
    pub group: Vec<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateFileTypeDto {
    #[validate(length(min = 1, max = 64))]
    pub name: Option<String>,

    #[validate(length(min = 1, max = 64))]
    pub label: Option<String>,

    #[validate(length(max = 64))]
    pub code: Option<String>,

    pub group: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    Up,
    Down,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CleanupReportDto {
    pub merged: Vec<MergePlan>,
    pub removed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_groups_parsing() {
        let query = FileTypeQueryParams {
            code: None,
            group: Some("group1, group2,,".to_string()),
        };
        assert_eq!(query.groups(), vec!["group1", "group2"]);
        assert!(FileTypeQueryParams::default().groups().is_empty());
    }

    #[test]
    fn test_create_validation() {
        let dto: CreateFileTypeDto =
            serde_json::from_value(serde_json::json!({"name": "report", "label": "Report"}))
                .unwrap();
        assert!(dto.validate().is_ok());
        assert_eq!(dto.code, "");

        let too_long = CreateFileTypeDto {
            name: "n".repeat(65),
            label: "Label".to_string(),
            code: String::new(),
            group: vec![],
        };
        assert!(too_long.validate().is_err());
    }

    #[test]
    fn test_move_direction_deserializes() {
        let dir: MoveDirection = serde_json::from_str("\"up\"").unwrap();
        assert_eq!(dir, MoveDirection::Up);
    }
}
