use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

/// Ordered, labeled classification tag for attachments
#[derive(Debug, Clone, FromRow)]
pub struct FileType {
    pub id: i64,
    pub name: String,
    pub label: String,
    pub code: String,
    pub position: i32,
    pub groups: Vec<String>,
}

impl std::fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label)
    }
}

/// Duplicates folded into a primary file type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct MergePlan {
    pub primary_id: i64,
    pub duplicate_ids: Vec<i64>,
    /// Primary groups followed by the groups of each duplicate
    pub groups: Vec<String>,
}

/// Key a file type is grouped under: an existing key sharing its label or
/// its name (case-insensitive), otherwise its own `(label, name)`.
pub fn matching_key(file_type: &FileType, keys: &[(String, String)]) -> (String, String) {
    let label = file_type.label.to_lowercase();
    let name = file_type.name.to_lowercase();

    keys.iter()
        .find(|(k_label, k_name)| *k_label == label || *k_name == name)
        .cloned()
        .unwrap_or((label, name))
}

/// Group file types (sorted by id) into merges. The lowest id in each
/// group is kept; groups with a single member produce no plan.
pub fn plan_file_type_merges(file_types: &[FileType]) -> Vec<MergePlan> {
    let mut keys: Vec<(String, String)> = Vec::new();
    let mut members: Vec<Vec<&FileType>> = Vec::new();

    for file_type in file_types {
        let key = matching_key(file_type, &keys);
        match keys.iter().position(|k| *k == key) {
            Some(idx) => members[idx].push(file_type),
            None => {
                keys.push(key);
                members.push(vec![file_type]);
            }
        }
    }

    members
        .into_iter()
        .filter(|group| group.len() > 1)
        .map(|group| {
            let (primary, duplicates) = group.split_at(1);
            let mut groups = primary[0].groups.clone();
            for dup in duplicates {
                groups.extend(dup.groups.iter().cloned());
            }
            MergePlan {
                primary_id: primary[0].id,
                duplicate_ids: duplicates.iter().map(|d| d.id).collect(),
                groups,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file_type(id: i64, label: &str, name: &str, groups: &[&str]) -> FileType {
        FileType {
            id,
            name: name.to_string(),
            label: label.to_string(),
            code: String::new(),
            position: id as i32,
            groups: groups.iter().map(|g| g.to_string()).collect(),
        }
    }

    #[test]
    fn test_matching_key_on_label_or_name() {
        let keys = vec![("other".to_string(), "something".to_string())];

        let same_label = file_type(2, "Other", "different", &[]);
        assert_eq!(matching_key(&same_label, &keys), keys[0]);

        let same_name = file_type(3, "FT4", "SOMETHING", &[]);
        assert_eq!(matching_key(&same_name, &keys), keys[0]);

        let unrelated = file_type(4, "PD", "pd", &[]);
        assert_eq!(
            matching_key(&unrelated, &keys),
            ("pd".to_string(), "pd".to_string())
        );
    }

    #[test]
    fn test_plan_merges_into_lowest_id() {
        let file_types = vec![
            file_type(1, "Other", "something", &[]),
            file_type(2, "Other", "different", &["ft2"]),
            file_type(3, "PD", "pd", &["ft3"]),
            file_type(4, "FT4", "something", &["ft4"]),
        ];

        let plans = plan_file_type_merges(&file_types);
        assert_eq!(
            plans,
            vec![MergePlan {
                primary_id: 1,
                duplicate_ids: vec![2, 4],
                groups: vec!["ft2".to_string(), "ft4".to_string()],
            }]
        );
    }

    #[test]
    fn test_plan_nothing_to_merge() {
        let file_types = vec![
            file_type(1, "Report", "report", &["a"]),
            file_type(2, "Photo", "photo", &["b"]),
        ];
        assert!(plan_file_type_merges(&file_types).is_empty());
    }

    #[test]
    fn test_display_is_label() {
        assert_eq!(file_type(1, "Signed Contract", "contract", &[]).to_string(), "Signed Contract");
    }
}
