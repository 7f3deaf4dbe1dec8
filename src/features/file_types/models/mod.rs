mod file_type;

pub use file_type::{matching_key, plan_file_type_merges, FileType, MergePlan};
