/// Default page size for pagination
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Maximum page size allowed
pub const MAX_PAGE_SIZE: i64 = 100;

// =============================================================================
// ROLE CONSTANTS
// =============================================================================

/// Super admin role - implies every other role
pub const ROLE_SUPER_ADMIN: &str = "super_admin";

/// Staff role - can manage file types, content types and browse all attachments
pub const ROLE_STAFF: &str = "staff";

// =============================================================================
// ATTACHMENTS
// =============================================================================

/// Date format of `created` in the flat projection, e.g. "05 Mar 2024"
pub const FLAT_DATE_FORMAT: &str = "%d %b %Y";

/// Default table holding the flat projection
pub const DEFAULT_FLAT_TABLE: &str = "attachments_flat";

/// Route serving the redirect for a single attachment
pub const FILE_LINK_PREFIX: &str = "/api/attachments/file";

/// Folder every generated file key starts with (after the optional prefix)
pub const FILES_FOLDER: &str = "files";

/// Name given to uploads that arrive without a usable file name
pub const UNNAMED_FILE: &str = "unnamed";
