use crate::shared::constants::{FILES_FOLDER, UNNAMED_FILE};
use crate::shared::text::{basename, slugify};

const UNKNOWN_APP: &str = "unknown";
const UNKNOWN_MODEL: &str = "tmp";

/// Storage key for an uploaded file:
/// `[prefix/]files/<app>/<model-slug>/[code/][object_id/]<basename>`.
///
/// Empty parts (and a zero object id) are skipped and every part has
/// surrounding `/` stripped. Without an owner the app is `unknown` and the
/// model `tmp`. A file name with no usable basename becomes `unnamed`.
pub fn generate_file_path(
    prefix: Option<&str>,
    owner: Option<(&str, &str)>,
    code: &str,
    object_id: Option<i64>,
    filename: &str,
) -> String {
    let (app, model) = owner.unwrap_or((UNKNOWN_APP, UNKNOWN_MODEL));
    let name = match basename(filename).trim() {
        "" | "." | ".." => UNNAMED_FILE,
        name => name,
    };

    let parts = [
        prefix.unwrap_or_default().to_string(),
        FILES_FOLDER.to_string(),
        app.to_string(),
        slugify(model),
        code.to_string(),
        object_id
            .filter(|id| *id != 0)
            .map(|id| id.to_string())
            .unwrap_or_default(),
        name.to_string(),
    ];

    parts
        .iter()
        .filter(|part| !part.is_empty())
        .map(|part| part.trim_matches('/'))
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_with_owner() {
        assert_eq!(
            generate_file_path(None, Some(("sample", "Author")), "author-image", Some(3), "test.pdf"),
            "files/sample/author/author-image/3/test.pdf"
        );
    }

    #[test]
    fn test_path_without_owner() {
        assert_eq!(
            generate_file_path(None, None, "", None, "test.pdf"),
            "files/unknown/tmp/test.pdf"
        );
    }

    #[test]
    fn test_path_with_prefix() {
        assert_eq!(
            generate_file_path(Some("/sample/"), None, "", None, "test.pdf"),
            "sample/files/unknown/tmp/test.pdf"
        );
    }

    #[test]
    fn test_path_uses_basename_and_slug() {
        assert_eq!(
            generate_file_path(
                None,
                Some(("shop.billing", "Purchase Order")),
                "",
                Some(0),
                "../../etc/passwd"
            ),
            "files/shop.billing/purchase-order/passwd"
        );
    }

    #[test]
    fn test_path_without_file_name() {
        assert_eq!(
            generate_file_path(None, None, "", None, ""),
            "files/unknown/tmp/unnamed"
        );
        assert_eq!(
            generate_file_path(None, None, "", None, "uploads/"),
            "files/unknown/tmp/unnamed"
        );
        assert_eq!(
            generate_file_path(None, None, "", None, ".."),
            "files/unknown/tmp/unnamed"
        );
    }
}
