use base64::prelude::*;
use bytes::Bytes;
use uuid::Uuid;

use crate::core::error::{AppError, Result};

const INCORRECT_FORMAT: &str = "Incorrect base64 format.";

/// Extensions for types where the registry order would pick an odd one
const PREFERRED_EXTENSIONS: &[(&str, &str)] = &[
    ("text/plain", "txt"),
    ("image/jpeg", "jpg"),
    ("application/pdf", "pdf"),
    ("image/png", "png"),
    ("image/gif", "gif"),
    ("image/tiff", "tiff"),
    ("image/svg+xml", "svg"),
    ("text/html", "html"),
    ("text/csv", "csv"),
    ("application/json", "json"),
    ("application/msword", "doc"),
    ("application/zip", "zip"),
    ("audio/mpeg", "mp3"),
    ("video/mp4", "mp4"),
];

/// File decoded from a `data:<mime>;base64,<payload>` value
#[derive(Debug, Clone)]
pub struct Base64File {
    pub name: String,
    pub content_type: String,
    pub data: Bytes,
}

fn guess_extension(mime: &str) -> Option<&'static str> {
    PREFERRED_EXTENSIONS
        .iter()
        .find(|(m, _)| *m == mime)
        .map(|(_, ext)| *ext)
        .or_else(|| {
            mime_guess::get_mime_extensions_str(mime).and_then(|exts| exts.first().copied())
        })
}

/// Decode a base64 data value. The generated name is `{uuid4}.{ext}`
/// unless `file_name` is given.
pub fn decode_base64_file(value: &serde_json::Value, file_name: Option<&str>) -> Result<Base64File> {
    let incorrect = || AppError::Validation(INCORRECT_FORMAT.to_string());

    let raw = value.as_str().ok_or_else(incorrect)?;
    let stripped = raw.replacen("data:", "", 1);

    let parts: Vec<&str> = stripped.split(";base64,").collect();
    let [mime, payload] = parts.as_slice() else {
        return Err(incorrect());
    };

    let extension = guess_extension(mime).ok_or_else(incorrect)?;

    let cleaned: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let data = BASE64_STANDARD.decode(cleaned).map_err(|_| incorrect())?;

    let name = match file_name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => name.to_string(),
        None => format!("{}.{}", Uuid::new_v4(), extension),
    };

    Ok(Base64File {
        name,
        content_type: mime.to_string(),
        data: Bytes::from(data),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn assert_incorrect(result: Result<Base64File>) {
        match result {
            Err(AppError::Validation(msg)) => assert_eq!(msg, INCORRECT_FORMAT),
            other => panic!("expected base64 format error, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_text() {
        let file = decode_base64_file(&json!("data:text/plain;base64,aGVsbG8gd29ybGQ="), None).unwrap();
        assert_eq!(file.data.as_ref(), b"hello world");
        assert_eq!(file.content_type, "text/plain");
        assert!(file.name.ends_with(".txt"));
        // uuid4 + ".txt"
        assert_eq!(file.name.len(), 36 + 4);
    }

    #[test]
    fn test_file_name_override() {
        let file = decode_base64_file(
            &json!("data:application/pdf;base64,JVBERi0xLjQ="),
            Some("contract.pdf"),
        )
        .unwrap();
        assert_eq!(file.name, "contract.pdf");
    }

    #[test]
    fn test_without_data_prefix() {
        let file = decode_base64_file(&json!("image/jpeg;base64,/9j/4AAQ"), None).unwrap();
        assert!(file.name.ends_with(".jpg"));
    }

    #[test]
    fn test_rejects_non_string() {
        assert_incorrect(decode_base64_file(&json!(123), None));
        assert_incorrect(decode_base64_file(&json!({"file": "x"}), None));
        assert_incorrect(decode_base64_file(&serde_json::Value::Null, None));
    }

    #[test]
    fn test_rejects_missing_marker() {
        assert_incorrect(decode_base64_file(&json!("data:text/plain,aGVsbG8="), None));
        assert_incorrect(decode_base64_file(
            &json!("data:text/plain;base64,aGVs;base64,bG8="),
            None,
        ));
    }

    #[test]
    fn test_rejects_unknown_mime_and_bad_payload() {
        assert_incorrect(decode_base64_file(&json!("data:foo/bar-baz;base64,aGVsbG8="), None));
        assert_incorrect(decode_base64_file(&json!("data:text/plain;base64,not base64!"), None));
    }
}
