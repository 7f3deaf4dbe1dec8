use crate::core::config::AttachmentConfig;
use crate::core::error::{AppError, Result};

const MIME_OCTET_STREAM: &str = "application/octet-stream";
const MIME_PLAIN_TEXT: &str = "text/plain";
const MIME_EMPTY: &str = "application/x-empty";

/// Rejects uploads whose sniffed content type is on the deny list
#[derive(Debug, Clone)]
pub struct SafeFileValidator {
    invalid_types: Vec<String>,
    mime_lookup_length: usize,
}

impl SafeFileValidator {
    pub fn new(config: &AttachmentConfig) -> Self {
        Self {
            invalid_types: config.invalid_file_types.clone(),
            mime_lookup_length: config.mime_lookup_length,
        }
    }

    /// Content type sniffed from the leading bytes
    pub fn sniff(&self, data: &[u8]) -> String {
        let head = &data[..data.len().min(self.mime_lookup_length)];
        sniff_mime(head)
    }

    /// Validate `data`, returning the content type to store it with. The
    /// sniffed type always wins over the one the client declared.
    pub fn validate(&self, data: &[u8], declared: Option<&str>) -> Result<String> {
        let sniffed = self.sniff(data);

        if let Some(declared) = declared {
            if declared != sniffed {
                tracing::debug!("Declared type {} differs from sniffed {}", declared, sniffed);
            }
        }

        if self.invalid_types.iter().any(|t| *t == sniffed) {
            return Err(AppError::Validation(format!(
                "Unsupported file type: {}.",
                sniffed
            )));
        }

        Ok(sniffed)
    }
}

fn sniff_mime(head: &[u8]) -> String {
    if head.is_empty() {
        return MIME_EMPTY.to_string();
    }

    // before infer, which reports every `#!` file as a generic shell script
    if let Some(mime) = script_mime(head) {
        return mime.to_string();
    }

    if let Some(kind) = infer::get(head) {
        return match kind.mime_type() {
            "application/vnd.microsoft.portable-executable" => "application/x-msdownload",
            other => other,
        }
        .to_string();
    }

    match std::str::from_utf8(head) {
        Ok(_) => MIME_PLAIN_TEXT.to_string(),
        // a multi-byte character cut off by the lookup window
        Err(e) if e.error_len().is_none() => MIME_PLAIN_TEXT.to_string(),
        Err(_) => MIME_OCTET_STREAM.to_string(),
    }
}

/// Interpreter named by a `#!` line
fn script_mime(head: &[u8]) -> Option<&'static str> {
    let rest = head.strip_prefix(b"#!")?;
    let line = rest.split(|b| *b == b'\n').next().unwrap_or_default();
    let line = std::str::from_utf8(line).ok()?;

    let mut words = line.split_whitespace();
    let mut program = words.next()?.rsplit('/').next()?;
    if program == "env" {
        program = words.find(|w| !w.starts_with('-'))?;
    }

    if program.starts_with("python") {
        Some("text/x-python")
    } else if program.starts_with("perl") {
        Some("text/x-perl")
    } else if matches!(program, "sh" | "bash" | "dash" | "zsh" | "ksh" | "ash") {
        Some("application/x-sh")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> SafeFileValidator {
        SafeFileValidator::new(&AttachmentConfig::default())
    }

    #[test]
    fn test_plain_text_allowed() {
        assert_eq!(
            validator().validate(b"hello world", Some("text/plain")).unwrap(),
            "text/plain"
        );
    }

    #[test]
    fn test_sniffed_type_beats_declared() {
        let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];
        assert_eq!(
            validator().validate(&png, Some("application/pdf")).unwrap(),
            "image/png"
        );
    }

    #[test]
    fn test_scripts_rejected() {
        let cases: [(&[u8], &str); 4] = [
            (b"#!/usr/bin/env python3\nprint('hi')\n", "text/x-python"),
            (b"#!/usr/bin/python\nimport os\n", "text/x-python"),
            (b"#!/usr/bin/perl -w\nprint 1;\n", "text/x-perl"),
            (b"#!/bin/bash\nrm -rf /\n", "application/x-sh"),
        ];

        for (data, mime) in cases {
            match validator().validate(data, Some("text/plain")) {
                Err(AppError::Validation(msg)) => {
                    assert_eq!(msg, format!("Unsupported file type: {}.", mime))
                }
                other => panic!("expected rejection for {}, got {:?}", mime, other),
            }
        }
    }

    #[test]
    fn test_windows_executable_rejected() {
        let mut exe = vec![0u8; 256];
        exe[0] = b'M';
        exe[1] = b'Z';
        exe[0x3C] = 0x80;
        exe[0x80..0x84].copy_from_slice(b"PE\0\0");

        assert!(validator().validate(&exe, None).is_err());
    }

    #[test]
    fn test_custom_deny_list() {
        let config = AttachmentConfig {
            invalid_file_types: vec!["text/plain".to_string()],
            ..AttachmentConfig::default()
        };
        let validator = SafeFileValidator::new(&config);

        assert!(validator.validate(b"just text", None).is_err());
        assert!(validator
            .validate(b"#!/usr/bin/env python\n", None)
            .is_ok());
    }

    #[test]
    fn test_lookup_window() {
        let config = AttachmentConfig {
            mime_lookup_length: 4,
            ..AttachmentConfig::default()
        };
        let validator = SafeFileValidator::new(&config);

        // "é" split by the window still counts as text
        assert_eq!(validator.sniff("abcé".as_bytes()), "text/plain");
        assert_eq!(
            validator.sniff(&[0x01, 0x9f, 0x92, 0x96, 0x80]),
            "application/octet-stream"
        );
        assert_eq!(validator.sniff(b""), "application/x-empty");
    }
}
