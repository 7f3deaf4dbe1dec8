use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// SQL identifier used for table names (optionally schema qualified)
    /// - Valid: "attachments_flat", "public.orders", "_tmp1"
    /// - Invalid: "1table", "orders; drop", "a-b", "a..b"
    pub static ref IDENTIFIER_REGEX: Regex =
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)?$").unwrap();

    /// App label in owner URLs, word characters and dots
    pub static ref APP_LABEL_REGEX: Regex = Regex::new(r"^[\w\.]+$").unwrap();

    /// Model name in owner URLs, word characters only
    pub static ref MODEL_REGEX: Regex = Regex::new(r"^\w+$").unwrap();
}

pub fn is_valid_identifier(value: &str) -> bool {
    IDENTIFIER_REGEX.is_match(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_regex() {
        assert!(is_valid_identifier("attachments_flat"));
        assert!(is_valid_identifier("public.orders"));
        assert!(is_valid_identifier("_tmp1"));

        assert!(!is_valid_identifier("1table"));
        assert!(!is_valid_identifier("orders; drop table x"));
        assert!(!is_valid_identifier("a-b"));
        assert!(!is_valid_identifier("a..b"));
        assert!(!is_valid_identifier(""));
    }

    #[test]
    fn test_app_label_and_model_regex() {
        assert!(APP_LABEL_REGEX.is_match("shop.orders"));
        assert!(APP_LABEL_REGEX.is_match("auth"));
        assert!(!APP_LABEL_REGEX.is_match("shop/orders"));
        assert!(!APP_LABEL_REGEX.is_match(""));

        assert!(MODEL_REGEX.is_match("purchaseorder"));
        assert!(MODEL_REGEX.is_match("order_line"));
        assert!(!MODEL_REGEX.is_match("order.line"));
        assert!(!MODEL_REGEX.is_match("order-line"));
    }
}
