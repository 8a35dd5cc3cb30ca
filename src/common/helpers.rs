// Helper functions for safe logging

/// Masks email addresses for safe logging
/// Prevents sensitive data exposure while preserving debugging utility
///
/// # Example
/// ```
/// let masked = safe_email_log("user@example.com");
/// // Returns: "u***@example.com"
/// ```
pub fn safe_email_log(email: &str) -> String {
    if email.len() > 3 {
        let parts: Vec<&str> = email.split('@').collect();
        // First char, not first byte: local parts may be non-ASCII
        if let [local, domain] = parts[..] {
            if let Some(first) = local.chars().next() {
                return format!("{}***@{}", first, domain);
            }
        }
    }
    "***@***.***".to_string()
}

/// Masks capability tokens for safe logging
/// Shows only first and last 4 characters
pub fn safe_token_log(token: &str) -> String {
    if token.len() > 8 {
        format!("{}...{}", &token[..4], &token[token.len() - 4..])
    } else {
        "***".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_email_log_masks_local_part() {
        assert_eq!(safe_email_log("candidate@example.com"), "c***@example.com");
        assert_eq!(safe_email_log("x"), "***@***.***");
        assert_eq!(safe_email_log("not-an-email"), "***@***.***");
    }

    #[test]
    fn test_safe_email_log_multibyte_local_part() {
        assert_eq!(safe_email_log("émile@example.com"), "é***@example.com");
        assert_eq!(safe_email_log("山田@example.jp"), "山***@example.jp");
    }

    #[test]
    fn test_safe_token_log() {
        assert_eq!(safe_token_log("abcdefghijkl"), "abcd...ijkl");
        assert_eq!(safe_token_log("short"), "***");
    }
}
