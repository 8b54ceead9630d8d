//! Text normalization applied before classification.

/// Trim surrounding whitespace and lowercase.
///
/// Only the classifier sees the normalized copy; the original text is echoed
/// back unchanged in the result.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  You Are WONDERFUL \n"), "you are wonderful");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("\t\n "), "");
    }

    #[test]
    fn test_normalize_unicode() {
        assert_eq!(normalize(" ÉCOLE "), "école");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = normalize("  MiXeD Case  ");
        assert_eq!(normalize(&once), once);
    }
}
