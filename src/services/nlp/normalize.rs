use crate::errors::InterpretError;

/// Cleans raw user input before interpretation: trims, collapses internal
/// whitespace runs, and enforces the configured length bounds. Input with no
/// alphanumeric character at all is rejected outright.
pub fn normalize(text: &str, min_len: usize, max_len: usize) -> Result<String, InterpretError> {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.is_empty() {
        return Err(InterpretError::InvalidInput(
            "input cannot be empty or whitespace only".to_string(),
        ));
    }

    let char_count = collapsed.chars().count();
    if char_count < min_len {
        return Err(InterpretError::InvalidInput(format!(
            "input must be at least {min_len} characters"
        )));
    }
    if char_count > max_len {
        return Err(InterpretError::InvalidInput(format!(
            "input exceeds max length of {max_len} characters"
        )));
    }

    if !collapsed.chars().any(|c| c.is_alphanumeric()) {
        return Err(InterpretError::InvalidInput(
            "input must contain at least one alphanumeric character".to_string(),
        ));
    }

    Ok(collapsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_whitespace() {
        let out = normalize("  book   a\tplumber \n tomorrow ", 3, 512).unwrap();
        assert_eq!(out, "book a plumber tomorrow");
    }

    #[test]
    fn test_rejects_empty() {
        assert!(normalize("   ", 3, 512).is_err());
        assert!(normalize("", 3, 512).is_err());
    }

    #[test]
    fn test_rejects_too_short() {
        assert!(normalize("hi", 3, 512).is_err());
    }

    #[test]
    fn test_rejects_too_long() {
        let long = "a".repeat(513);
        assert!(normalize(&long, 3, 512).is_err());
    }

    #[test]
    fn test_rejects_no_alphanumeric() {
        assert!(normalize("?!... ---", 3, 512).is_err());
    }

    #[test]
    fn test_accepts_minimal_valid() {
        assert_eq!(normalize("abc", 3, 512).unwrap(), "abc");
    }
}
