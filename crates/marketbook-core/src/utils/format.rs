/// Keep only the ASCII digits of a string
pub fn digits_only(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Format a phone number with the Brazilian mask as the user types.
///
/// The punctuation grows with the number of digits:
/// `(11`, `(11) 9876`, `(11) 3333-4444`, `(11) 98765-4321`.
/// Digits beyond the eleventh are dropped.
pub fn format_phone(value: &str) -> String {
    let digits = digits_only(value);

    match digits.len() {
        0 => String::new(),
        1..=2 => format!("({}", digits),
        3..=6 => format!("({}) {}", &digits[..2], &digits[2..]),
        7..=10 => format!("({}) {}-{}", &digits[..2], &digits[2..6], &digits[6..]),
        _ => format!("({}) {}-{}", &digits[..2], &digits[2..7], &digits[7..11]),
    }
}

/// Case-insensitive substring check. An empty needle always matches.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Truncate a string to a maximum number of characters, adding ellipsis if needed
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_phone_thresholds() {
        assert_eq!(format_phone(""), "");
        assert_eq!(format_phone("11"), "(11");
        assert_eq!(format_phone("119876"), "(11) 9876");
        assert_eq!(format_phone("1133334444"), "(11) 3333-4444");
        assert_eq!(format_phone("11987654321"), "(11) 98765-4321");
    }

    #[test]
    fn test_format_phone_intermediate_lengths() {
        assert_eq!(format_phone("1"), "(1");
        assert_eq!(format_phone("113"), "(11) 3");
        assert_eq!(format_phone("1198765"), "(11) 9876-5");
        assert_eq!(format_phone("119876543210"), "(11) 98765-4321"); // extra digit dropped
    }

    #[test]
    fn test_format_phone_reformats_masked_input() {
        assert_eq!(format_phone("(11) 98765-4321"), "(11) 98765-4321");
        assert_eq!(format_phone("(11) 3333-44445"), "(11) 33334-4445");
        assert_eq!(format_phone("abc"), "");
    }

    #[test]
    fn test_contains_ignore_case() {
        assert!(contains_ignore_case("Bicicleta Caloi", "caloi"));
        assert!(contains_ignore_case("Bicicleta Caloi", "BICI"));
        assert!(contains_ignore_case("anything", ""));
        assert!(!contains_ignore_case("Bicicleta", "moto"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Hello", 10), "Hello");
        assert_eq!(truncate("Hello World", 8), "Hello...");
        assert_eq!(truncate("Hi", 2), "Hi");
        assert_eq!(truncate("Sofá retrátil", 7), "Sofá...");
    }
}
