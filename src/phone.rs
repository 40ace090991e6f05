use crate::error::{validation, RecordError};

/// E.164 allows at most 15 digits after the `+`.
const MAX_DIGITS: usize = 15;
/// Country code plus a minimal subscriber number.
const MIN_DIGITS: usize = 7;

/// Normalize a caller-supplied phone number to E.164 form: a leading `+`
/// followed only by digits.
///
/// Accepts an optional leading `+` and tolerates the separators people type
/// (spaces, hyphens, dots, parentheses).  Everything else is rejected, as is
/// anything outside 7-15 digits or starting with `0` (no country code does).
pub fn normalize(raw: &str) -> Result<String, RecordError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(validation("phone number is empty"));
    }
    let rest = trimmed.strip_prefix('+').unwrap_or(trimmed);

    let mut digits = String::with_capacity(rest.len());
    for c in rest.chars() {
        match c {
            '0'..='9' => digits.push(c),
            ' ' | '-' | '.' | '(' | ')' => (),
            _ => {
                return Err(validation(format!(
                    "phone number {trimmed:?} contains invalid character {c:?}"
                )))
            }
        }
    }

    if digits.len() < MIN_DIGITS || digits.len() > MAX_DIGITS {
        return Err(validation(format!(
            "phone number {trimmed:?} must have {MIN_DIGITS}-{MAX_DIGITS} digits"
        )));
    }
    if digits.starts_with('0') {
        return Err(validation(format!(
            "phone number {trimmed:?} has no valid country code"
        )));
    }

    Ok(format!("+{digits}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_digits_gain_plus() {
        assert_eq!(normalize("12223334444").unwrap(), "+12223334444");
    }

    #[test]
    fn test_e164_input_is_unchanged() {
        assert_eq!(normalize("+12223334444").unwrap(), "+12223334444");
    }

    #[test]
    fn test_separators_are_stripped() {
        assert_eq!(normalize("+1 (222) 333-4444").unwrap(), "+12223334444");
        assert_eq!(normalize("44.20.7946.0958").unwrap(), "+442079460958");
    }

    #[test]
    fn test_spellings_normalize_identically() {
        assert_eq!(
            normalize("1-222-333-4444").unwrap(),
            normalize("+1 222 333 4444").unwrap()
        );
    }

    #[test]
    fn test_rejects_letters() {
        assert!(matches!(
            normalize("+1-800-FLOWERS"),
            Err(RecordError::Validation(_))
        ));
    }

    #[test]
    fn test_rejects_empty_and_bare_plus() {
        assert!(normalize("").is_err());
        assert!(normalize("   ").is_err());
        assert!(normalize("+").is_err());
    }

    #[test]
    fn test_rejects_out_of_range_lengths() {
        assert!(normalize("123456").is_err());
        assert!(normalize("1234567890123456").is_err());
        assert!(normalize("1234567").is_ok());
        assert!(normalize("123456789012345").is_ok());
    }

    #[test]
    fn test_rejects_leading_zero() {
        assert!(normalize("02079460958").is_err());
    }
}
