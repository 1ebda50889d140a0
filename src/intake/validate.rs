//! Pure field validators for intake answers.

use crate::error::ValidationError;

/// Inclusive age bounds for candidates.
pub const MIN_AGE: u8 = 16;
pub const MAX_AGE: u8 = 65;

/// Minimum length (in characters) for a text field after trimming.
pub const MIN_TEXT_LEN: usize = 2;

/// The kind of field an answer is validated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Name,
    City,
    Workplace,
    Citizenship,
    Age,
}

impl FieldKind {
    /// Human-readable label, used in error messages.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::City => "city",
            Self::Workplace => "workplace",
            Self::Citizenship => "citizenship",
            Self::Age => "age",
        }
    }
}

/// A validated, normalized field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Age(u8),
}

/// Validate a raw answer against the expected field kind.
pub fn validate(field: FieldKind, raw: &str) -> Result<FieldValue, ValidationError> {
    match field {
        FieldKind::Age => validate_age(raw).map(FieldValue::Age),
        _ => validate_text(field, raw).map(FieldValue::Text),
    }
}

/// Trim a text answer and require at least [`MIN_TEXT_LEN`] characters.
pub fn validate_text(field: FieldKind, raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.chars().count() < MIN_TEXT_LEN {
        return Err(ValidationError::TooShort {
            field: field.label(),
        });
    }
    Ok(trimmed.to_string())
}

/// Parse an age and require it between [`MIN_AGE`] and [`MAX_AGE`] inclusive.
pub fn validate_age(raw: &str) -> Result<u8, ValidationError> {
    let age: i64 = raw.trim().parse().map_err(|_| ValidationError::NotANumber)?;
    if age < MIN_AGE as i64 || age > MAX_AGE as i64 {
        return Err(ValidationError::OutOfRange {
            min: MIN_AGE,
            max: MAX_AGE,
        });
    }
    Ok(age as u8)
}
