use thiserror::Error;

/// Inline, field-level validation failures. The `Display` text is what the
/// form shows next to the offending field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("Please enter a valid email address.")]
    InvalidEmail,
    #[error("Quantity must be a whole number of at least 1.")]
    InvalidQuantity,
    #[error("Item ID not found.")]
    MissingItemId,
    #[error("Invalid item ID: {0}")]
    MalformedItemId(String),
}
