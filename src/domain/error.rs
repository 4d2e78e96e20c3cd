use thiserror::Error;

/// Business rule violations on an [`Expense`](super::Expense).
///
/// Variants are listed in the order the rules are checked.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid description: cannot be empty")]
    InvalidDescription,

    #[error("invalid amount: must be greater than 0")]
    InvalidAmount,

    #[error("invalid category: cannot be empty")]
    InvalidCategory,

    #[error("invalid date: cannot be zero")]
    InvalidDate,
}

impl ValidationError {
    /// Name of the offending field, used in error details.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::InvalidDescription => "description",
            ValidationError::InvalidAmount => "amount",
            ValidationError::InvalidCategory => "category",
            ValidationError::InvalidDate => "date",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_names() {
        assert_eq!(ValidationError::InvalidDescription.field(), "description");
        assert_eq!(ValidationError::InvalidAmount.field(), "amount");
        assert_eq!(ValidationError::InvalidCategory.field(), "category");
        assert_eq!(ValidationError::InvalidDate.field(), "date");
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            ValidationError::InvalidAmount.to_string(),
            "invalid amount: must be greater than 0"
        );
        assert_eq!(
            ValidationError::InvalidDate.to_string(),
            "invalid date: cannot be zero"
        );
    }
}
