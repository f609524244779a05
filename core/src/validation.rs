//! Name validation shared by both stores.
//!
//! Every add and rename path goes through [`NameRules::check`] and
//! [`name_taken`], so lists and items enforce the same rules.

use crate::error::ValidationError;

/// Length limits applied to list and item names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameRules {
    /// Minimum length in characters, after trimming
    pub min_len: usize,
    /// Maximum length in characters, after trimming
    pub max_len: usize,
}

impl NameRules {
    /// Create rules with explicit bounds
    #[must_use]
    pub const fn new(min_len: usize, max_len: usize) -> Self {
        Self { min_len, max_len }
    }

    /// Set the minimum length
    #[must_use]
    pub const fn with_min_len(mut self, min_len: usize) -> Self {
        self.min_len = min_len;
        self
    }

    /// Set the maximum length
    #[must_use]
    pub const fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = max_len;
        self
    }

    /// Trims `raw` and checks its length.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyName`], [`ValidationError::NameTooShort`]
    /// or [`ValidationError::NameTooLong`].
    pub fn check(&self, raw: &str) -> Result<String, ValidationError> {
        let name = raw.trim();
        let len = name.chars().count();
        if len == 0 {
            return Err(ValidationError::EmptyName);
        }
        if len < self.min_len {
            return Err(ValidationError::NameTooShort { min: self.min_len });
        }
        if len > self.max_len {
            return Err(ValidationError::NameTooLong { max: self.max_len });
        }
        Ok(name.to_string())
    }
}

impl Default for NameRules {
    fn default() -> Self {
        Self::new(2, 100)
    }
}

/// Case-insensitive name equality
#[must_use]
pub fn names_match(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Returns `true` if `candidate` collides with any of `existing`.
///
/// Callers exclude the entry being renamed from `existing`, so renaming
/// "Milk" to "milk" is allowed.
pub fn name_taken<'a, I>(existing: I, candidate: &str) -> bool
where
    I: IntoIterator<Item = &'a str>,
{
    existing.into_iter().any(|name| names_match(name, candidate))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_trims() {
        let rules = NameRules::default();
        assert_eq!(rules.check("  Groceries "), Ok("Groceries".to_string()));
    }

    #[test]
    fn test_check_rejects_empty_and_short() {
        let rules = NameRules::default();
        assert_eq!(rules.check("   "), Err(ValidationError::EmptyName));
        assert_eq!(rules.check("a"), Err(ValidationError::NameTooShort { min: 2 }));
        assert_eq!(
            NameRules::default().with_min_len(1).check("a"),
            Ok("a".to_string())
        );
    }

    #[test]
    fn test_check_rejects_long() {
        let rules = NameRules::default().with_max_len(5);
        assert_eq!(rules.check("abcdef"), Err(ValidationError::NameTooLong { max: 5 }));
    }

    #[test]
    fn test_length_counts_characters() {
        let rules = NameRules::new(2, 3);
        assert!(rules.check("épi").is_ok());
    }

    #[test]
    fn test_name_taken_is_case_insensitive() {
        let existing = ["groceries", "Chores"];
        assert!(name_taken(existing, "Groceries"));
        assert!(name_taken(existing, "CHORES "));
        assert!(!name_taken(existing, "garden"));
        assert!(!name_taken(std::iter::empty(), "garden"));
    }
}
