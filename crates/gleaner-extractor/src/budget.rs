//! Token budget estimation

use crate::config::BudgetConfig;

/// Estimates the token cost of text from its character count
///
/// The estimate is `ceil(chars / chars_per_token)`. With the default of three
/// characters per token it over-counts typical English prose (closer to four
/// characters per token), so a prompt that passes [`fits`](Self::fits) should
/// not overflow the backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenBudgetEstimator {
    chars_per_token: f64,
}

impl TokenBudgetEstimator {
    /// Characters per token used when none (or a non-positive value) is given
    pub const DEFAULT_CHARS_PER_TOKEN: f64 = 3.0;

    /// Create an estimator
    pub fn new(chars_per_token: f64) -> Self {
        let chars_per_token = if chars_per_token.is_finite() && chars_per_token > 0.0 {
            chars_per_token
        } else {
            Self::DEFAULT_CHARS_PER_TOKEN
        };
        Self { chars_per_token }
    }

    /// Create an estimator from the budget section of the configuration
    pub fn from_config(config: &BudgetConfig) -> Self {
        Self::new(config.chars_per_token)
    }

    /// Estimated tokens for `text`
    pub fn estimate(&self, text: &str) -> usize {
        self.estimate_chars(text.chars().count())
    }

    /// Estimated tokens for a text of `char_count` characters
    pub fn estimate_chars(&self, char_count: usize) -> usize {
        (char_count as f64 / self.chars_per_token).ceil() as usize
    }

    /// True if `text` fits in `max_tokens` after reserving `safety_margin`
    pub fn fits(&self, text: &str, max_tokens: usize, safety_margin: usize) -> bool {
        self.estimate(text) <= max_tokens.saturating_sub(safety_margin)
    }
}

impl Default for TokenBudgetEstimator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CHARS_PER_TOKEN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_rounds_up() {
        let estimator = TokenBudgetEstimator::default();
        assert_eq!(estimator.estimate(""), 0);
        assert_eq!(estimator.estimate("a"), 1);
        assert_eq!(estimator.estimate("abc"), 1);
        assert_eq!(estimator.estimate("abcd"), 2);
    }

    #[test]
    fn test_estimate_counts_characters_not_bytes() {
        let estimator = TokenBudgetEstimator::new(1.0);
        assert_eq!(estimator.estimate("héé"), 3);
    }

    #[test]
    fn test_estimate_is_monotonic() {
        let estimator = TokenBudgetEstimator::default();
        let mut previous = 0;
        for n in 0..200 {
            let estimate = estimator.estimate_chars(n);
            assert!(estimate >= previous);
            previous = estimate;
        }
    }

    #[test]
    fn test_fits_subtracts_safety_margin() {
        let estimator = TokenBudgetEstimator::new(1.0);
        let text = "x".repeat(100);
        assert!(estimator.fits(&text, 100, 0));
        assert!(!estimator.fits(&text, 100, 1));
        assert!(estimator.fits(&text, 150, 50));
        assert!(!estimator.fits(&text, 10, 20));
    }

    #[test]
    fn test_invalid_ratio_falls_back() {
        assert_eq!(TokenBudgetEstimator::new(0.0), TokenBudgetEstimator::default());
        assert_eq!(TokenBudgetEstimator::new(f64::NAN), TokenBudgetEstimator::default());
    }
}
