//! Password strength policy and entropy estimate.
//!
//! `check_strength` is the hard gate applied at registration. The entropy
//! estimate is advisory and drives the strength meter shown while a user types.

use super::password::MAX_PASSWORD_BYTES;

/// Minimum password length in characters.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// A single strength rule a password can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PasswordRule {
    TooShort,
    TooLong,
    MissingLowercase,
    MissingUppercase,
    MissingDigit,
    MissingSymbol,
}

impl std::fmt::Display for PasswordRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooShort => write!(f, "must be at least {MIN_PASSWORD_LENGTH} characters"),
            Self::TooLong => write!(f, "must be at most {MAX_PASSWORD_BYTES} bytes"),
            Self::MissingLowercase => write!(f, "must contain a lowercase letter"),
            Self::MissingUppercase => write!(f, "must contain an uppercase letter"),
            Self::MissingDigit => write!(f, "must contain a digit"),
            Self::MissingSymbol => write!(f, "must contain a symbol"),
        }
    }
}

/// Character classes present in a password.
#[derive(Debug, Clone, Copy, Default)]
struct CharClasses {
    lowercase: bool,
    uppercase: bool,
    digit: bool,
    symbol: bool,
}

impl CharClasses {
    fn of(password: &str) -> Self {
        password.chars().fold(Self::default(), |mut classes, c| {
            if c.is_ascii_lowercase() {
                classes.lowercase = true;
            } else if c.is_ascii_uppercase() {
                classes.uppercase = true;
            } else if c.is_ascii_digit() {
                classes.digit = true;
            } else {
                classes.symbol = true;
            }
            classes
        })
    }
}

/// Check a password against the registration policy.
///
/// # Errors
/// Returns every rule the password fails, in a stable order.
pub fn check_strength(password: &str) -> Result<(), Vec<PasswordRule>> {
    let classes = CharClasses::of(password);
    let mut failed = Vec::new();

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        failed.push(PasswordRule::TooShort);
    }
    if password.len() > MAX_PASSWORD_BYTES {
        failed.push(PasswordRule::TooLong);
    }
    if !classes.lowercase {
        failed.push(PasswordRule::MissingLowercase);
    }
    if !classes.uppercase {
        failed.push(PasswordRule::MissingUppercase);
    }
    if !classes.digit {
        failed.push(PasswordRule::MissingDigit);
    }
    if !classes.symbol {
        failed.push(PasswordRule::MissingSymbol);
    }

    if failed.is_empty() { Ok(()) } else { Err(failed) }
}

/// Coarse strength bucket for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StrengthLabel {
    Weak,
    Medium,
    Strong,
    VeryStrong,
}

impl std::fmt::Display for StrengthLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Weak => write!(f, "weak"),
            Self::Medium => write!(f, "medium"),
            Self::Strong => write!(f, "strong"),
            Self::VeryStrong => write!(f, "very strong"),
        }
    }
}

impl StrengthLabel {
    /// Label a password by its estimated entropy.
    #[must_use]
    pub fn of(password: &str) -> Self {
        Self::from_entropy(estimate_entropy(password))
    }

    /// Bucket an entropy estimate (in bits).
    #[must_use]
    pub fn from_entropy(bits: f64) -> Self {
        if bits < 28.0 {
            Self::Weak
        } else if bits < 36.0 {
            Self::Medium
        } else if bits < 60.0 {
            Self::Strong
        } else {
            Self::VeryStrong
        }
    }
}

/// Estimate password entropy as `length * log2(charset size)`.
///
/// The charset grows by 26 for lowercase, 26 for uppercase, 10 for digits and
/// 32 for anything else present in the password.
#[must_use]
#[allow(clippy::cast_precision_loss)] // Password lengths are far below 2^52
pub fn estimate_entropy(password: &str) -> f64 {
    let classes = CharClasses::of(password);
    let charset: u32 = [
        (classes.lowercase, 26),
        (classes.uppercase, 26),
        (classes.digit, 10),
        (classes.symbol, 32),
    ]
    .iter()
    .filter(|(present, _)| *present)
    .map(|(_, size)| size)
    .sum();

    password.chars().count() as f64 * f64::from(charset.max(1)).log2()
}
