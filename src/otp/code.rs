//! Code generation and the secret wrapper that keeps codes out of logs.

use rand::Rng;
use secrecy::{ExposeSecret, SecretString};
use std::fmt;

const CODE_MIN: u32 = 100_000;
const CODE_MAX: u32 = 999_999;

/// A generated code. `Debug` never prints the digits.
pub struct OneTimeCode(SecretString);

impl OneTimeCode {
    #[must_use]
    pub fn new(code: String) -> Self {
        Self(SecretString::from(code))
    }

    /// Exact string comparison against a candidate.
    #[must_use]
    pub fn matches(&self, candidate: &str) -> bool {
        self.0.expose_secret() == candidate
    }

    /// Raw digits, for the delivery stub only.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for OneTimeCode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("OneTimeCode([REDACTED])")
    }
}

/// Source of fresh codes for new sessions.
pub trait CodeSource: Send {
    fn generate(&mut self) -> OneTimeCode;
}

/// Uniform 6-digit codes from the thread-local PRNG.
///
/// Not a cryptographic source; the codes only simulate an emailed value.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomCode;

impl CodeSource for RandomCode {
    fn generate(&mut self) -> OneTimeCode {
        random_code(&mut rand::thread_rng())
    }
}

/// Always hands out the same code. Used for demos and scripted tests.
#[derive(Clone, Debug)]
pub struct FixedCode(String);

impl FixedCode {
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }
}

impl CodeSource for FixedCode {
    fn generate(&mut self) -> OneTimeCode {
        OneTimeCode::new(self.0.clone())
    }
}

/// Draw a code in `[100000, 999999]` from any RNG.
pub fn random_code<R: Rng>(rng: &mut R) -> OneTimeCode {
    OneTimeCode::new(rng.gen_range(CODE_MIN..=CODE_MAX).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn random_codes_are_six_digits_in_range() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..1_000 {
            let code = random_code(&mut rng);
            let digits = code.expose();
            assert_eq!(digits.len(), 6);
            assert!(digits.bytes().all(|b| b.is_ascii_digit()));
            let value: u32 = digits.parse().unwrap();
            assert!((CODE_MIN..=CODE_MAX).contains(&value));
        }
    }

    #[test]
    fn thread_rng_source_produces_valid_codes() {
        let mut source = RandomCode;
        let code = source.generate();
        assert_eq!(code.expose().len(), 6);
        assert!(!code.expose().starts_with('0'));
    }

    #[test]
    fn fixed_code_repeats_value() {
        let mut source = FixedCode::new("482913");
        assert!(source.generate().matches("482913"));
        assert!(source.generate().matches("482913"));
    }

    #[test]
    fn matches_is_exact() {
        let code = OneTimeCode::new("482913".to_string());
        assert!(code.matches("482913"));
        assert!(!code.matches("48291"));
        assert!(!code.matches("4829130"));
        assert!(!code.matches(" 482913"));
    }

    #[test]
    fn debug_redacts_digits() {
        let code = OneTimeCode::new("482913".to_string());
        let rendered = format!("{code:?}");
        assert!(!rendered.contains("482913"));
        assert!(rendered.contains("REDACTED"));
    }
}
