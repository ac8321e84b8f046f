// src/phone.rs
use phonenumber::Mode;

/// Validates a raw phone candidate and renders it in international format.
pub trait PhoneNormalizer: Send + Sync {
    fn normalize(&self, candidate: &str) -> Option<String>;
}

/// `phonenumber`-backed normalizer; candidates without a `+` country code
/// cannot be placed in a numbering plan and are rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct LibPhoneNormalizer;

impl PhoneNormalizer for LibPhoneNormalizer {
    fn normalize(&self, candidate: &str) -> Option<String> {
        let number = phonenumber::parse(None, candidate).ok()?;
        if !phonenumber::is_valid(&number) {
            return None;
        }
        Some(number.format().mode(Mode::International).to_string())
    }
}
