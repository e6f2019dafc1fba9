use rand::{CryptoRng, Rng};

pub const OTP_MIN: u32 = 100_000;
pub const OTP_MAX: u32 = 999_999;

/// Default validity window in seconds
pub const DEFAULT_OTP_VALIDITY_SECONDS: i64 = 30;

/// Upper bound for a configured validity window (one day)
pub const MAX_OTP_VALIDITY_SECONDS: i64 = 86_400;

/// Generate a 6-digit OTP code from the thread-local CSPRNG
pub fn generate_otp_code() -> String {
    generate_otp_code_with(&mut rand::rng())
}

pub fn generate_otp_code_with<R: Rng + CryptoRng>(rng: &mut R) -> String {
    let code: u32 = rng.random_range(OTP_MIN..=OTP_MAX);
    code.to_string()
}
