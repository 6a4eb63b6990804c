use rand::Rng;

/// Generates a 6-digit numeric verification code.
///
/// The code is drawn uniformly from the full 100000-999999 range so it
/// always renders as exactly six digits.
pub fn generate_verification_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}
