//! Referral code generation for milkmen.
//!
//! Customers sign up against a milkman's referral code; the code is the only
//! customer-to-vendor binding mechanism.

use uuid::Uuid;

/// Generates a referral code from an email address.
///
/// Format: three uppercase letters taken from the email's local part (padded
/// with `X` when too short) followed by four random digits. Uniqueness is
/// enforced by the store; callers retry on collision.
#[must_use]
pub fn generate_referral_code(email: &str) -> String {
    let local = email.split('@').next().unwrap_or(email);
    let prefix: String = local
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(3)
        .collect::<String>()
        .to_uppercase();
    let prefix = format!("{prefix:X<3}");

    let bytes = Uuid::new_v4().into_bytes();
    let entropy = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    let digits = 1000 + entropy % 9000;

    format!("{prefix}{digits}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_shape() {
        let code = generate_referral_code("ramesh@example.com");
        assert_eq!(code.len(), 7);
        assert!(code.starts_with("RAM"));
        assert!(code[3..].chars().all(|c| c.is_ascii_digit()));
        let digits: u32 = code[3..].parse().unwrap();
        assert!((1000..10_000).contains(&digits));
    }

    #[test]
    fn test_short_local_part_is_padded() {
        let code = generate_referral_code("ab@example.com");
        assert!(code.starts_with("ABX"));
    }

    #[test]
    fn test_non_alphanumeric_characters_skipped() {
        let code = generate_referral_code("a.b-c@example.com");
        assert!(code.starts_with("ABC"));
    }
}
