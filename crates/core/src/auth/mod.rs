//! Account security helpers: password hashing and referral codes.

pub mod password;
pub mod referral;

pub use password::{PasswordError, hash_password, verify_password};
pub use referral::generate_referral_code;
