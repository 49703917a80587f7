use argon2::password_hash::{self, rand_core, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher as _, PasswordVerifier};

/// One-way password hashing with argon2 defaults
#[derive(Debug, Clone, Default)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl PasswordHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hash(&self, password: &str) -> Result<String, password_hash::Error> {
        let salt = SaltString::generate(&mut rand_core::OsRng);
        let hash = self.argon2.hash_password(password.as_bytes(), &salt)?;
        Ok(hash.to_string())
    }

    /// False for a wrong password or an unparseable stored hash
    pub fn verify(&self, password: &str, stored_hash: &str) -> bool {
        match PasswordHash::new(stored_hash) {
            Ok(parsed) => self.argon2.verify_password(password.as_bytes(), &parsed).is_ok(),
            Err(e) => {
                tracing::warn!("Stored password hash could not be parsed: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_password() {
        let hasher = PasswordHasher::new();
        let hash = hasher.hash("pass1234").unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(hasher.verify("pass1234", &hash));
        assert!(!hasher.verify("wrong-pass", &hash));
        assert!(!hasher.verify("pass1234", "plaintext"));
    }
}
