/// Access key pair used to sign a single request.
///
/// The `Debug` implementation redacts `secret_key` to prevent
/// accidental leakage in logs.
#[derive(Clone)]
pub struct Credentials {
    pub key_id: String,
    pub secret_key: String,
}

impl Credentials {
    pub fn new(key_id: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            key_id: key_id.into(),
            secret_key: secret_key.into(),
        }
    }

    pub(crate) fn is_complete(&self) -> bool {
        !self.key_id.is_empty() && !self.secret_key.is_empty()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("key_id", &self.key_id)
            .field("secret_key", &"****")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_debug_redacts_secret() {
        let cred = Credentials::new("AKIDEXAMPLE", "super-secret-value");
        let debug = format!("{:?}", cred);
        assert!(debug.contains("AKIDEXAMPLE"));
        assert!(debug.contains("****"));
        assert!(!debug.contains("super-secret-value"));
    }

    #[test]
    fn incomplete_credentials() {
        assert!(Credentials::new("id", "secret").is_complete());
        assert!(!Credentials::new("", "secret").is_complete());
        assert!(!Credentials::new("id", "").is_complete());
    }
}
