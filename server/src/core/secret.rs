//! Secret values loaded from the process environment

use anyhow::{Result, bail};

/// A secret string that never shows up in `Debug` output
#[derive(Clone, PartialEq, Eq)]
pub struct Secret {
    value: String,
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secret")
            .field("value", &"[REDACTED]")
            .finish()
    }
}

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// Read a required secret from the environment variable `name`
    pub fn from_env(name: &str) -> Result<Self> {
        Self::from_value(name, std::env::var(name).ok())
    }

    fn from_value(name: &str, value: Option<String>) -> Result<Self> {
        match value {
            Some(v) if !v.trim().is_empty() => {
                tracing::debug!(var = name, "Loaded secret from environment");
                Ok(Self::new(v))
            }
            Some(_) => bail!("Environment variable {} is set but empty", name),
            None => bail!("Environment variable {} is not set", name),
        }
    }

    pub fn expose(&self) -> &str {
        &self.value
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.value.as_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_is_redacted() {
        let secret = Secret::new("hunter2");
        let debug = format!("{:?}", secret);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[REDACTED]"));
        assert_eq!(secret.expose(), "hunter2");
    }

    #[test]
    fn test_missing_and_empty_rejected() {
        assert!(Secret::from_value("JWT_SECRET", None).is_err());
        assert!(Secret::from_value("JWT_SECRET", Some("  ".to_string())).is_err());
        let secret = Secret::from_value("JWT_SECRET", Some("s3cret".to_string())).unwrap();
        assert_eq!(secret.as_bytes(), b"s3cret");
    }

    #[test]
    fn test_error_names_variable_not_value() {
        let err = Secret::from_value("JWT_SECRET", None).unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }
}
