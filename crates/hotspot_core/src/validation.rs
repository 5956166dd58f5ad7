//! Access point input validation.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const SSID_MAX_CHARS: usize = 32;
pub const PASSPHRASE_MIN_CHARS: usize = 8;
pub const PASSPHRASE_MAX_CHARS: usize = 63;

/// Rejected SSID or passphrase. Messages are shown to the user as is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("El SSID debe tener entre 1 y 32 caracteres")]
    SsidLength,

    #[error("La contrasena debe tener al menos 8 caracteres")]
    PassphraseTooShort,

    #[error("La contrasena no puede exceder 63 caracteres")]
    PassphraseTooLong,

    #[error("La contrasena solo puede contener letras y numeros")]
    PassphraseCharset,

    #[error("El SSID no puede contener los caracteres \" & | ^ % < >")]
    SsidCharset,
}

/// Characters the platform shell would interpret inside a quoted argument.
pub const SHELL_METACHARACTERS: &[char] = &['"', '&', '|', '^', '%', '<', '>'];

/// How strictly input is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputPolicy {
    /// SSID 1 to 32 characters, passphrase 8 to 63 characters
    LengthOnly,
    /// Lengths as above, no shell metacharacters in the SSID and an
    /// ASCII letters-and-digits passphrase
    Strict,
}

fn alphanumeric() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-zA-Z0-9]+$").expect("static pattern compiles"))
}

/// Validated access point settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPointConfig {
    ssid: String,
    passphrase: String,
}

impl AccessPointConfig {
    /// Validate and build a configuration.
    pub fn new(ssid: &str, passphrase: &str, policy: InputPolicy) -> Result<Self, ValidationError> {
        validate_ssid(ssid)?;
        if policy == InputPolicy::Strict {
            validate_shell_safe_ssid(ssid)?;
        }
        validate_passphrase(passphrase, policy)?;
        Ok(Self {
            ssid: ssid.to_string(),
            passphrase: passphrase.to_string(),
        })
    }

    pub fn ssid(&self) -> &str {
        &self.ssid
    }

    pub fn passphrase(&self) -> &str {
        &self.passphrase
    }
}

/// SSID must be 1 to 32 characters.
pub fn validate_ssid(ssid: &str) -> Result<(), ValidationError> {
    let len = ssid.chars().count();
    if len == 0 || len > SSID_MAX_CHARS {
        return Err(ValidationError::SsidLength);
    }
    Ok(())
}

/// SSID must not contain any of [`SHELL_METACHARACTERS`].
pub fn validate_shell_safe_ssid(ssid: &str) -> Result<(), ValidationError> {
    if ssid.contains(SHELL_METACHARACTERS) {
        return Err(ValidationError::SsidCharset);
    }
    Ok(())
}

pub fn validate_passphrase(passphrase: &str, policy: InputPolicy) -> Result<(), ValidationError> {
    let len = passphrase.chars().count();
    if len < PASSPHRASE_MIN_CHARS {
        return Err(ValidationError::PassphraseTooShort);
    }
    if len > PASSPHRASE_MAX_CHARS {
        return Err(ValidationError::PassphraseTooLong);
    }
    if policy == InputPolicy::Strict && !alphanumeric().is_match(passphrase) {
        return Err(ValidationError::PassphraseCharset);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ssid_bounds() {
        assert_eq!(validate_ssid(""), Err(ValidationError::SsidLength));
        assert!(validate_ssid("a").is_ok());
        assert!(validate_ssid(&"s".repeat(32)).is_ok());
        assert_eq!(validate_ssid(&"s".repeat(33)), Err(ValidationError::SsidLength));
    }

    #[test]
    fn test_ssid_counts_characters_not_bytes() {
        assert!(validate_ssid(&"ñ".repeat(32)).is_ok());
    }

    #[test]
    fn test_passphrase_bounds() {
        for len in 0..8 {
            assert_eq!(
                validate_passphrase(&"a".repeat(len), InputPolicy::LengthOnly),
                Err(ValidationError::PassphraseTooShort)
            );
        }
        assert!(validate_passphrase(&"a".repeat(8), InputPolicy::LengthOnly).is_ok());
        assert!(validate_passphrase(&"a".repeat(63), InputPolicy::LengthOnly).is_ok());
        assert_eq!(
            validate_passphrase(&"a".repeat(64), InputPolicy::LengthOnly),
            Err(ValidationError::PassphraseTooLong)
        );
    }

    #[test]
    fn test_strict_policy_rejects_shell_metacharacters_in_ssid() {
        for ssid in ["a\" & whoami & \"", "Cafe \"Free\"", "50%", "a|b", "x^y", "<lan>"] {
            assert_eq!(
                AccessPointConfig::new(ssid, "longenoughpass", InputPolicy::Strict),
                Err(ValidationError::SsidCharset),
                "{}",
                ssid
            );
        }
        assert!(AccessPointConfig::new("Cafe \"Free\"", "longenoughpass", InputPolicy::LengthOnly).is_ok());
        assert!(AccessPointConfig::new("Cafe-Free 2.4", "longenoughpass", InputPolicy::Strict).is_ok());
    }

    #[test]
    fn test_strict_policy_passphrase_charset() {
        assert!(validate_passphrase("pass word!", InputPolicy::LengthOnly).is_ok());
        assert_eq!(
            validate_passphrase("pass word!", InputPolicy::Strict),
            Err(ValidationError::PassphraseCharset)
        );
        assert!(validate_passphrase("Office5G2024", InputPolicy::Strict).is_ok());
    }

    #[test]
    fn test_config_keeps_values() {
        let config = AccessPointConfig::new("Office5G", "longenoughpass", InputPolicy::Strict).unwrap();
        assert_eq!(config.ssid(), "Office5G");
        assert_eq!(config.passphrase(), "longenoughpass");
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ValidationError::PassphraseTooShort.to_string(),
            "La contrasena debe tener al menos 8 caracteres"
        );
    }
}
