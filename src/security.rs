use regex::Regex;
use reqwest::Url;

use crate::errors::{AppError, AppResult};

pub struct InputValidator;

impl InputValidator {
    /// Prepend `https://` when the user typed a bare host, and strip trailing
    /// slashes so `{base}/uploadimage` never contains `//`.
    pub fn normalize_base_url(url: &str) -> String {
        let trimmed = url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return String::new();
        }

        let has_scheme = Regex::new(r"(?i)^https?://").unwrap();
        if has_scheme.is_match(trimmed) {
            trimmed.to_string()
        } else {
            let normalized = format!("https://{}", trimmed);
            log::info!(
                "Setting base_url to {} (added 'https://')",
                normalized
            );
            normalized
        }
    }

    pub fn validate_base_url(url: &str) -> AppResult<()> {
        let trimmed = url.trim();

        if trimmed.is_empty() {
            return Err(AppError::validation("base_url", "Base URL cannot be empty"));
        }

        if trimmed.len() > 2048 {
            return Err(AppError::validation("base_url", "Base URL too long"));
        }

        let parsed = Url::parse(trimmed).map_err(|_| AppError::invalid_base_url(trimmed))?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(AppError::invalid_base_url(trimmed));
        }

        if parsed.query().is_some() || parsed.fragment().is_some() {
            return Err(AppError::validation(
                "base_url",
                "Base URL must not contain a query or fragment",
            ));
        }

        Ok(())
    }

    /// Only `image/*` shares are handled.
    pub fn validate_share_type(mime_type: &str) -> AppResult<()> {
        let lowered = mime_type.trim().to_ascii_lowercase();
        match lowered.split_once('/') {
            Some(("image", subtype)) if !subtype.is_empty() => Ok(()),
            _ => Err(AppError::unsupported_share_type(mime_type)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_adds_https() {
        assert_eq!(
            InputValidator::normalize_base_url("md.example.org"),
            "https://md.example.org"
        );
    }

    #[test]
    fn test_normalize_keeps_existing_scheme() {
        assert_eq!(
            InputValidator::normalize_base_url("http://localhost:3000/"),
            "http://localhost:3000"
        );
        assert_eq!(
            InputValidator::normalize_base_url("HTTPS://Pad.Example.org"),
            "HTTPS://Pad.Example.org"
        );
    }

    #[test]
    fn test_normalize_empty_stays_empty() {
        assert_eq!(InputValidator::normalize_base_url("   "), "");
        assert_eq!(InputValidator::normalize_base_url("/"), "");
    }

    #[test]
    fn test_validate_base_url() {
        assert!(InputValidator::validate_base_url("https://md.example.org").is_ok());
        assert!(InputValidator::validate_base_url("http://10.0.0.2:3000/codimd").is_ok());

        assert!(InputValidator::validate_base_url("").is_err());
        assert!(InputValidator::validate_base_url("ftp://md.example.org").is_err());
        assert!(InputValidator::validate_base_url("md.example.org").is_err());
        assert!(InputValidator::validate_base_url("https://md.example.org/?x=1").is_err());
    }

    #[test]
    fn test_validate_share_type() {
        assert!(InputValidator::validate_share_type("image/png").is_ok());
        assert!(InputValidator::validate_share_type("IMAGE/JPEG").is_ok());

        assert!(matches!(
            InputValidator::validate_share_type("text/plain"),
            Err(AppError::UnsupportedShareType { .. })
        ));
        assert!(InputValidator::validate_share_type("image/").is_err());
        assert!(InputValidator::validate_share_type("image").is_err());
    }
}
