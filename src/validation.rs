use crate::config::{Config, GoogleConfig};
use crate::error::{AppError, Result};
use crate::secrets::Credential;
use url::Url;

/// Check everything a run needs before any network call.
///
/// Every missing field is collected so the user can fix the config in one pass.
pub fn validate(config: &Config, credential: Option<&Credential>) -> Result<()> {
    let mut missing = Vec::new();

    if credential.is_none() {
        missing.push("api_key".to_string());
    }
    if config.api.base_url.trim().is_empty() {
        missing.push("api.base_url".to_string());
    }
    if config.api.endpoints.configured().is_empty() {
        missing.push("api.endpoints".to_string());
    }

    if !missing.is_empty() {
        return Err(AppError::MissingConfig { fields: missing });
    }

    let base_url = Url::parse(config.api.base_url.trim())
        .map_err(|e| AppError::Config(format!("Invalid api.base_url: {}", e)))?;
    if !matches!(base_url.scheme(), "http" | "https") {
        return Err(AppError::Config(format!(
            "api.base_url must use http or https, got '{}'",
            base_url.scheme()
        )));
    }

    Ok(())
}

/// Check the Google OAuth client before anything talks to Sheets.
pub fn validate_google(google: &GoogleConfig) -> Result<()> {
    let mut missing = Vec::new();

    if google.client_id.trim().is_empty() {
        missing.push("google.client_id".to_string());
    }
    if google.client_secret.trim().is_empty() {
        missing.push("google.client_secret".to_string());
    }

    match missing.is_empty() {
        true => Ok(()),
        false => Err(AppError::MissingConfig { fields: missing }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ApiConfig, Endpoints};

    fn config_with(base_url: &str, endpoints: Endpoints) -> Config {
        Config {
            api: ApiConfig {
                base_url: base_url.to_string(),
                endpoints,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_config_passes() {
        let config = config_with("https://api.example.com/v1", Endpoints::standard());
        let credential = Credential::new("key");
        assert!(validate(&config, Some(&credential)).is_ok());
    }

    #[test]
    fn test_all_missing_fields_reported_together() {
        let config = config_with("", Endpoints::default());

        let err = validate(&config, None).unwrap_err();
        match err {
            AppError::MissingConfig { fields } => {
                assert_eq!(fields, vec!["api_key", "api.base_url", "api.endpoints"]);
            }
            other => panic!("expected MissingConfig, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_credential_only() {
        let config = config_with("https://api.example.com/v1", Endpoints::standard());

        let err = validate(&config, None).unwrap_err();
        assert!(matches!(
            err,
            AppError::MissingConfig { ref fields } if fields == &vec!["api_key".to_string()]
        ));
    }

    #[test]
    fn test_non_http_base_url_rejected() {
        let config = config_with("ftp://api.example.com", Endpoints::standard());
        let credential = Credential::new("key");

        let err = validate(&config, Some(&credential)).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_google_client_required() {
        let err = validate_google(&GoogleConfig::default()).unwrap_err();
        assert!(matches!(
            err,
            AppError::MissingConfig { ref fields }
                if fields == &vec!["google.client_id".to_string(), "google.client_secret".to_string()]
        ));

        let google = GoogleConfig {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
        };
        assert!(validate_google(&google).is_ok());
    }
}
