//! Terraform token resolution from multiple sources

use log::debug;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;

use crate::config::credentials;
use crate::error::{Result, TfeError};

/// Credentials file structure
#[derive(Deserialize, Debug)]
struct TfeCredentials {
    credentials: HashMap<String, TfeCredential>,
}

/// Single credential entry
#[derive(Deserialize, Debug)]
struct TfeCredential {
    token: String,
}

/// Token resolution with fallback logic
pub struct TokenResolver {
    host: String,
}

impl TokenResolver {
    /// Create a new token resolver for the given host
    pub fn new(host: &str) -> Self {
        Self {
            host: host.to_string(),
        }
    }

    /// Resolve token from multiple sources with fallback:
    /// 1. CLI argument (if provided)
    /// 2. Environment variables (TFE_TOKEN, TFC_TOKEN - in order)
    /// 3. Credentials file (~/.terraform.d/credentials.tfrc.json)
    pub fn resolve(&self, cli_token: Option<&str>) -> Result<String> {
        if let Some(token) = cli_token {
            debug!("Using token from CLI argument");
            return Ok(token.to_string());
        }

        for env_var in credentials::TOKEN_ENV_VARS {
            if let Ok(token) = std::env::var(env_var) {
                debug!("Using token from {} environment variable", env_var);
                return Ok(token);
            }
        }

        debug!(
            "No token found in environment variables {:?}, trying credentials file",
            credentials::TOKEN_ENV_VARS
        );
        self.read_from_credentials_file()
    }

    /// Read token from Terraform credentials file
    fn read_from_credentials_file(&self) -> Result<String> {
        let credentials_path = Self::get_credentials_path()
            .ok_or_else(|| TfeError::TokenNotFound(self.token_not_found_message(None)))?;

        debug!(
            "Looking for credentials file at: {}",
            credentials_path.display()
        );

        let content = match fs::read_to_string(&credentials_path) {
            Ok(content) => content,
            Err(_) => {
                return Err(TfeError::TokenNotFound(
                    self.token_not_found_message(Some(&credentials_path)),
                ));
            }
        };

        let creds: TfeCredentials = serde_json::from_str(&content).map_err(|e| {
            TfeError::Credentials(format!(
                "Could not parse credentials file {}: {}",
                credentials_path.display(),
                e
            ))
        })?;

        creds
            .credentials
            .get(&self.host)
            .map(|cred| {
                debug!(
                    "Using token from credentials file {} for host: {}",
                    credentials_path.display(),
                    self.host
                );
                cred.token.clone()
            })
            .ok_or_else(|| {
                TfeError::TokenNotFound(self.token_not_found_message(Some(&credentials_path)))
            })
    }

    /// Generate helpful error message when token is not found
    fn token_not_found_message(&self, credentials_path: Option<&std::path::Path>) -> String {
        let env_vars = credentials::TOKEN_ENV_VARS.join(", ");
        let creds_info = credentials_path
            .map(|p| format!(" or in credentials file {}", p.display()))
            .unwrap_or_default();

        format!(
            "No API token found for host '{}'. Please provide a token using one of:\n\
             \n\
             1. CLI argument:      tfmgr --token <TOKEN>\n\
             2. Environment var:   export TFE_TOKEN=<TOKEN>  (also: TFC_TOKEN)\n\
             3. Terraform login:   terraform login {}\n\
             \n\
             Checked: env vars [{}]{}",
            self.host, self.host, env_vars, creds_info
        )
    }

    /// Get the path to Terraform credentials file (platform-specific)
    /// - Windows: %APPDATA%\terraform.d\credentials.tfrc.json
    /// - Linux/macOS: ~/.terraform.d/credentials.tfrc.json
    fn get_credentials_path() -> Option<std::path::PathBuf> {
        #[cfg(windows)]
        {
            dirs::config_dir().map(|p| p.join(credentials::FILE_NAME))
        }

        #[cfg(not(windows))]
        {
            dirs::home_dir().map(|p| p.join(credentials::FILE_PATH_UNIX))
        }
    }
}
