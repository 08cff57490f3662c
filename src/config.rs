/// Configuration constants for the Terraform API
pub mod api {
    /// Base path for Terraform API v2
    pub const BASE_PATH: &str = "/api/v2";

    /// Organizations endpoint
    pub const ORGANIZATIONS: &str = "organizations";

    /// Workspaces endpoint
    pub const WORKSPACES: &str = "workspaces";

    /// Workspace variables endpoint segment
    pub const VARS: &str = "vars";

    /// Default page size for API requests
    pub const DEFAULT_PAGE_SIZE: u32 = 100;

    /// Calls allowed per rolling one-second window. The documented server-side
    /// ceiling is 30/s; staying a couple below absorbs clock skew and latency.
    pub const RATE_LIMIT_CALLS: usize = 28;
}

/// Configuration constants for credentials
pub mod credentials {
    /// Credentials file name (relative to the platform config dir on Windows)
    pub const FILE_NAME: &str = "terraform.d/credentials.tfrc.json";

    /// Path to Terraform credentials file on Unix (relative to HOME)
    pub const FILE_PATH_UNIX: &str = ".terraform.d/credentials.tfrc.json";

    /// Environment variable names for token (checked in order)
    pub const TOKEN_ENV_VARS: &[&str] = &["TFE_TOKEN", "TFC_TOKEN"];
}

/// Default values for CLI
pub mod defaults {
    /// Default Terraform host (the cloud-hosted offering)
    pub const HOST: &str = "app.terraform.io";

    /// Default log level
    pub const LOG_LEVEL: &str = "warn";
}

/// Report rendering constants
pub mod report {
    /// Column limit applied when word-wrapping server error messages
    pub const MESSAGE_COLUMN_LIMIT: usize = 70;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_base_path_format() {
        assert!(api::BASE_PATH.starts_with('/'));
    }

    #[test]
    fn test_rate_limit_below_documented_ceiling() {
        assert!(api::RATE_LIMIT_CALLS < 30);
    }

    #[test]
    fn test_credentials_env_vars() {
        assert_eq!(credentials::TOKEN_ENV_VARS, &["TFE_TOKEN", "TFC_TOKEN"]);
    }

    #[test]
    fn test_default_host_is_valid() {
        assert!(defaults::HOST.contains('.'));
        assert!(!defaults::HOST.starts_with("https://"));
    }
}
