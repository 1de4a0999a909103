//! Application configuration.
//!
//! Read once at startup from a TOML file into an immutable [`AppConfig`] that
//! is passed down explicitly. Example:
//!
//! ```toml
//! default_region = "eu-west-1"
//!
//! [accounts]
//! dev = "111111111111"
//!
//! [[trusted_repositories]]
//! owner = "octo-org"
//! name = "infrastructure"
//! branches = ["main"]
//! ```
//!
//! Trusted repositories are deliberately not validated here: the trust
//! builder owns those rules and reports them with precise errors.

use std::path::{Path, PathBuf};

use assembly::registry::construct_id;
use assembly::stacks::{PipelineStackProps, StageTarget};
use assembly::{AssemblyError, Environment, FederationSettings};
use serde::Deserialize;
use trust::{AccountId, BucketName, Region, RepositoryTrust, RoleName, TrustPolicyInput};

/// Role name used when the configuration does not set one.
pub const DEFAULT_ROLE_NAME: &str = "github-actions-role";

/// Error type for config operations
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("config not found at: {0}")]
    NotFound(PathBuf),

    #[error("config validation error: {0}")]
    Invalid(String),
}

/// Result type for config operations
pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct AccountsRaw {
    dev: AccountId,
    #[serde(default)]
    staging: Option<AccountId>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct AppConfigRaw {
    accounts: AccountsRaw,
    default_region: Region,
    #[serde(default)]
    artifact_bucket_name: Option<String>,
    #[serde(default)]
    github_actions_role_name: Option<String>,
    #[serde(default)]
    oidc_provider_arn: Option<String>,
    #[serde(default)]
    trusted_repositories: Vec<RepositoryTrust>,
}

/// Validated, immutable configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub dev_account: AccountId,
    pub staging_account: Option<AccountId>,
    pub default_region: Region,
    pub artifact_bucket_name: BucketName,
    pub github_actions_role_name: RoleName,
    pub oidc_provider_arn: Option<String>,
    pub trusted_repositories: TrustPolicyInput,
}

impl AppConfig {
    fn from_raw(raw: AppConfigRaw) -> Result<Self> {
        let bucket = raw
            .artifact_bucket_name
            .unwrap_or_else(|| format!("{}-artifact-bucket", raw.accounts.dev));
        let artifact_bucket_name = BucketName::new(bucket)
            .ok_or_else(|| ConfigError::Invalid("artifact_bucket_name cannot be empty".into()))?;

        let role = raw
            .github_actions_role_name
            .unwrap_or_else(|| DEFAULT_ROLE_NAME.to_string());
        let github_actions_role_name = RoleName::new(role).ok_or_else(|| {
            ConfigError::Invalid("github_actions_role_name cannot be empty".into())
        })?;

        if let Some(arn) = &raw.oidc_provider_arn {
            if !arn.starts_with("arn:") {
                return Err(ConfigError::Invalid(format!(
                    "oidc_provider_arn '{arn}' is not an ARN"
                )));
            }
        }

        Ok(Self {
            dev_account: raw.accounts.dev,
            staging_account: raw.accounts.staging,
            default_region: raw.default_region,
            artifact_bucket_name,
            github_actions_role_name,
            oidc_provider_arn: raw.oidc_provider_arn,
            trusted_repositories: TrustPolicyInput::new(raw.trusted_repositories),
        })
    }

    /// Parses configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let raw: AppConfigRaw = toml::from_str(content)?;
        Self::from_raw(raw)
    }

    /// Environment of the pipeline stack and the `dev` stage.
    pub fn dev_env(&self) -> Environment {
        Environment::new(self.dev_account.clone(), self.default_region.clone())
    }

    /// ARN of the OIDC provider the role trusts: the configured one, or the
    /// one the pipeline stack declares in the dev account.
    pub fn provider_arn(&self, federation: &FederationSettings) -> String {
        match &self.oidc_provider_arn {
            Some(arn) => arn.clone(),
            None => {
                let host = federation
                    .issuer_url
                    .trim_start_matches("https://")
                    .trim_end_matches('/');
                format!("arn:aws:iam::{}:oidc-provider/{host}", self.dev_account)
            }
        }
    }

    /// Props for the pipeline stack: `dev` always, `staging` when configured.
    pub fn pipeline_stack_props(
        &self,
        federation: FederationSettings,
    ) -> std::result::Result<PipelineStackProps, AssemblyError> {
        let mut stages = vec![StageTarget {
            id: construct_id("dev")?,
            env: self.dev_env(),
        }];
        if let Some(staging) = &self.staging_account {
            stages.push(StageTarget {
                id: construct_id("staging")?,
                env: Environment::new(staging.clone(), self.default_region.clone()),
            });
        }

        Ok(PipelineStackProps {
            env: self.dev_env(),
            artifact_bucket_name: self.artifact_bucket_name.clone(),
            github_actions_role_name: self.github_actions_role_name.clone(),
            trusted_repositories: self.trusted_repositories.clone(),
            oidc_provider_arn: self.oidc_provider_arn.clone(),
            federation,
            stages,
        })
    }
}

/// Loads configuration from `path`.
pub fn load_config(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    AppConfig::from_toml(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
default_region = "eu-west-1"

[accounts]
dev = "111111111111"

[[trusted_repositories]]
owner = "octo"
name = "infra"
branches = ["main", "dev"]
"#;

    #[test]
    fn test_defaults_are_derived_from_dev_account() {
        let config = AppConfig::from_toml(MINIMAL).unwrap();

        assert_eq!(
            config.artifact_bucket_name.as_str(),
            "111111111111-artifact-bucket"
        );
        assert_eq!(config.github_actions_role_name.as_str(), DEFAULT_ROLE_NAME);
        assert_eq!(config.trusted_repositories.branch_count(), 2);
        assert!(config.staging_account.is_none());
    }

    #[test]
    fn test_invalid_account_id_is_rejected() {
        let content = MINIMAL.replace("111111111111", "1234");

        let err = AppConfig::from_toml(&content).unwrap_err();

        assert!(matches!(err, ConfigError::Toml(_)));
        assert!(err.to_string().contains("12 digits"));
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let content = format!("{MINIMAL}\nextra = true\n");

        assert!(AppConfig::from_toml(&content).is_err());
    }

    #[test]
    fn test_missing_repositories_are_left_to_the_builder() {
        let content = r#"
default_region = "eu-west-1"

[accounts]
dev = "111111111111"
"#;

        let config = AppConfig::from_toml(content).unwrap();

        assert!(config.trusted_repositories.repositories.is_empty());
    }

    #[test]
    fn test_non_arn_provider_is_rejected() {
        let content = format!("oidc_provider_arn = \"nope\"\n{MINIMAL}");

        assert!(matches!(
            AppConfig::from_toml(&content),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_provider_arn_defaults_to_dev_account_provider() {
        let config = AppConfig::from_toml(MINIMAL).unwrap();

        assert_eq!(
            config.provider_arn(&FederationSettings::default()),
            "arn:aws:iam::111111111111:oidc-provider/token.actions.githubusercontent.com"
        );
    }

    #[test]
    fn test_staging_account_adds_stage() {
        let content = MINIMAL.replace(
            "dev = \"111111111111\"",
            "dev = \"111111111111\"\nstaging = \"222222222222\"",
        );
        let config = AppConfig::from_toml(&content).unwrap();

        let props = config
            .pipeline_stack_props(FederationSettings::default())
            .unwrap();

        let ids: Vec<&str> = props.stages.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["dev", "staging"]);
        assert_eq!(props.stages[1].env.account.as_str(), "222222222222");
    }

    #[test]
    fn test_missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();

        let err = load_config(&dir.path().join("synth.toml")).unwrap_err();

        assert!(matches!(err, ConfigError::NotFound(_)));
    }
}
