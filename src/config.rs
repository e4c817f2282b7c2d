use crate::env::{self, SNYK_ORG_ID, SNYK_TOKEN};
use crate::error::ConfigError;
use crate::types::AppType;
use clap::Parser;
use std::fmt;
use std::str::FromStr;

/// Migrate Snyk targets from the GitHub or GitHub Enterprise integration to the
/// GitHub Cloud App or GitHub Server App integration.
#[derive(Parser, Debug, Default, Clone)]
#[command(version, about)]
pub struct Args {
    #[arg(help = format!(
        "ID of the Snyk organization whose targets should be migrated [env: {}]",
        SNYK_ORG_ID
    ))]
    pub org_id: Option<String>,

    #[arg(help = format!("Snyk API token [env: {}]", SNYK_TOKEN))]
    pub snyk_token: Option<String>,

    /// Snyk region: default, eu or au
    #[arg(long, default_value = "default")]
    pub tenant: String,

    /// Migrate to the GitHub Server App integration instead of the GitHub Cloud App
    #[arg(long)]
    pub github_server_app: bool,

    /// Print the targets that would be migrated without migrating them
    #[arg(long)]
    pub dry_run: bool,

    /// Migrate both github and github-enterprise targets (default: github-enterprise only)
    #[arg(long)]
    pub include_github_targets: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Tenant {
    #[default]
    Default,
    Eu,
    Au,
}

impl Tenant {
    pub fn api_host(self) -> &'static str {
        match self {
            Self::Default => "https://api.snyk.io",
            Self::Eu => "https://api.eu.snyk.io",
            Self::Au => "https://api.au.snyk.io",
        }
    }
}

impl FromStr for Tenant {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "" | "default" => Ok(Self::Default),
            "eu" => Ok(Self::Eu),
            "au" => Ok(Self::Au),
            other => Err(ConfigError::InvalidTenant(other.to_string())),
        }
    }
}

/// API token that never shows up in `Debug` or `Display` output.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretToken(String);

impl SecretToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretToken(***)")
    }
}

impl fmt::Display for SecretToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunConfig {
    pub org_id: String,
    pub token: SecretToken,
    pub tenant: Tenant,
    pub target_app_type: AppType,
    pub dry_run: bool,
    pub include_github_targets: bool,
    pub verbose: bool,
}

impl RunConfig {
    pub fn from_env(args: Args) -> Result<Self, ConfigError> {
        Self::resolve(args, env::load_env)
    }

    /// CLI values win over `lookup`; blank values count as missing.
    pub fn resolve<F>(args: Args, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let org_id = env::non_empty(args.org_id)
            .or_else(|| env::non_empty(lookup(SNYK_ORG_ID)))
            .ok_or(ConfigError::MissingCredential {
                name: "organization id",
                env_var: SNYK_ORG_ID,
            })?;
        let token = env::non_empty(args.snyk_token)
            .or_else(|| env::non_empty(lookup(SNYK_TOKEN)))
            .ok_or(ConfigError::MissingCredential {
                name: "Snyk API token",
                env_var: SNYK_TOKEN,
            })?;
        let tenant = args.tenant.trim().parse::<Tenant>()?;
        let target_app_type = if args.github_server_app {
            AppType::ServerApp
        } else {
            AppType::CloudApp
        };

        Ok(Self {
            org_id,
            token: SecretToken::new(token),
            tenant,
            target_app_type,
            dry_run: args.dry_run,
            include_github_targets: args.include_github_targets,
            verbose: args.verbose,
        })
    }
}
