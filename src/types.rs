use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum IntegrationType {
    Github,
    GithubEnterprise,
    GithubCloudApp,
    GithubServerApp,
    Other(String),
}

impl IntegrationType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Github => "github",
            Self::GithubEnterprise => "github-enterprise",
            Self::GithubCloudApp => "github-cloud-app",
            Self::GithubServerApp => "github-server-app",
            Self::Other(name) => name,
        }
    }
}

impl From<&str> for IntegrationType {
    fn from(value: &str) -> Self {
        match value {
            "github" => Self::Github,
            "github-enterprise" => Self::GithubEnterprise,
            "github-cloud-app" => Self::GithubCloudApp,
            "github-server-app" => Self::GithubServerApp,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for IntegrationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Integration {
    pub id: String,
    pub r#type: IntegrationType,
}

/// The GitHub App integration targets are moved to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppType {
    CloudApp,
    ServerApp,
}

impl AppType {
    pub fn integration_type(self) -> IntegrationType {
        match self {
            Self::CloudApp => IntegrationType::GithubCloudApp,
            Self::ServerApp => IntegrationType::GithubServerApp,
        }
    }

    pub fn source_type(self) -> &'static str {
        match self {
            Self::CloudApp => "github-cloud-app",
            Self::ServerApp => "github-server-app",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Target {
    pub id: String,
    pub display_name: String,
    /// Absent when the payload carries no integration relationship.
    pub integration_id: Option<String>,
    pub source_type: Option<IntegrationType>,
}

#[derive(Clone, Debug, Default)]
pub struct TargetFilter {
    pub source_type: Option<IntegrationType>,
}

impl TargetFilter {
    pub fn source_type(source_type: IntegrationType) -> Self {
        Self {
            source_type: Some(source_type),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
    Migrated,
    WouldMigrate,
    Skipped,
    Failed,
}

impl Outcome {
    pub const ALL: [Outcome; 4] = [
        Outcome::Migrated,
        Outcome::WouldMigrate,
        Outcome::Skipped,
        Outcome::Failed,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Migrated => "migrated",
            Self::WouldMigrate => "would migrate",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MigrationResult {
    pub target_id: String,
    pub display_name: String,
    pub outcome: Outcome,
    pub error_detail: Option<String>,
}

impl MigrationResult {
    pub fn new(target: &Target, outcome: Outcome, error_detail: Option<String>) -> Self {
        Self {
            target_id: target.id.clone(),
            display_name: target.display_name.clone(),
            outcome,
            error_detail,
        }
    }
}

// Wire payloads of the Snyk REST API.

#[derive(Deserialize, Debug)]
pub struct TargetsPage {
    #[serde(default)]
    pub data: Vec<TargetResource>,
    #[serde(default)]
    pub links: PageLinks,
}

#[derive(Deserialize, Debug, Default)]
pub struct PageLinks {
    pub next: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct TargetResource {
    pub id: String,
    pub attributes: TargetAttributes,
    #[serde(default)]
    pub relationships: Option<TargetRelationships>,
}

#[derive(Deserialize, Debug)]
pub struct TargetAttributes {
    #[serde(rename = "displayName", alias = "display_name")]
    pub display_name: String,
}

#[derive(Deserialize, Debug)]
pub struct TargetRelationships {
    pub integration: Option<IntegrationRelationship>,
}

#[derive(Deserialize, Debug)]
pub struct IntegrationRelationship {
    pub data: IntegrationRelationshipData,
}

#[derive(Deserialize, Debug)]
pub struct IntegrationRelationshipData {
    pub id: String,
    #[serde(default)]
    pub attributes: Option<IntegrationRelationshipAttributes>,
}

#[derive(Deserialize, Debug)]
pub struct IntegrationRelationshipAttributes {
    pub integration_type: Option<String>,
}

impl TargetResource {
    /// `listed_as` is the source type the listing was filtered on, used when the
    /// relationship does not name its integration type.
    pub fn into_target(self, listed_as: Option<&IntegrationType>) -> Target {
        let integration = self.relationships.and_then(|x| x.integration).map(|x| x.data);
        let relationship_type = integration
            .as_ref()
            .and_then(|x| x.attributes.as_ref())
            .and_then(|x| x.integration_type.as_deref())
            .map(IntegrationType::from);
        Target {
            id: self.id,
            display_name: self.attributes.display_name,
            integration_id: integration.map(|x| x.id),
            source_type: relationship_type.or_else(|| listed_as.cloned()),
        }
    }
}

#[derive(Serialize, Debug)]
pub struct MigrateRequest<'a> {
    pub data: MigrateRequestData<'a>,
}

#[derive(Serialize, Debug)]
pub struct MigrateRequestData<'a> {
    pub id: &'a str,
    pub attributes: MigrateRequestAttributes,
}

#[derive(Serialize, Debug)]
pub struct MigrateRequestAttributes {
    pub source_type: &'static str,
}

impl<'a> MigrateRequest<'a> {
    pub fn new(target_id: &'a str, destination: AppType) -> Self {
        Self {
            data: MigrateRequestData {
                id: target_id,
                attributes: MigrateRequestAttributes {
                    source_type: destination.source_type(),
                },
            },
        }
    }
}

/// Error bodies: JSON:API `errors` for REST endpoints, `message` for v1.
#[derive(Deserialize, Debug, Default)]
pub struct ErrorBody {
    #[serde(default)]
    pub errors: Vec<ErrorObject>,
    pub message: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct ErrorObject {
    pub detail: Option<String>,
    pub title: Option<String>,
}

impl ErrorBody {
    pub fn detail(&self) -> Option<String> {
        self.errors
            .iter()
            .find_map(|x| x.detail.clone().or_else(|| x.title.clone()))
            .or_else(|| self.message.clone())
    }
}
