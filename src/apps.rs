use crate::config::RunConfig;
use crate::error::{ApiError, RunError};
use crate::report::Report;
use crate::snyk::SnykApi;
use crate::types::{Integration, IntegrationType, MigrationResult, Outcome, Target, TargetFilter};
use futures::future;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use itertools::Itertools;
use std::collections::HashSet;

/// Source integrations whose targets are moved to the GitHub App.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Eligibility {
    pub integration_ids: HashSet<String>,
    /// Listing order: GitHub Enterprise first, then GitHub.
    pub source_types: Vec<IntegrationType>,
}

impl Eligibility {
    pub fn from_integrations(integrations: &[Integration], include_github_targets: bool) -> Self {
        let mut wanted = vec![IntegrationType::GithubEnterprise];
        if include_github_targets {
            wanted.push(IntegrationType::Github);
        }
        let eligible: Vec<&Integration> = integrations
            .iter()
            .filter(|x| wanted.contains(&x.r#type))
            .collect();
        Self {
            integration_ids: eligible.iter().map(|x| x.id.clone()).collect(),
            source_types: wanted
                .into_iter()
                .filter(|kind| eligible.iter().any(|x| &x.r#type == kind))
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.integration_ids.is_empty()
    }

    pub fn contains(&self, target: &Target) -> bool {
        match &target.integration_id {
            Some(id) => self.integration_ids.contains(id),
            None => target
                .source_type
                .as_ref()
                .map_or(false, |x| self.source_types.contains(x)),
        }
    }
}

/// Streams the eligible targets of `org_id`, one listing per eligible source type.
pub fn eligible_targets<'a>(
    api: &'a dyn SnykApi,
    org_id: &'a str,
    eligibility: Eligibility,
) -> BoxStream<'a, Result<Target, ApiError>> {
    let listings = eligibility
        .source_types
        .clone()
        .into_iter()
        .map(move |kind| api.list_targets(org_id, TargetFilter::source_type(kind)));
    stream::iter(listings)
        .flatten()
        .try_filter(move |target| {
            let keep = eligibility.contains(target);
            if !keep {
                log::debug!("Ignoring target {} {}", target.id, target.display_name);
            }
            future::ready(keep)
        })
        .boxed()
}

pub async fn migrate_target(
    api: &dyn SnykApi,
    config: &RunConfig,
    target: &Target,
) -> MigrationResult {
    if config.dry_run {
        return MigrationResult::new(target, Outcome::WouldMigrate, None);
    }
    match api
        .migrate_target(&config.org_id, &target.id, config.target_app_type)
        .await
    {
        Ok(()) => MigrationResult::new(target, Outcome::Migrated, None),
        Err(err) if err.is_conflict() => MigrationResult::new(
            target,
            Outcome::Skipped,
            Some("already migrated".to_string()),
        ),
        Err(err) if err.is_transient() => MigrationResult::new(
            target,
            Outcome::Failed,
            Some(format!("transient error after retry: {}", err)),
        ),
        Err(err) => MigrationResult::new(target, Outcome::Failed, Some(err.to_string())),
    }
}

/// Runs the whole migration, recording each outcome into `report` as it happens.
pub async fn run(
    api: &dyn SnykApi,
    config: &RunConfig,
    report: &mut Report,
) -> Result<(), RunError> {
    let org_id = config.org_id.as_str();
    let integrations = api
        .list_integrations(org_id)
        .await
        .map_err(|source| RunError::Integrations {
            org_id: org_id.to_string(),
            source,
        })?;
    log::debug!(
        "Integrations for org {}: {}",
        org_id,
        integrations.iter().map(|x| x.r#type.as_str()).join(", ")
    );

    let eligibility = Eligibility::from_integrations(&integrations, config.include_github_targets);
    if eligibility.is_empty() {
        log::info!(
            "No GitHub or GitHub Enterprise integration detected for Snyk org {}, nothing to migrate",
            org_id
        );
        return Ok(());
    }

    let destination = config.target_app_type.integration_type();
    if !integrations.iter().any(|x| x.r#type == destination) {
        let err = RunError::MissingDestinationIntegration {
            org_id: org_id.to_string(),
            integration: config.target_app_type.source_type(),
        };
        if !config.dry_run {
            return Err(err);
        }
        log::warn!("{}", err);
    }

    log::info!(
        "Looking for {} targets in org {}",
        eligibility.source_types.iter().join(" and "),
        org_id
    );

    let mut targets = eligible_targets(api, org_id, eligibility);
    while let Some(target) = targets.next().await {
        let target = target.map_err(|source| RunError::Enumeration {
            org_id: org_id.to_string(),
            source,
        })?;
        report.record(migrate_target(api, config, &target).await);
    }
    Ok(())
}
