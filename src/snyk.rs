use crate::config::{RunConfig, SecretToken};
use crate::error::ApiError;
use crate::http::{self, Client};
use crate::types::{
    AppType, ErrorBody, Integration, IntegrationType, MigrateRequest, Target, TargetFilter,
    TargetsPage,
};
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::time::Duration;

pub const REST_API_VERSION: &str = "2023-11-27~beta";
pub const HIDDEN_API_VERSION: &str = "2023-04-02~experimental";
pub const PAGE_LIMIT: u32 = 100;
const JSON_API: &str = "application/vnd.api+json";
const MAX_DETAIL_LEN: usize = 200;

/// The slice of the Snyk API the migration needs.
#[async_trait]
pub trait SnykApi: Send + Sync {
    async fn list_integrations(&self, org_id: &str) -> Result<Vec<Integration>, ApiError>;

    /// Streams every target matching `filter`, following pagination links lazily.
    fn list_targets<'a>(
        &'a self,
        org_id: &'a str,
        filter: TargetFilter,
    ) -> BoxStream<'a, Result<Target, ApiError>>;

    async fn migrate_target(
        &self,
        org_id: &str,
        target_id: &str,
        destination: AppType,
    ) -> Result<(), ApiError>;
}

pub struct SnykClient {
    client: Client,
    base_url: String,
    token: SecretToken,
}

enum Cursor {
    First,
    Next(String),
    Done,
}

impl SnykClient {
    pub fn new(config: &RunConfig) -> Result<Self, reqwest::Error> {
        Self::with_base_url(config.tenant.api_host(), config.token.clone())
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        token: SecretToken,
    ) -> Result<Self, reqwest::Error> {
        Self::with_timeout(base_url, token, http::REQUEST_TIMEOUT)
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        token: SecretToken,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: http::create_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    fn authorization(&self) -> String {
        format!("token {}", self.token.expose())
    }

    fn rest_url(&self) -> String {
        format!("{}/rest", self.base_url)
    }

    fn next_page_url(&self, next: &str) -> String {
        if next.starts_with("http://") || next.starts_with("https://") {
            next.to_string()
        } else if next.starts_with("/rest/") {
            format!("{}{}", self.base_url, next)
        } else {
            format!("{}/{}", self.rest_url(), next.trim_start_matches('/'))
        }
    }

    async fn fetch_targets_page(
        &self,
        org_id: &str,
        filter: TargetFilter,
        cursor: Cursor,
    ) -> Result<Option<(Vec<Target>, Cursor)>, ApiError> {
        let request = match cursor {
            Cursor::Done => return Ok(None),
            Cursor::First => {
                let url = format!("{}/orgs/{}/targets", self.rest_url(), org_id);
                let mut query = vec![
                    ("version", REST_API_VERSION.to_string()),
                    ("limit", PAGE_LIMIT.to_string()),
                ];
                if let Some(source_type) = &filter.source_type {
                    query.push(("origin", source_type.to_string()));
                }
                log::debug!("Listing targets: {} {:?}", url, query);
                self.client.get(url).query(&query)
            }
            Cursor::Next(url) => {
                log::debug!("Listing targets: {}", url);
                self.client.get(url)
            }
        };
        let response = request
            .header(AUTHORIZATION, self.authorization())
            .send()
            .await?;
        let page: TargetsPage = read_json(check_status(response).await?).await?;

        let next = match page.links.next.as_deref() {
            Some(next) if !next.trim().is_empty() => Cursor::Next(self.next_page_url(next)),
            _ => Cursor::Done,
        };
        let targets = page
            .data
            .into_iter()
            .map(|x| x.into_target(filter.source_type.as_ref()))
            .collect();
        Ok(Some((targets, next)))
    }
}

#[async_trait]
impl SnykApi for SnykClient {
    async fn list_integrations(&self, org_id: &str) -> Result<Vec<Integration>, ApiError> {
        let url = format!("{}/v1/org/{}/integrations", self.base_url, org_id);
        log::debug!("Listing integrations: {}", url);
        let response = self
            .client
            .get(url)
            .header(AUTHORIZATION, self.authorization())
            .send()
            .await?;
        let payload: BTreeMap<String, serde_json::Value> =
            read_json(check_status(response).await?).await?;
        let integrations = payload
            .into_iter()
            .filter_map(|(kind, id)| {
                id.as_str().map(|id| Integration {
                    id: id.to_string(),
                    r#type: IntegrationType::from(kind.as_str()),
                })
            })
            .collect();
        Ok(integrations)
    }

    fn list_targets<'a>(
        &'a self,
        org_id: &'a str,
        filter: TargetFilter,
    ) -> BoxStream<'a, Result<Target, ApiError>> {
        stream::try_unfold(Cursor::First, move |cursor| {
            self.fetch_targets_page(org_id, filter.clone(), cursor)
        })
        .map_ok(|targets: Vec<Target>| {
            stream::iter(targets.into_iter().map(Ok::<_, ApiError>))
        })
        .try_flatten()
        .boxed()
    }

    async fn migrate_target(
        &self,
        org_id: &str,
        target_id: &str,
        destination: AppType,
    ) -> Result<(), ApiError> {
        let url = format!(
            "{}/hidden/orgs/{}/targets/{}",
            self.base_url, org_id, target_id
        );
        let body = serde_json::to_vec(&MigrateRequest::new(target_id, destination))?;
        let response = self
            .client
            .patch(url)
            .query(&[("version", HIDDEN_API_VERSION)])
            .header(CONTENT_TYPE, JSON_API)
            .header(AUTHORIZATION, self.authorization())
            .body(body)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let payload = response
        .text()
        .await
        .map_err(reqwest_middleware::Error::from)?;
    Ok(serde_json::from_str(&payload)?)
}

async fn check_status(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status {
        status,
        detail: error_detail(status, &body),
    })
}

fn error_detail(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|x| x.detail())
        .or_else(|| {
            let body = body.trim();
            (!body.is_empty()).then(|| body.chars().take(MAX_DETAIL_LEN).collect())
        })
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string())
}
