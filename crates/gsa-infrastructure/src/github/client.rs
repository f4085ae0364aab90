//! GitHubClient - owner listing, Dependabot alerts, rate limits and token
//! verification against the GitHub REST API.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use gsa_core::alerts::{AlertsResponse, AlertsSource, RepoAlerts};
use gsa_core::auth::{AuthService, AuthStatus, TokenStore};
use gsa_core::error::{GsaError, Result};
use gsa_core::owner::{Owner, OwnerDirectory, Repository};
use gsa_core::rate_limit::{RateLimitSource, RateLimits};
use gsa_core::selection::SelectionStore;
use reqwest::{Client, RequestBuilder, StatusCode};

use super::dto::{
    GitHubAlert, GitHubOrg, GitHubRateLimitResponse, GitHubRepo, GitHubUser, count_open,
};

pub const DEFAULT_API_URL: &str = "https://api.github.com";

const USER_AGENT: &str = "github-security-alerts";
const PER_PAGE: &str = "100";
const MAX_PAGES: u32 = 20;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// GitHub REST backend.
///
/// The token is read from the [`TokenStore`] on every call, so a login or
/// logout elsewhere is picked up without rebuilding the client.
#[derive(Clone)]
pub struct GitHubClient {
    client: Client,
    base_url: String,
    tokens: Arc<dyn TokenStore>,
    selection: Arc<dyn SelectionStore>,
}

impl GitHubClient {
    pub fn new(tokens: Arc<dyn TokenStore>, selection: Arc<dyn SelectionStore>) -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_API_URL.to_string(),
            tokens,
            selection,
        }
    }

    /// Points the client at another API root (GitHub Enterprise, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn get(&self, path: &str, token: &str) -> RequestBuilder {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .timeout(REQUEST_TIMEOUT)
            .header("Authorization", format!("Bearer {}", token))
            .header("User-Agent", USER_AGENT)
    }

    async fn require_token(&self) -> Result<String> {
        self.tokens
            .load_token()
            .await?
            .ok_or_else(|| GsaError::auth("Not authenticated"))
    }

    /// Fetches the account behind `token`. `Ok(None)` means the token was
    /// rejected; transport failures are errors.
    async fn fetch_user(&self, token: &str) -> Result<Option<GitHubUser>> {
        let response = self
            .get("/user", token)
            .send()
            .await
            .map_err(|e| GsaError::transient("user", e.to_string()))?;

        if !response.status().is_success() {
            tracing::debug!("GET /user returned {}", response.status());
            return Ok(None);
        }

        response
            .json::<GitHubUser>()
            .await
            .map(Some)
            .map_err(|e| GsaError::transient("user", e.to_string()))
    }

    async fn fetch_orgs(&self, token: &str) -> Vec<GitHubOrg> {
        match self.get("/user/orgs", token).send().await {
            Ok(response) if response.status().is_success() => {
                response.json().await.unwrap_or_else(|e| {
                    tracing::warn!("Failed to parse organizations: {}", e);
                    Vec::new()
                })
            }
            Ok(response) => {
                tracing::warn!("Organization listing returned {}", response.status());
                Vec::new()
            }
            Err(e) => {
                tracing::warn!("Failed to fetch organizations: {}", e);
                Vec::new()
            }
        }
    }

    async fn fetch_repo_page(
        &self,
        token: &str,
        owner: &str,
        is_user: bool,
        page: u32,
    ) -> Result<Vec<GitHubRepo>> {
        let context = format!("repos for {}", owner);
        let page = page.to_string();
        let mut request = if is_user {
            self.get("/user/repos", token)
                .query(&[("affiliation", "owner")])
        } else {
            self.get(&format!("/orgs/{}/repos", owner), token)
                .query(&[("type", "all")])
        };
        request = request.query(&[
            ("per_page", PER_PAGE),
            ("page", page.as_str()),
            ("sort", "full_name"),
            ("direction", "asc"),
        ]);

        let response = request
            .send()
            .await
            .map_err(|e| GsaError::transient(context.clone(), e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(GsaError::transient(
                context,
                format!("HTTP {}: {}", status, text),
            ));
        }

        response
            .json()
            .await
            .map_err(|e| GsaError::transient(context, e.to_string()))
    }

    /// Alert count of a single repository. Never fails: anything other than
    /// a readable alert list counts as Dependabot being unavailable.
    async fn repo_alerts(&self, token: &str, full_name: &str) -> RepoAlerts {
        let unavailable = || RepoAlerts {
            name: full_name.to_string(),
            alerts: 0,
            dependabot_enabled: false,
        };

        let response = match self
            .get(&format!("/repos/{}/dependabot/alerts", full_name), token)
            .header("Accept", "application/vnd.github+json")
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Failed to fetch alerts for {}: {}", full_name, e);
                return unavailable();
            }
        };

        if response.status() == StatusCode::UNPROCESSABLE_ENTITY {
            tracing::warn!("Dependabot not enabled for {}", full_name);
            return unavailable();
        }

        match response.json::<Vec<GitHubAlert>>().await {
            Ok(alerts) => RepoAlerts {
                name: full_name.to_string(),
                alerts: count_open(&alerts),
                dependabot_enabled: true,
            },
            Err(e) => {
                tracing::warn!("Failed to parse alerts for {}: {}", full_name, e);
                unavailable()
            }
        }
    }
}

/// Keeps the repositories owned by `owner`. The user listing also returns
/// repositories reachable through other affiliations on some accounts.
fn retain_owned(repos: Vec<GitHubRepo>, owner: &str) -> Vec<GitHubRepo> {
    let owner = owner.to_lowercase();
    repos
        .into_iter()
        .filter(|r| r.owner.login.to_lowercase() == owner)
        .collect()
}

fn sort_by_name(repos: &mut [Repository]) {
    repos.sort_by_key(|r| r.name.to_lowercase());
}

#[async_trait]
impl OwnerDirectory for GitHubClient {
    async fn get_owners(&self) -> Result<Vec<Owner>> {
        let token = self.require_token().await?;

        let user = self
            .fetch_user(&token)
            .await?
            .ok_or_else(|| GsaError::auth("Token rejected while listing owners"))?;

        let mut owners = vec![Owner::from(user)];
        owners.extend(self.fetch_orgs(&token).await.into_iter().map(Owner::from));
        tracing::debug!("Listed {} owners", owners.len());
        Ok(owners)
    }

    async fn get_repos_for_owner(&self, owner: &str, is_user: bool) -> Result<Vec<Repository>> {
        let token = self.require_token().await?;
        let mut all = Vec::new();

        for page in 1..=MAX_PAGES {
            let repos = self.fetch_repo_page(&token, owner, is_user, page).await?;
            tracing::debug!("Page {} for {} returned {} repos", page, owner, repos.len());
            if repos.is_empty() {
                break;
            }
            let repos = if is_user {
                retain_owned(repos, owner)
            } else {
                repos
            };
            all.extend(repos.into_iter().map(Repository::from));
        }

        sort_by_name(&mut all);
        tracing::info!("Loaded {} repos for {}", all.len(), owner);
        Ok(all)
    }
}

#[async_trait]
impl AlertsSource for GitHubClient {
    async fn get_security_alerts(&self, full_names: &[String]) -> Result<AlertsResponse> {
        if full_names.is_empty() {
            return Ok(AlertsResponse::empty());
        }
        let token = self.require_token().await?;

        let mut repos = Vec::with_capacity(full_names.len());
        for full_name in full_names {
            repos.push(self.repo_alerts(&token, full_name).await);
        }

        let response = AlertsResponse::from_repos(repos);
        tracing::info!(
            "Fetched alerts for {} repos: {} open",
            response.repos.len(),
            response.total_alerts
        );
        Ok(response)
    }
}

#[async_trait]
impl RateLimitSource for GitHubClient {
    async fn get_rate_limits(&self) -> Result<Option<RateLimits>> {
        let Some(token) = self.tokens.load_token().await? else {
            return Ok(None);
        };

        let response = self
            .get("/rate_limit", &token)
            .header("Accept", "application/vnd.github+json")
            .send()
            .await
            .map_err(|e| GsaError::transient("rate limits", e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(GsaError::auth("Token rejected while reading rate limits"));
        }
        if !status.is_success() {
            return Err(GsaError::transient(
                "rate limits",
                format!("HTTP {}", status),
            ));
        }

        let limits: RateLimits = response
            .json::<GitHubRateLimitResponse>()
            .await
            .map_err(|e| GsaError::transient("rate limits", e.to_string()))?
            .into();
        tracing::debug!(
            "Core budget {}/{} remaining",
            limits.core.remaining,
            limits.core.limit
        );
        Ok(Some(limits))
    }
}

#[async_trait]
impl AuthService for GitHubClient {
    async fn get_auth_status(&self) -> Result<AuthStatus> {
        let Some(token) = self.tokens.load_token().await? else {
            return Ok(AuthStatus::signed_out());
        };

        match self.fetch_user(&token).await? {
            Some(user) => Ok(AuthStatus::signed_in(user.login)),
            None => {
                tracing::info!("Stored token was rejected, clearing it");
                if let Err(e) = self.tokens.save_token(None).await {
                    tracing::warn!("Failed to clear rejected token: {}", e);
                }
                Ok(AuthStatus::signed_out())
            }
        }
    }

    async fn set_token(&self, token: &str) -> Result<()> {
        let token = token.trim();
        if self.fetch_user(token).await?.is_none() {
            return Err(GsaError::auth("Invalid token"));
        }
        self.tokens.save_token(Some(token.to_string())).await
    }

    async fn get_token(&self) -> Result<Option<String>> {
        self.tokens.load_token().await
    }

    async fn logout(&self) -> Result<()> {
        self.tokens.save_token(None).await?;
        self.selection.set_selected_repos(Vec::new()).await
    }
}
