//! Wire shapes of the GitHub REST responses this crate reads.
//!
//! Only the fields actually used are declared; serde ignores the rest.

use gsa_core::owner::{Owner, Repository};
use gsa_core::rate_limit::{RateLimit, RateLimits};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct GitHubUser {
    pub login: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GitHubOrg {
    pub login: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GitHubOwner {
    pub login: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GitHubRepo {
    pub full_name: String,
    pub name: String,
    pub owner: GitHubOwner,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GitHubAlert {
    pub state: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GitHubRate {
    pub limit: u64,
    pub remaining: u64,
    pub reset: i64,
    #[serde(default)]
    pub used: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GitHubRateResources {
    pub core: GitHubRate,
    pub search: GitHubRate,
    #[serde(default)]
    pub graphql: Option<GitHubRate>,
}

/// Body of `GET /rate_limit`.
#[derive(Debug, Deserialize)]
pub(crate) struct GitHubRateLimitResponse {
    pub resources: GitHubRateResources,
}

impl From<GitHubUser> for Owner {
    fn from(user: GitHubUser) -> Self {
        Owner::user(user.login)
    }
}

impl From<GitHubOrg> for Owner {
    fn from(org: GitHubOrg) -> Self {
        Owner::organization(org.login)
    }
}

impl From<GitHubRepo> for Repository {
    fn from(repo: GitHubRepo) -> Self {
        Repository {
            full_name: repo.full_name,
            name: repo.name,
            owner: repo.owner.login,
            selected: false,
        }
    }
}

impl From<GitHubRate> for RateLimit {
    fn from(rate: GitHubRate) -> Self {
        // Older hosts omit `used` or report 0.
        let used = match rate.used {
            Some(used) if used > 0 => used,
            _ => rate.limit.saturating_sub(rate.remaining),
        };
        RateLimit {
            limit: rate.limit,
            remaining: rate.remaining,
            used,
            reset_at: rate.reset,
        }
    }
}

impl From<GitHubRateLimitResponse> for RateLimits {
    fn from(response: GitHubRateLimitResponse) -> Self {
        let resources = response.resources;
        RateLimits {
            core: resources.core.into(),
            search: resources.search.into(),
            graphql: resources.graphql.map(Into::into),
        }
    }
}

/// Number of alerts still open.
pub(crate) fn count_open(alerts: &[GitHubAlert]) -> usize {
    alerts.iter().filter(|a| a.state == "open").count()
}
