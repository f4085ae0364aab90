//! GitHub REST backend.

mod client;
mod dto;

pub use client::{DEFAULT_API_URL, GitHubClient};
