//! GitHub adapter for branchscout
//!
//! Provides [`GithubHost`], a `RepositoryHost` implementation over the
//! GitHub REST API, and [`GithubConfig`] for endpoint, token, and timeout
//! settings. Works against github.com and GitHub Enterprise installations
//! via the `GITHUB_API_URL` environment variable.

pub mod client;

pub use client::{GithubConfig, GithubHost};
