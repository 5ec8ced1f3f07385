// GitHub Releases client and domain models

use crate::http;
use crate::release::normalize_version;
use serde::{Deserialize, Serialize};

/// One release artifact, as reported by the release API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub name: String,
    #[serde(default)]
    pub size: u64,
    /// Algorithm-prefixed hash string (e.g. "sha256:<hex>") when the API
    /// provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    pub browser_download_url: String,
}

/// One version of a repository, with its assets in API order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Release {
    pub owner: String,
    pub repo: String,
    pub version: String,
    pub prerelease: bool,
    pub original_tag_name: String,
    pub assets: Vec<Asset>,
}

#[derive(Debug, Deserialize)]
struct ApiRelease {
    tag_name: String,
    prerelease: bool,
    #[serde(default)]
    assets: Vec<Asset>,
}

impl ApiRelease {
    fn into_release(self, owner: &str, repo: &str) -> Release {
        Release {
            owner: owner.to_string(),
            repo: repo.to_string(),
            version: normalize_version(&self.tag_name),
            prerelease: self.prerelease,
            original_tag_name: self.tag_name,
            assets: self.assets,
        }
    }
}

/// Parse an `owner/repo[@tag]` spec.
pub fn parse_repo_spec(spec: &str) -> anyhow::Result<(String, String, Option<String>)> {
    let (repo_part, tag) = match spec.split_once('@') {
        Some((repo_part, tag)) => (repo_part, Some(tag.to_string())),
        None => (spec, None),
    };

    let parts: Vec<&str> = repo_part.split('/').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        anyhow::bail!(
            "Invalid GitHub repository format. Expected 'owner/repo', got '{}'",
            repo_part
        );
    }

    Ok((parts[0].to_string(), parts[1].to_string(), tag))
}

/// Fetch the repository's releases, newest first (API order).
pub async fn fetch_releases(owner: &str, repo: &str) -> anyhow::Result<Vec<Release>> {
    let url = format!(
        "https://api.github.com/repos/{}/{}/releases?per_page=100",
        owner, repo
    );
    let releases: Vec<ApiRelease> = http::fetch_json(&url).await.map_err(|e| {
        anyhow::anyhow!("Failed to fetch GitHub releases for '{}/{}': {}", owner, repo, e)
    })?;
    Ok(releases
        .into_iter()
        .map(|r| r.into_release(owner, repo))
        .collect())
}

/// Fetch a single release by its published tag.
pub async fn fetch_release_by_tag(owner: &str, repo: &str, tag: &str) -> anyhow::Result<Release> {
    let url = format!(
        "https://api.github.com/repos/{}/{}/releases/tags/{}",
        owner, repo, tag
    );
    let release: ApiRelease = http::fetch_json(&url).await.map_err(|e| {
        anyhow::anyhow!(
            "Failed to fetch GitHub release '{}' for '{}/{}': {}",
            tag,
            owner,
            repo,
            e
        )
    })?;
    Ok(release.into_release(owner, repo))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_repo_spec() {
        let (owner, repo, tag) = parse_repo_spec("AppFlowy-IO/AppFlowy").unwrap();
        assert_eq!(owner, "AppFlowy-IO");
        assert_eq!(repo, "AppFlowy");
        assert_eq!(tag, None);
    }

    #[test]
    fn test_parse_repo_spec_with_tag() {
        let (owner, repo, tag) = parse_repo_spec("owner/repo@v1.2.3").unwrap();
        assert_eq!(owner, "owner");
        assert_eq!(repo, "repo");
        assert_eq!(tag, Some("v1.2.3".to_string()));
    }

    #[test]
    fn test_parse_repo_spec_invalid() {
        assert!(parse_repo_spec("just-a-name").is_err());
        assert!(parse_repo_spec("owner/").is_err());
        assert!(parse_repo_spec("/repo").is_err());
    }

    #[test]
    fn test_api_release_conversion() {
        let api = ApiRelease {
            tag_name: "v2.0.1".to_string(),
            prerelease: false,
            assets: vec![],
        };
        let release = api.into_release("owner", "repo");
        assert_eq!(release.version, "2.0.1");
        assert_eq!(release.original_tag_name, "v2.0.1");
    }
}
