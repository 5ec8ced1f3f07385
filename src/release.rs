// Release and asset selection: platform matching, version selection,
// and checksum-candidate detection

use crate::github::{Asset, Release};

/// Text layout of a checksum-bearing asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumFormat {
    /// `hash  filename` or `ALGO (filename) = hash` lines.
    Traditional,
    /// electron-builder `latest*.yml` manifest.
    Yaml,
}

/// A discovered checksum-bearing asset in a release.
#[derive(Debug, Clone)]
pub struct ChecksumFileInfo {
    pub filename: String,
    pub url: String,
    pub format: ChecksumFormat,
}

/// Per-file checksum suffixes; in strict mode the suffix only counts when
/// the remaining base name itself looks like an AppImage file.
const CHECKSUM_SUFFIXES: &[&str] = &[
    ".sha256sum",
    ".sha512sum",
    ".sha1sum",
    ".md5sum",
    ".digest",
    ".sum",
    ".hash",
];

/// Classify an asset filename as a checksum candidate.
///
/// Returns the expected content format, or None when the name does not
/// match any known checksum pattern. All matching is case-insensitive.
pub fn checksum_format_for(name: &str, strict: bool) -> Option<ChecksumFormat> {
    let lower = name.to_lowercase();

    let is_yaml_ext = lower.ends_with(".yml") || lower.ends_with(".yaml");
    if is_yaml_ext && (lower.starts_with("latest") || lower.contains("checksum")) {
        return Some(ChecksumFormat::Yaml);
    }

    if lower.contains("checksum")
        && [".txt", ".md5", ".sha1", ".sha256", ".sha512"]
            .iter()
            .any(|ext| lower.ends_with(ext))
    {
        return Some(ChecksumFormat::Traditional);
    }

    // SHA<N>SUMS / MD5SUMS, with or without a .txt extension
    let base = lower.strip_suffix(".txt").unwrap_or(&lower);
    if base == "md5sums" {
        return Some(ChecksumFormat::Traditional);
    }
    if let Some(digits) = base.strip_prefix("sha").and_then(|s| s.strip_suffix("sums"))
        && !digits.is_empty()
        && digits.chars().all(|c| c.is_ascii_digit())
    {
        return Some(ChecksumFormat::Traditional);
    }

    // Per-file sums published next to the AppImage itself
    if lower.ends_with("appimage.sha256") || lower.ends_with("appimage.sha512") {
        return Some(ChecksumFormat::Traditional);
    }

    for suffix in CHECKSUM_SUFFIXES {
        if let Some(stem) = lower.strip_suffix(suffix) {
            if strict && !stem.ends_with(".appimage") {
                continue;
            }
            return Some(ChecksumFormat::Traditional);
        }
    }

    None
}

/// Collect the checksum-bearing assets of a release.
pub fn detect_checksum_assets(release: &Release, strict: bool) -> Vec<ChecksumFileInfo> {
    release
        .assets
        .iter()
        .filter_map(|asset| {
            checksum_format_for(&asset.name, strict).map(|format| ChecksumFileInfo {
                filename: asset.name.clone(),
                url: asset.browser_download_url.clone(),
                format,
            })
        })
        .collect()
}

/// Select the AppImage asset matching the given architecture.
///
/// Falls back to the first AppImage asset when no platform keyword matches,
/// assuming a universal build.
pub fn select_asset_for_platform<'a>(assets: &'a [Asset], arch: &str) -> Option<&'a Asset> {
    let appimages: Vec<&Asset> = assets
        .iter()
        .filter(|a| a.name.to_lowercase().ends_with(".appimage"))
        .collect();

    let keywords: &[&str] = match arch {
        "x86_64" => &["x86_64", "amd64"],
        "aarch64" => &["arm64", "aarch64"],
        "arm" => &["armv7", "armhf"],
        _ => &[],
    };

    appimages
        .iter()
        .find(|a| {
            let name = a.name.to_lowercase();
            keywords.iter().any(|k| name.contains(k))
        })
        .copied()
        .or_else(|| appimages.first().copied())
}

/// Select a release by version spec.
///
/// None or "latest" picks the newest stable release; when only prereleases
/// exist the newest of those is returned (the caller can inspect the
/// prerelease flag and warn). A named spec matches the published tag
/// exactly, then with a leading `v` stripped from either side.
pub fn select_release<'a>(releases: &'a [Release], spec: Option<&str>) -> Option<&'a Release> {
    match spec {
        None | Some("latest") => releases
            .iter()
            .find(|r| !r.prerelease)
            .or_else(|| releases.first()),
        Some(tag) => releases
            .iter()
            .find(|r| r.original_tag_name == tag)
            .or_else(|| {
                releases.iter().find(|r| {
                    r.original_tag_name.strip_prefix('v') == Some(tag)
                        || tag.strip_prefix('v') == Some(r.original_tag_name.as_str())
                })
            }),
    }
}

/// Strip a leading `v` from a tag to get a comparable version string.
pub fn normalize_version(tag: &str) -> String {
    let trimmed = tag.trim();
    trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('V'))
        .unwrap_or(trimmed)
        .to_string()
}

/// Semantic-version-aware "is candidate newer than current".
///
/// Falls back to a plain string comparison when either side does not parse
/// as a semantic version.
pub fn is_newer_version(current: &str, candidate: &str) -> bool {
    let current = normalize_version(current);
    let candidate = normalize_version(candidate);
    match (
        semver::Version::parse(&current),
        semver::Version::parse(&candidate),
    ) {
        (Ok(cur), Ok(cand)) => cand > cur,
        _ => candidate.as_str() > current.as_str(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asset(name: &str) -> Asset {
        Asset {
            name: name.to_string(),
            size: 0,
            digest: None,
            browser_download_url: format!("https://example.com/{}", name),
        }
    }

    fn release(tag: &str, prerelease: bool) -> Release {
        Release {
            owner: "owner".to_string(),
            repo: "repo".to_string(),
            version: normalize_version(tag),
            prerelease,
            original_tag_name: tag.to_string(),
            assets: vec![],
        }
    }

    #[test]
    fn test_checksum_format_yaml_manifest() {
        assert_eq!(
            checksum_format_for("latest-linux.yml", false),
            Some(ChecksumFormat::Yaml)
        );
        assert_eq!(
            checksum_format_for("checksums.yaml", false),
            Some(ChecksumFormat::Yaml)
        );
    }

    #[test]
    fn test_checksum_format_sums_files() {
        assert_eq!(
            checksum_format_for("SHA256SUMS", false),
            Some(ChecksumFormat::Traditional)
        );
        assert_eq!(
            checksum_format_for("SHA512SUMS.txt", false),
            Some(ChecksumFormat::Traditional)
        );
        assert_eq!(
            checksum_format_for("MD5SUMS", false),
            Some(ChecksumFormat::Traditional)
        );
        assert_eq!(
            checksum_format_for("checksums.txt", false),
            Some(ChecksumFormat::Traditional)
        );
    }

    #[test]
    fn test_checksum_format_per_file() {
        assert_eq!(
            checksum_format_for("app-x86_64.AppImage.sha256", false),
            Some(ChecksumFormat::Traditional)
        );
        assert_eq!(
            checksum_format_for("app.AppImage.DIGEST", false),
            Some(ChecksumFormat::Traditional)
        );
        assert_eq!(
            checksum_format_for("release.sha256sum", false),
            Some(ChecksumFormat::Traditional)
        );
    }

    #[test]
    fn test_checksum_format_strict_mode() {
        assert_eq!(checksum_format_for("notes.sum", true), None);
        assert_eq!(
            checksum_format_for("app.AppImage.sum", true),
            Some(ChecksumFormat::Traditional)
        );
        // Non-suffix patterns are unaffected by strict mode
        assert_eq!(
            checksum_format_for("SHA256SUMS", true),
            Some(ChecksumFormat::Traditional)
        );
    }

    #[test]
    fn test_checksum_format_rejects_regular_assets() {
        assert_eq!(checksum_format_for("app-x86_64.AppImage", false), None);
        assert_eq!(checksum_format_for("README.md", false), None);
        assert_eq!(checksum_format_for("app.tar.gz", false), None);
    }

    #[test]
    fn test_select_asset_platform_match() {
        let assets = vec![
            asset("app-arm64.AppImage"),
            asset("app-x86_64.AppImage"),
            asset("app.tar.gz"),
        ];
        let selected = select_asset_for_platform(&assets, "x86_64").unwrap();
        assert_eq!(selected.name, "app-x86_64.AppImage");
        let selected = select_asset_for_platform(&assets, "aarch64").unwrap();
        assert_eq!(selected.name, "app-arm64.AppImage");
    }

    #[test]
    fn test_select_asset_universal_fallback() {
        let assets = vec![asset("app.AppImage"), asset("app.zip")];
        let selected = select_asset_for_platform(&assets, "x86_64").unwrap();
        assert_eq!(selected.name, "app.AppImage");
    }

    #[test]
    fn test_select_asset_no_appimage() {
        let assets = vec![asset("app.tar.gz")];
        assert!(select_asset_for_platform(&assets, "x86_64").is_none());
    }

    #[test]
    fn test_select_release_latest_prefers_stable() {
        let releases = vec![release("v2.0.0-rc1", true), release("v1.9.0", false)];
        let selected = select_release(&releases, None).unwrap();
        assert_eq!(selected.original_tag_name, "v1.9.0");
    }

    #[test]
    fn test_select_release_latest_prerelease_fallback() {
        let releases = vec![release("v2.0.0-rc1", true)];
        let selected = select_release(&releases, Some("latest")).unwrap();
        assert!(selected.prerelease);
    }

    #[test]
    fn test_select_release_exact_and_v_stripped() {
        let releases = vec![release("v1.2.3", false), release("2.0.0", false)];
        assert_eq!(
            select_release(&releases, Some("v1.2.3")).unwrap().version,
            "1.2.3"
        );
        assert_eq!(
            select_release(&releases, Some("1.2.3")).unwrap().version,
            "1.2.3"
        );
        assert_eq!(
            select_release(&releases, Some("v2.0.0")).unwrap().version,
            "2.0.0"
        );
        assert!(select_release(&releases, Some("3.0.0")).is_none());
    }

    #[test]
    fn test_is_newer_version_semver() {
        assert!(is_newer_version("1.2.3", "1.3.0"));
        assert!(!is_newer_version("1.3.0", "1.2.3"));
        assert!(!is_newer_version("1.2.3", "1.2.3"));
        assert!(is_newer_version("v1.2.3", "v2.0.0"));
    }

    #[test]
    fn test_is_newer_version_string_fallback() {
        assert!(is_newer_version("2024.01", "2024.02"));
        assert!(!is_newer_version("build-7", "build-7"));
    }
}
