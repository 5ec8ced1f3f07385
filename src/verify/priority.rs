// Checksum candidate prioritization

use crate::release::{ChecksumFileInfo, ChecksumFormat};

/// Hash-algorithm extensions that mark a per-file checksum asset.
const HASH_EXTENSIONS: &[&str] = &[
    "sha256",
    "sha512",
    "sha256sum",
    "sha512sum",
    "sha1",
    "sha1sum",
    "md5",
    "md5sum",
];

/// Specificity rank for one candidate against the target asset name.
/// Lower ranks win. Rank 4 is intentionally unassigned.
fn rank(info: &ChecksumFileInfo, target: &str) -> u8 {
    let name = info.filename.to_lowercase();
    let target = target.to_lowercase();

    if name == format!("{}.digest", target) {
        return 1;
    }
    if HASH_EXTENSIONS
        .iter()
        .any(|ext| name == format!("{}.{}", target, ext))
    {
        return 2;
    }
    if info.format == ChecksumFormat::Yaml {
        return 3;
    }
    5
}

/// Order checksum candidates from most to least specific for the target
/// asset: exact `.DIGEST` match, then per-file hash extension, then YAML
/// manifest, then generic multi-file lists. Within a rank, candidates
/// named "experimental" sort after their siblings; remaining ties keep
/// input order.
pub fn prioritize(candidates: &[ChecksumFileInfo], target_asset_name: &str) -> Vec<ChecksumFileInfo> {
    let mut ranked = candidates.to_vec();
    ranked.sort_by_key(|c| {
        (
            rank(c, target_asset_name),
            c.filename.to_lowercase().contains("experimental"),
        )
    });
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(filename: &str, format: ChecksumFormat) -> ChecksumFileInfo {
        ChecksumFileInfo {
            filename: filename.to_string(),
            url: format!("https://example.com/{}", filename),
            format,
        }
    }

    const TARGET: &str = "app-x86_64.AppImage";

    #[test]
    fn test_empty_input() {
        assert!(prioritize(&[], TARGET).is_empty());
    }

    #[test]
    fn test_tier_ordering() {
        let candidates = vec![
            info("SHA256SUMS.txt", ChecksumFormat::Traditional),
            info("latest-linux.yml", ChecksumFormat::Yaml),
            info("app-x86_64.AppImage.sha256", ChecksumFormat::Traditional),
            info("app-x86_64.AppImage.DIGEST", ChecksumFormat::Traditional),
        ];
        let ranked = prioritize(&candidates, TARGET);
        assert_eq!(ranked[0].filename, "app-x86_64.AppImage.DIGEST");
        assert_eq!(ranked[1].filename, "app-x86_64.AppImage.sha256");
        assert_eq!(ranked[2].filename, "latest-linux.yml");
        assert_eq!(ranked[3].filename, "SHA256SUMS.txt");
    }

    #[test]
    fn test_digest_match_case_insensitive() {
        let candidates = vec![
            info("SHA256SUMS", ChecksumFormat::Traditional),
            info("APP-X86_64.APPIMAGE.digest", ChecksumFormat::Traditional),
        ];
        let ranked = prioritize(&candidates, TARGET);
        assert_eq!(ranked[0].filename, "APP-X86_64.APPIMAGE.digest");
    }

    #[test]
    fn test_experimental_demoted_within_tier() {
        let candidates = vec![
            info("experimental-checksums.txt", ChecksumFormat::Traditional),
            info("SHA256SUMS.txt", ChecksumFormat::Traditional),
        ];
        let ranked = prioritize(&candidates, TARGET);
        assert_eq!(ranked[0].filename, "SHA256SUMS.txt");
        assert_eq!(ranked[1].filename, "experimental-checksums.txt");
    }

    #[test]
    fn test_experimental_demotion_stays_within_tier() {
        // An experimental YAML manifest still outranks a generic list.
        let candidates = vec![
            info("SHA256SUMS.txt", ChecksumFormat::Traditional),
            info("latest-experimental.yml", ChecksumFormat::Yaml),
        ];
        let ranked = prioritize(&candidates, TARGET);
        assert_eq!(ranked[0].filename, "latest-experimental.yml");
        assert_eq!(ranked[1].filename, "SHA256SUMS.txt");
    }

    #[test]
    fn test_stable_within_tier() {
        let candidates = vec![
            info("checksums-a.txt", ChecksumFormat::Traditional),
            info("checksums-b.txt", ChecksumFormat::Traditional),
        ];
        let ranked = prioritize(&candidates, TARGET);
        assert_eq!(ranked[0].filename, "checksums-a.txt");
        assert_eq!(ranked[1].filename, "checksums-b.txt");
    }
}
