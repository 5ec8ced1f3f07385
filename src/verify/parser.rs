// Checksum file parsers: traditional, BSD-style, and electron-builder YAML

use crate::release::ChecksumFormat;
use crate::verify::{HashAlgorithm, VerifyError};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use std::collections::BTreeMap;

/// All `(filename -> hex hash)` pairs extracted from one checksum file,
/// under a single normalized algorithm.
#[derive(Debug, Clone)]
pub struct ParsedChecksumFile {
    pub algorithm: HashAlgorithm,
    pub hashes: BTreeMap<String, String>,
}

/// Check that a token looks like a hex digest (md5 through sha512 lengths).
fn is_hex_hash(token: &str) -> bool {
    matches!(token.len(), 32 | 40 | 64 | 128) && token.chars().all(|c| c.is_ascii_hexdigit())
}

/// Decode a standard-alphabet, padded base64 hash into lowercase hex.
///
/// Malformed base64 is a data error, not a graceful miss: it means the
/// manifest is corrupt or in an unexpected shape.
pub fn base64_to_hex(value: &str) -> Result<String, VerifyError> {
    let bytes = BASE64
        .decode(value.trim())
        .map_err(|_| VerifyError::InvalidBase64(value.to_string()))?;
    Ok(hex::encode(bytes))
}

/// Find the hash for `target` in traditional `<hash>  <filename>` content.
///
/// Both single- and double-space separators are accepted, along with the
/// `*filename` binary marker. Malformed lines are skipped. First match wins.
pub fn parse_traditional(content: &str, target: &str) -> Option<String> {
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((hash, rest)) = line.split_once(char::is_whitespace) else {
            continue;
        };
        if !is_hex_hash(hash) {
            continue;
        }
        let name = rest.trim().trim_start_matches('*');
        if name == target {
            return Some(hash.to_lowercase());
        }
    }
    None
}

/// Parse one BSD-style line: `<ALGO> (<filename>) = <hex>`.
fn parse_bsd_line(line: &str) -> Option<(&str, &str, &str)> {
    let (algo, rest) = line.split_once('(')?;
    let (name, rest) = rest.rsplit_once(')')?;
    let hash = rest.trim().strip_prefix('=')?.trim();
    let algo = algo.trim();
    if algo.is_empty() || !is_hex_hash(hash) {
        return None;
    }
    Some((algo, name, hash))
}

/// Find the hash for `target` in BSD-style content.
///
/// The line's algorithm name must case-insensitively match the requested
/// algorithm; the filename must equal the target exactly.
pub fn parse_bsd(content: &str, target: &str, algorithm: HashAlgorithm) -> Option<String> {
    for line in content.lines() {
        let Some((algo, name, hash)) = parse_bsd_line(line.trim()) else {
            continue;
        };
        if HashAlgorithm::parse_name(algo) != Some(algorithm) {
            continue;
        }
        if name == target {
            return Some(hash.to_lowercase());
        }
    }
    None
}

/// YAML hash keys recognized in electron-builder manifests, in lookup order.
const YAML_HASH_KEYS: &[&str] = &["sha512", "sha256", "sha1"];

fn yaml_str(value: &serde_yaml::Value) -> Option<&str> {
    value.as_str()
}

/// Whether a YAML `path`/`url` field refers to the target filename.
fn yaml_name_matches(value: &serde_yaml::Value, target: &str) -> bool {
    let Some(name) = yaml_str(value) else {
        return false;
    };
    name == target || name.rsplit('/').next() == Some(target)
}

/// Extract the base64 hash and its key name from one YAML mapping node.
fn yaml_entry_hash(map: &serde_yaml::Mapping) -> Option<(&str, &str)> {
    for key in YAML_HASH_KEYS {
        if let Some(value) = map.get(*key)
            && let Some(hash) = yaml_str(value)
        {
            return Some((hash, key));
        }
    }
    None
}

/// Collect `(filename, base64 hash, key name)` triples from a YAML manifest.
///
/// Handles the three electron-builder shapes: a top-level hash key paired
/// with `path`/`url`, a `files` sequence of per-file entries, and a `files`
/// mapping keyed by filename. Unparseable YAML yields no entries.
fn yaml_entries(content: &str) -> Vec<(String, String, String)> {
    let Ok(doc) = serde_yaml::from_str::<serde_yaml::Value>(content) else {
        return Vec::new();
    };
    let Some(map) = doc.as_mapping() else {
        return Vec::new();
    };

    let mut entries = Vec::new();

    // Top-level hash paired with a path or url field.
    if let Some((hash, key)) = yaml_entry_hash(map) {
        for name_key in ["path", "url"] {
            if let Some(name) = map.get(name_key).and_then(yaml_str) {
                let base = name.rsplit('/').next().unwrap_or(name);
                entries.push((base.to_string(), hash.to_string(), key.to_string()));
                break;
            }
        }
    }

    match map.get("files") {
        // files as a sequence of { path/url, <algo> } entries
        Some(serde_yaml::Value::Sequence(seq)) => {
            for item in seq {
                let Some(item_map) = item.as_mapping() else {
                    continue;
                };
                let Some((hash, key)) = yaml_entry_hash(item_map) else {
                    continue;
                };
                for name_key in ["path", "url"] {
                    if let Some(name) = item_map.get(name_key).and_then(yaml_str) {
                        let base = name.rsplit('/').next().unwrap_or(name);
                        entries.push((base.to_string(), hash.to_string(), key.to_string()));
                        break;
                    }
                }
            }
        }
        // files as a mapping keyed by filename
        Some(serde_yaml::Value::Mapping(files)) => {
            for (name, value) in files {
                let Some(name) = yaml_str(name) else {
                    continue;
                };
                match value {
                    serde_yaml::Value::String(hash) => {
                        entries.push((name.to_string(), hash.clone(), "sha512".to_string()));
                    }
                    serde_yaml::Value::Mapping(item_map) => {
                        if let Some((hash, key)) = yaml_entry_hash(item_map) {
                            entries.push((name.to_string(), hash.to_string(), key.to_string()));
                        }
                    }
                    _ => {}
                }
            }
        }
        _ => {}
    }

    entries
}

/// Find the hash for `target` in a YAML manifest, decoded to hex.
pub fn parse_yaml(content: &str, target: &str) -> Result<Option<String>, VerifyError> {
    for (name, hash, _key) in yaml_entries(content) {
        if name == target {
            return Ok(Some(base64_to_hex(&hash)?));
        }
    }

    // The top-level shape may name the target only via path/url without
    // repeating it in entries; fall back to a direct match on those fields.
    if let Ok(doc) = serde_yaml::from_str::<serde_yaml::Value>(content)
        && let Some(map) = doc.as_mapping()
        && ["path", "url"]
            .iter()
            .filter_map(|k| map.get(*k))
            .any(|v| yaml_name_matches(v, target))
        && let Some((hash, _)) = yaml_entry_hash(map)
    {
        return Ok(Some(base64_to_hex(hash)?));
    }

    Ok(None)
}

/// Guess the content format when the asset name alone was inconclusive.
pub fn detect_format(content: &str) -> ChecksumFormat {
    if let Ok(serde_yaml::Value::Mapping(map)) = serde_yaml::from_str(content)
        && (yaml_entry_hash(&map).is_some() || map.contains_key("files"))
    {
        return ChecksumFormat::Yaml;
    }
    ChecksumFormat::Traditional
}

/// Find the hash for `target` in content of a known format.
pub fn find_hash(
    content: &str,
    target: &str,
    algorithm: HashAlgorithm,
    format: ChecksumFormat,
) -> Result<Option<String>, VerifyError> {
    match format {
        ChecksumFormat::Yaml => parse_yaml(content, target),
        ChecksumFormat::Traditional => {
            Ok(parse_traditional(content, target).or_else(|| parse_bsd(content, target, algorithm)))
        }
    }
}

/// Extract every `(filename -> hash)` pair from one checksum file.
///
/// Used to populate the release cache after a successful verification.
/// The first entry for a filename wins; later duplicates are ignored.
/// The algorithm is taken from BSD lines or YAML key names when present,
/// inferred from digest length otherwise, and coerced to SHA-256 when the
/// file names something unsupported.
pub fn parse_all(
    content: &str,
    format: ChecksumFormat,
    default_algorithm: HashAlgorithm,
) -> Result<ParsedChecksumFile, VerifyError> {
    let mut hashes: BTreeMap<String, String> = BTreeMap::new();
    let mut algorithm: Option<HashAlgorithm> = None;

    match format {
        ChecksumFormat::Yaml => {
            for (name, hash, key) in yaml_entries(content) {
                let hex = base64_to_hex(&hash)?;
                if algorithm.is_none() {
                    algorithm = HashAlgorithm::parse_name(&key);
                }
                hashes.entry(name).or_insert(hex);
            }
            // Unrecognized key names (e.g. sha1) coerce to SHA-256.
            if !hashes.is_empty() && algorithm.is_none() {
                algorithm = Some(HashAlgorithm::Sha256);
            }
        }
        ChecksumFormat::Traditional => {
            for line in content.lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                if let Some((algo, name, hash)) = parse_bsd_line(line) {
                    if algorithm.is_none() {
                        algorithm = HashAlgorithm::parse_name(algo);
                    }
                    hashes
                        .entry(name.to_string())
                        .or_insert_with(|| hash.to_lowercase());
                    continue;
                }
                let Some((hash, rest)) = line.split_once(char::is_whitespace) else {
                    continue;
                };
                if !is_hex_hash(hash) {
                    continue;
                }
                if algorithm.is_none() && hash.len() == HashAlgorithm::Sha512.hex_len() {
                    algorithm = Some(HashAlgorithm::Sha512);
                }
                let name = rest.trim().trim_start_matches('*');
                hashes
                    .entry(name.to_string())
                    .or_insert_with(|| hash.to_lowercase());
            }
        }
    }

    Ok(ParsedChecksumFile {
        algorithm: algorithm.unwrap_or(default_algorithm),
        hashes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHA256_A: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";
    const SHA256_B: &str = "486ea46224d1bb4fb680f34f7c9ad96a8f24ec88be73ea8e5a6c65260e9cb8a7";

    #[test]
    fn test_parse_traditional_two_space() {
        let content = format!("{}  app-1.0-x86_64.AppImage\n", SHA256_A);
        assert_eq!(
            parse_traditional(&content, "app-1.0-x86_64.AppImage"),
            Some(SHA256_A.to_string())
        );
    }

    #[test]
    fn test_parse_traditional_single_space_and_marker() {
        let content = format!("{} *app.AppImage\n", SHA256_A);
        assert_eq!(parse_traditional(&content, "app.AppImage"), Some(SHA256_A.to_string()));
    }

    #[test]
    fn test_parse_traditional_wrong_target() {
        let content = format!("{}  app.AppImage\n", SHA256_A);
        assert_eq!(parse_traditional(&content, "other.AppImage"), None);
    }

    #[test]
    fn test_parse_traditional_first_match_wins() {
        let content = format!("{}  app.AppImage\n{}  app.AppImage\n", SHA256_A, SHA256_B);
        assert_eq!(parse_traditional(&content, "app.AppImage"), Some(SHA256_A.to_string()));
    }

    #[test]
    fn test_parse_traditional_skips_malformed() {
        let content = format!("not-a-hash  app.AppImage\ngarbage\n{}  app.AppImage\n", SHA256_A);
        assert_eq!(parse_traditional(&content, "app.AppImage"), Some(SHA256_A.to_string()));
    }

    #[test]
    fn test_parse_bsd() {
        let content = format!("SHA256 (app.AppImage) = {}\n", SHA256_A);
        assert_eq!(
            parse_bsd(&content, "app.AppImage", HashAlgorithm::Sha256),
            Some(SHA256_A.to_string())
        );
    }

    #[test]
    fn test_parse_bsd_algorithm_mismatch() {
        let content = format!("SHA256 (app.AppImage) = {}\n", SHA256_A);
        assert_eq!(parse_bsd(&content, "app.AppImage", HashAlgorithm::Sha512), None);
    }

    #[test]
    fn test_parse_bsd_case_insensitive_algo() {
        let content = format!("sha-256 (app.AppImage) = {}\n", SHA256_A);
        assert_eq!(
            parse_bsd(&content, "app.AppImage", HashAlgorithm::Sha256),
            Some(SHA256_A.to_string())
        );
    }

    #[test]
    fn test_base64_round_trip() {
        let bytes = hex::decode(SHA256_A).unwrap();
        let b64 = BASE64.encode(&bytes);
        assert_eq!(base64_to_hex(&b64).unwrap(), SHA256_A);
    }

    #[test]
    fn test_base64_invalid() {
        let err = base64_to_hex("!!!not base64!!!").unwrap_err();
        assert!(err.to_string().contains("Invalid base64 hash"));
    }

    #[test]
    fn test_parse_yaml_top_level() {
        let bytes = hex::decode(SHA256_A).unwrap();
        let b64 = BASE64.encode(&bytes);
        let content = format!("version: 1.0.0\npath: app.AppImage\nsha512: {}\n", b64);
        assert_eq!(
            parse_yaml(&content, "app.AppImage").unwrap(),
            Some(SHA256_A.to_string())
        );
    }

    #[test]
    fn test_parse_yaml_files_sequence() {
        let bytes = hex::decode(SHA256_A).unwrap();
        let b64 = BASE64.encode(&bytes);
        let content = format!(
            "files:\n  - url: app.AppImage\n    sha512: {}\n  - url: other.AppImage\n    sha512: {}\n",
            b64,
            BASE64.encode(hex::decode(SHA256_B).unwrap())
        );
        assert_eq!(
            parse_yaml(&content, "app.AppImage").unwrap(),
            Some(SHA256_A.to_string())
        );
        assert_eq!(
            parse_yaml(&content, "other.AppImage").unwrap(),
            Some(SHA256_B.to_string())
        );
    }

    #[test]
    fn test_parse_yaml_files_mapping() {
        let bytes = hex::decode(SHA256_A).unwrap();
        let b64 = BASE64.encode(&bytes);
        let content = format!("files:\n  app.AppImage:\n    sha512: {}\n", b64);
        assert_eq!(
            parse_yaml(&content, "app.AppImage").unwrap(),
            Some(SHA256_A.to_string())
        );
    }

    #[test]
    fn test_parse_yaml_invalid_base64_is_error() {
        let content = "path: app.AppImage\nsha512: '!!!'\n";
        assert!(parse_yaml(content, "app.AppImage").is_err());
    }

    #[test]
    fn test_parse_yaml_absent_target() {
        let bytes = hex::decode(SHA256_A).unwrap();
        let content = format!("path: app.AppImage\nsha512: {}\n", BASE64.encode(&bytes));
        assert_eq!(parse_yaml(&content, "missing.AppImage").unwrap(), None);
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(
            detect_format("version: 1.0\npath: a\nsha512: aGVsbG8="),
            ChecksumFormat::Yaml
        );
        assert_eq!(
            detect_format(&format!("{}  app.AppImage", SHA256_A)),
            ChecksumFormat::Traditional
        );
    }

    #[test]
    fn test_parse_all_traditional() {
        let content = format!("{}  a.AppImage\n{}  b.AppImage\n", SHA256_A, SHA256_B);
        let parsed = parse_all(&content, ChecksumFormat::Traditional, HashAlgorithm::Sha256).unwrap();
        assert_eq!(parsed.algorithm, HashAlgorithm::Sha256);
        assert_eq!(parsed.hashes.len(), 2);
        assert_eq!(parsed.hashes["a.AppImage"], SHA256_A);
    }

    #[test]
    fn test_parse_all_infers_sha512_from_length() {
        let sha512 = "a".repeat(128);
        let content = format!("{}  a.AppImage\n", sha512);
        let parsed = parse_all(&content, ChecksumFormat::Traditional, HashAlgorithm::Sha256).unwrap();
        assert_eq!(parsed.algorithm, HashAlgorithm::Sha512);
    }

    #[test]
    fn test_parse_all_yaml_coerces_unknown_algo() {
        let bytes = hex::decode(SHA256_A).unwrap();
        let content = format!("path: app.AppImage\nsha1: {}\n", BASE64.encode(&bytes));
        let parsed = parse_all(&content, ChecksumFormat::Yaml, HashAlgorithm::Sha512).unwrap();
        assert_eq!(parsed.algorithm, HashAlgorithm::Sha256);
        assert_eq!(parsed.hashes["app.AppImage"], SHA256_A);
    }
}
