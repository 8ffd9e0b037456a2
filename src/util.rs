use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

pub fn now_utc_string() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn utc_compact_string(ts: DateTime<Utc>) -> String {
    ts.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Directory naming convention for a language family: `Sino-Tibetan` -> `sinotibetan`.
pub fn family_to_path(family: &str) -> String {
    family.replace('-', "").to_lowercase()
}

/// Displays `path` relative to `base`, falling back to the full path outside of it.
pub fn relative_display(path: &Path, base: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .display()
        .to_string()
}

pub fn ensure_directory(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .with_context(|| format!("failed to create directory: {}", path.display()))
}

pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path)
        .with_context(|| format!("failed to open file for hashing: {}", path.display()))?;

    let mut hasher = Sha256::new();
    let mut buf = [0_u8; 8192];

    loop {
        let count = file
            .read(&mut buf)
            .with_context(|| format!("failed to read file for hashing: {}", path.display()))?;
        if count == 0 {
            break;
        }
        hasher.update(&buf[..count]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

pub fn write_json_pretty<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_directory(parent)?;
    }

    let data = serde_json::to_vec_pretty(value)
        .with_context(|| format!("failed to serialize json: {}", path.display()))?;

    let mut file = File::create(path)
        .with_context(|| format!("failed to create json file: {}", path.display()))?;
    file.write_all(&data)
        .with_context(|| format!("failed to write json file: {}", path.display()))?;
    file.write_all(b"\n")
        .with_context(|| format!("failed to finalize json file: {}", path.display()))?;

    Ok(())
}

pub fn write_text(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_directory(parent)?;
    }

    fs::write(path, contents)
        .with_context(|| format!("failed to write file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{family_to_path, relative_display};

    #[test]
    fn family_to_path_strips_hyphens_and_lowercases() {
        assert_eq!(family_to_path("Sino-Tibetan"), "sinotibetan");
        assert_eq!(family_to_path("Indo-European"), "indoeuropean");
        assert_eq!(family_to_path("Bantu"), "bantu");
    }

    #[test]
    fn relative_display_strips_base_or_keeps_full_path() {
        let base = Path::new("/data/runs");
        assert_eq!(
            relative_display(Path::new("/data/runs/bantu/bantu-1"), base),
            "bantu/bantu-1"
        );
        assert_eq!(
            relative_display(Path::new("/elsewhere/bantu-1"), base),
            "/elsewhere/bantu-1"
        );
    }
}
