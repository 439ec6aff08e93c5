//! Strategies bundled with the advisor.

mod bag;
mod trailer;

pub use bag::DirectoryBag;
pub use trailer::CarrierTrailer;

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use super::algorithm::PackagingError;

pub(crate) fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Digest of a file, or of a directory tree as sorted relative paths plus contents.
pub(crate) fn digest_path(path: &Path) -> Result<String, PackagingError> {
    let mut hasher = Sha256::new();
    if path.is_dir() {
        let mut files = Vec::new();
        collect_files(path, path, &mut files)?;
        files.sort();
        for relative in files {
            let bytes = fs::read(path.join(&relative)).map_err(PackagingError::io(&relative))?;
            hasher.update(relative.to_string_lossy().as_bytes());
            hasher.update([0u8]);
            hasher.update(&bytes);
        }
    } else {
        let bytes = fs::read(path).map_err(PackagingError::io(path))?;
        hasher.update(&bytes);
    }
    Ok(hex::encode(hasher.finalize()))
}

fn collect_files(root: &Path, dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), PackagingError> {
    for entry in fs::read_dir(dir).map_err(PackagingError::io(dir))? {
        let entry = entry.map_err(PackagingError::io(dir))?;
        let path = entry.path();
        if path.is_dir() {
            collect_files(root, &path, files)?;
        } else if let Ok(relative) = path.strip_prefix(root) {
            files.push(relative.to_path_buf());
        }
    }
    Ok(())
}

/// Plain file name of `path`, refusing anything that could escape a restore directory.
pub(crate) fn entry_name(path: &Path) -> Result<String, PackagingError> {
    path.file_name()
        .and_then(|name| name.to_str())
        .filter(|name| is_safe_name(name))
        .map(str::to_string)
        .ok_or_else(|| {
            PackagingError::MalformedArtifact(format!("unusable file name {}", path.display()))
        })
}

pub(crate) fn is_safe_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
}

/// Names of the carrier and payloads, rejecting collisions that would clobber each other on restore.
pub(crate) fn unique_entry_names(
    carrier: &Path,
    payloads: &[PathBuf],
) -> Result<(String, Vec<String>), PackagingError> {
    let carrier_name = entry_name(carrier)?;
    let mut seen = BTreeSet::from([carrier_name.clone()]);
    let mut names = Vec::with_capacity(payloads.len());
    for payload in payloads {
        let name = entry_name(payload)?;
        if !seen.insert(name.clone()) {
            return Err(PackagingError::DuplicateEntry(name));
        }
        names.push(name);
    }
    Ok((carrier_name, names))
}

/// Writes a restored file, never overwriting an existing one.
pub(crate) fn write_restored(
    restore_dir: &Path,
    name: &str,
    bytes: &[u8],
) -> Result<PathBuf, PackagingError> {
    if !is_safe_name(name) {
        return Err(PackagingError::MalformedArtifact(format!(
            "unusable entry name '{name}'"
        )));
    }
    let target = restore_dir.join(name);
    if target.exists() {
        return Err(PackagingError::AlreadyExists(target));
    }
    fs::write(&target, bytes).map_err(PackagingError::io(&target))?;
    Ok(target)
}
