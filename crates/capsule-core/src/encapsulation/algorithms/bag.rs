use std::fs;
use std::path::{Path, PathBuf};

use super::{is_safe_name, sha256_hex, unique_entry_names, write_restored};
use crate::decision::catalogue::{
    CARRIER_AUTHENTICITY, CARRIER_PROCESSABILITY, CARRIER_RESTORABILITY, COMPRESSION,
    DETECTABILITY, PAYLOAD_AUTHENTICITY, PAYLOAD_RESTORABILITY, STANDARD_COMPLIANCE, VELOCITY,
    VISIBILITY,
};
use crate::decision::CriterionId;
use crate::encapsulation::algorithm::{EncapsulationAlgorithm, PackagingError};
use crate::encapsulation::dataset::{Dataset, DatasetKind};

const DECLARATION: &str = "BagIt-Version: 0.97\nTag-File-Character-Encoding: UTF-8\n";
const DECLARATION_FILE: &str = "bagit.txt";
const MANIFEST_FILE: &str = "manifest-sha256.txt";
const CARRIER_DIR: &str = "data/carrier";
const PAYLOAD_DIR: &str = "data/payload";

/// Packages carrier and payloads side by side in a BagIt-style directory.
///
/// Nothing is altered, every file is checksummed in `manifest-sha256.txt`, and
/// any carrier kind is accepted.
#[derive(Debug, Clone)]
pub struct DirectoryBag {
    kinds: Vec<DatasetKind>,
}

impl DirectoryBag {
    pub const ID: &'static str = "directory-bag";

    pub fn new() -> Self {
        Self {
            kinds: DatasetKind::ALL.to_vec(),
        }
    }
}

impl Default for DirectoryBag {
    fn default() -> Self {
        Self::new()
    }
}

impl EncapsulationAlgorithm for DirectoryBag {
    fn id(&self) -> &str {
        Self::ID
    }

    fn name(&self) -> &str {
        "Directory bag"
    }

    fn supported_kinds(&self) -> &[DatasetKind] {
        &self.kinds
    }

    fn suitability(&self, criterion: &CriterionId) -> u8 {
        match criterion.as_str() {
            CARRIER_PROCESSABILITY => 70,
            CARRIER_RESTORABILITY => 100,
            PAYLOAD_RESTORABILITY => 100,
            CARRIER_AUTHENTICITY => 90,
            PAYLOAD_AUTHENTICITY => 90,
            VISIBILITY => 100,
            DETECTABILITY => 100,
            STANDARD_COMPLIANCE => 90,
            COMPRESSION => 0,
            VELOCITY => 60,
            _ => 0,
        }
    }

    fn encapsulate(&self, dataset: &Dataset, staging: &Path) -> Result<PathBuf, PackagingError> {
        let (carrier_name, payload_names) = unique_entry_names(&dataset.carrier, &dataset.payloads)?;

        let bag = staging.join(format!("{}.bag", dataset.stem()));
        let carrier_dir = bag.join(CARRIER_DIR);
        let payload_dir = bag.join(PAYLOAD_DIR);
        fs::create_dir_all(&carrier_dir).map_err(PackagingError::io(&carrier_dir))?;
        fs::create_dir_all(&payload_dir).map_err(PackagingError::io(&payload_dir))?;

        let mut manifest = String::new();
        let mut sources = vec![(dataset.carrier.as_path(), CARRIER_DIR, carrier_name)];
        sources.extend(
            dataset
                .payloads
                .iter()
                .zip(payload_names)
                .map(|(path, name)| (path.as_path(), PAYLOAD_DIR, name)),
        );

        for (source, section, name) in sources {
            let bytes = fs::read(source).map_err(PackagingError::io(source))?;
            let target = bag.join(section).join(&name);
            fs::write(&target, &bytes).map_err(PackagingError::io(&target))?;
            manifest.push_str(&format!("{}  {}/{}\n", sha256_hex(&bytes), section, name));
        }

        let declaration = bag.join(DECLARATION_FILE);
        fs::write(&declaration, DECLARATION).map_err(PackagingError::io(&declaration))?;
        let manifest_path = bag.join(MANIFEST_FILE);
        fs::write(&manifest_path, manifest).map_err(PackagingError::io(&manifest_path))?;

        Ok(bag)
    }

    fn decapsulate(
        &self,
        artifact: &Path,
        restore_dir: &Path,
    ) -> Result<Vec<PathBuf>, PackagingError> {
        let declaration = artifact.join(DECLARATION_FILE);
        if !declaration.is_file() {
            return Err(PackagingError::MalformedArtifact(format!(
                "{} has no {DECLARATION_FILE}",
                artifact.display()
            )));
        }

        let manifest_path = artifact.join(MANIFEST_FILE);
        let manifest =
            fs::read_to_string(&manifest_path).map_err(PackagingError::io(&manifest_path))?;

        // Verify the whole bag before writing anything out.
        let mut verified = Vec::new();
        for line in manifest.lines().filter(|line| !line.trim().is_empty()) {
            let (expected, relative) = parse_manifest_line(line)?;
            let source = artifact.join(relative);
            let bytes = fs::read(&source).map_err(PackagingError::io(&source))?;
            if sha256_hex(&bytes) != expected {
                return Err(PackagingError::ChecksumMismatch(relative.to_string()));
            }
            let name = relative
                .rsplit('/')
                .next()
                .unwrap_or(relative)
                .to_string();
            verified.push((name, bytes));
        }

        verified
            .iter()
            .map(|(name, bytes)| write_restored(restore_dir, name, bytes))
            .collect()
    }
}

fn parse_manifest_line(line: &str) -> Result<(&str, &str), PackagingError> {
    let (checksum, relative) = line
        .split_once("  ")
        .ok_or_else(|| PackagingError::MalformedArtifact(format!("manifest line '{line}'")))?;

    let mut parts = relative.splitn(3, '/');
    let within_data = matches!(
        (parts.next(), parts.next(), parts.next()),
        (Some("data"), Some("carrier" | "payload"), Some(name)) if is_safe_name(name)
    );
    if !within_data {
        return Err(PackagingError::MalformedArtifact(format!(
            "manifest entry outside the data directory: '{relative}'"
        )));
    }
    Ok((checksum, relative))
}
