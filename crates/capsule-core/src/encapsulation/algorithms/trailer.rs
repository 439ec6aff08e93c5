use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{sha256_hex, unique_entry_names, write_restored};
use crate::decision::catalogue::{
    CARRIER_AUTHENTICITY, CARRIER_PROCESSABILITY, CARRIER_RESTORABILITY, COMPRESSION,
    DETECTABILITY, PAYLOAD_AUTHENTICITY, PAYLOAD_RESTORABILITY, STANDARD_COMPLIANCE, VELOCITY,
    VISIBILITY,
};
use crate::decision::CriterionId;
use crate::encapsulation::algorithm::{EncapsulationAlgorithm, PackagingError};
use crate::encapsulation::dataset::{Dataset, DatasetKind};

const MARKER: &[u8] = b"\n%CAPSULE-TRAILER\n";
const FOOTER_MAGIC: &[u8; 8] = b"CAPSULE1";
const FOOTER_LEN: usize = 16;

#[derive(Debug, Serialize, Deserialize)]
struct TrailerIndex {
    carrier: TrailerEntry,
    payloads: Vec<TrailerEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TrailerEntry {
    name: String,
    length: u64,
    sha256: String,
}

/// Appends payloads behind the carrier's last byte.
///
/// Layout: `carrier | MARKER | index json | '\n' | payloads | magic | carrier length (u64 LE)`.
/// PDF and image readers stop at their own end markers, so the carrier stays
/// usable, but its bytes are no longer the original file.
#[derive(Debug, Clone)]
pub struct CarrierTrailer {
    kinds: Vec<DatasetKind>,
}

impl CarrierTrailer {
    pub const ID: &'static str = "carrier-trailer";

    pub fn new() -> Self {
        Self {
            kinds: vec![DatasetKind::Pdf, DatasetKind::Png, DatasetKind::Jpeg],
        }
    }
}

impl Default for CarrierTrailer {
    fn default() -> Self {
        Self::new()
    }
}

impl EncapsulationAlgorithm for CarrierTrailer {
    fn id(&self) -> &str {
        Self::ID
    }

    fn name(&self) -> &str {
        "Carrier trailer"
    }

    fn supported_kinds(&self) -> &[DatasetKind] {
        &self.kinds
    }

    fn suitability(&self, criterion: &CriterionId) -> u8 {
        match criterion.as_str() {
            CARRIER_PROCESSABILITY => 90,
            CARRIER_RESTORABILITY => 60,
            PAYLOAD_RESTORABILITY => 80,
            CARRIER_AUTHENTICITY => 30,
            PAYLOAD_AUTHENTICITY => 70,
            VISIBILITY => 20,
            DETECTABILITY => 60,
            STANDARD_COMPLIANCE => 20,
            COMPRESSION => 0,
            VELOCITY => 90,
            _ => 0,
        }
    }

    fn encapsulate(&self, dataset: &Dataset, staging: &Path) -> Result<PathBuf, PackagingError> {
        let (carrier_name, payload_names) = unique_entry_names(&dataset.carrier, &dataset.payloads)?;

        let carrier = fs::read(&dataset.carrier).map_err(PackagingError::io(&dataset.carrier))?;
        let mut payloads = Vec::with_capacity(dataset.payloads.len());
        for (path, name) in dataset.payloads.iter().zip(payload_names) {
            let bytes = fs::read(path).map_err(PackagingError::io(path))?;
            payloads.push((name, bytes));
        }

        let index = TrailerIndex {
            carrier: TrailerEntry {
                name: carrier_name,
                length: carrier.len() as u64,
                sha256: sha256_hex(&carrier),
            },
            payloads: payloads
                .iter()
                .map(|(name, bytes)| TrailerEntry {
                    name: name.clone(),
                    length: bytes.len() as u64,
                    sha256: sha256_hex(bytes),
                })
                .collect(),
        };
        let index_json = serde_json::to_vec(&index)
            .map_err(|err| PackagingError::MalformedArtifact(err.to_string()))?;

        let mut output = carrier;
        let carrier_length = index.carrier.length;
        output.extend_from_slice(MARKER);
        output.extend_from_slice(&index_json);
        output.push(b'\n');
        for (_, bytes) in &payloads {
            output.extend_from_slice(bytes);
        }
        output.extend_from_slice(FOOTER_MAGIC);
        output.extend_from_slice(&carrier_length.to_le_bytes());

        let extension = dataset
            .carrier
            .extension()
            .and_then(|extension| extension.to_str())
            .unwrap_or("bin");
        let target = staging.join(format!("{}.capsule.{}", dataset.stem(), extension));
        fs::write(&target, &output).map_err(PackagingError::io(&target))?;
        Ok(target)
    }

    fn decapsulate(
        &self,
        artifact: &Path,
        restore_dir: &Path,
    ) -> Result<Vec<PathBuf>, PackagingError> {
        let bytes = fs::read(artifact).map_err(PackagingError::io(artifact))?;
        let (carrier, index, mut body) = split_trailer(&bytes)?;

        if sha256_hex(carrier) != index.carrier.sha256 {
            return Err(PackagingError::ChecksumMismatch(index.carrier.name));
        }

        // Verify every entry before writing anything out.
        let mut verified = vec![(index.carrier.name.as_str(), carrier)];
        for entry in &index.payloads {
            let length = usize::try_from(entry.length)
                .map_err(|_| malformed("payload length exceeds address space"))?;
            if body.len() < length {
                return Err(malformed("payload section shorter than index"));
            }
            let (payload, rest) = body.split_at(length);
            if sha256_hex(payload) != entry.sha256 {
                return Err(PackagingError::ChecksumMismatch(entry.name.clone()));
            }
            verified.push((entry.name.as_str(), payload));
            body = rest;
        }

        if !body.is_empty() {
            return Err(malformed("trailing bytes after last payload"));
        }
        verified
            .into_iter()
            .map(|(name, bytes)| write_restored(restore_dir, name, bytes))
            .collect()
    }
}

/// Returns the carrier bytes, the parsed index, and the payload section.
fn split_trailer(bytes: &[u8]) -> Result<(&[u8], TrailerIndex, &[u8]), PackagingError> {
    if bytes.len() < FOOTER_LEN {
        return Err(malformed("file too short for trailer footer"));
    }
    let (content, footer) = bytes.split_at(bytes.len() - FOOTER_LEN);
    if &footer[..8] != FOOTER_MAGIC {
        return Err(malformed("trailer footer not found"));
    }
    let mut length_bytes = [0u8; 8];
    length_bytes.copy_from_slice(&footer[8..]);
    let carrier_length = usize::try_from(u64::from_le_bytes(length_bytes))
        .map_err(|_| malformed("carrier length exceeds address space"))?;

    let index_start = carrier_length
        .checked_add(MARKER.len())
        .ok_or_else(|| malformed("carrier length exceeds address space"))?;
    if content.len() < index_start {
        return Err(malformed("carrier length points past the end of the file"));
    }
    let (carrier, rest) = content.split_at(carrier_length);
    let rest = rest
        .strip_prefix(MARKER)
        .ok_or_else(|| malformed("trailer marker missing"))?;

    let newline = rest
        .iter()
        .position(|byte| *byte == b'\n')
        .ok_or_else(|| malformed("trailer index is not terminated"))?;
    let index: TrailerIndex = serde_json::from_slice(&rest[..newline])
        .map_err(|err| PackagingError::MalformedArtifact(format!("trailer index: {err}")))?;

    Ok((carrier, index, &rest[newline + 1..]))
}

fn malformed(detail: &str) -> PackagingError {
    PackagingError::MalformedArtifact(detail.to_string())
}
