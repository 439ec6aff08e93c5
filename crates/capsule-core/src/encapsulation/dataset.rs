use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Coarse file classification used for applicability checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    Pdf,
    Png,
    Jpeg,
    Text,
    Xml,
    Other,
}

impl DatasetKind {
    pub const ALL: [DatasetKind; 6] = [
        DatasetKind::Pdf,
        DatasetKind::Png,
        DatasetKind::Jpeg,
        DatasetKind::Text,
        DatasetKind::Xml,
        DatasetKind::Other,
    ];

    pub fn from_extension(extension: &str) -> Self {
        match extension.trim().to_ascii_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "png" => Self::Png,
            "jpg" | "jpeg" => Self::Jpeg,
            "txt" | "text" | "md" | "csv" => Self::Text,
            "xml" => Self::Xml,
            _ => Self::Other,
        }
    }

    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|extension| extension.to_str())
            .map(Self::from_extension)
            .unwrap_or(Self::Other)
    }

    pub fn label(&self) -> &'static str {
        match self {
            DatasetKind::Pdf => "pdf",
            DatasetKind::Png => "png",
            DatasetKind::Jpeg => "jpeg",
            DatasetKind::Text => "text",
            DatasetKind::Xml => "xml",
            DatasetKind::Other => "other",
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Carrier file plus the payloads to be packaged with it.
///
/// The kind is taken from the carrier, which is what an algorithm has to be
/// able to process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    pub carrier: PathBuf,
    pub payloads: Vec<PathBuf>,
    pub kind: DatasetKind,
}

impl Dataset {
    pub fn new(carrier: impl Into<PathBuf>, payloads: Vec<PathBuf>) -> Self {
        let carrier = carrier.into();
        let kind = DatasetKind::from_path(&carrier);
        Self {
            carrier,
            payloads,
            kind,
        }
    }

    pub fn with_kind(mut self, kind: DatasetKind) -> Self {
        self.kind = kind;
        self
    }

    /// File stem used to name produced artifacts.
    pub fn stem(&self) -> String {
        self.carrier
            .file_stem()
            .and_then(|stem| stem.to_str())
            .filter(|stem| !stem.is_empty())
            .unwrap_or("dataset")
            .to_string()
    }
}
