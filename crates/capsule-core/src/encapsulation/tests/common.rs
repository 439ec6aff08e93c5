use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use tempfile::TempDir;

use crate::decision::CriterionId;
use crate::encapsulation::{Dataset, DatasetKind, EncapsulationAlgorithm, PackagingError};

pub(super) struct Workspace {
    pub(super) root: TempDir,
}

impl Workspace {
    pub(super) fn new() -> Self {
        Self {
            root: tempfile::tempdir().expect("temp dir"),
        }
    }

    pub(super) fn file(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.root.path().join("input").join(name);
        fs::create_dir_all(path.parent().expect("parent")).expect("input dir");
        fs::write(&path, contents).expect("write input");
        path
    }

    pub(super) fn output(&self) -> PathBuf {
        self.root.path().join("artifacts")
    }

    pub(super) fn restore(&self) -> PathBuf {
        self.root.path().join("restored")
    }

    pub(super) fn pdf_dataset(&self) -> Dataset {
        let carrier = self.file("report.pdf", b"%PDF-1.7\n1 0 obj\n<<>>\nendobj\n%%EOF\n");
        let payload = self.file("provenance.xml", b"<provenance agent=\"ingest\"/>");
        Dataset::new(carrier, vec![payload])
    }

    pub(super) fn text_dataset(&self) -> Dataset {
        let carrier = self.file("notes.txt", b"field notes");
        let payload = self.file("checksums.md5", b"d41d8cd98f00b204e9800998ecf8427e  notes.txt");
        Dataset::new(carrier, vec![payload])
    }
}

pub(super) fn entries(dir: &Path) -> Vec<String> {
    match fs::read_dir(dir) {
        Ok(read) => {
            let mut names: Vec<String> = read
                .map(|entry| entry.expect("dir entry").file_name().to_string_lossy().into_owned())
                .collect();
            names.sort();
            names
        }
        Err(_) => Vec::new(),
    }
}

/// Counts invocations and writes a partial file before failing.
#[derive(Debug, Default)]
pub(super) struct BrokenAlgorithm {
    pub(super) calls: AtomicUsize,
}

impl BrokenAlgorithm {
    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl EncapsulationAlgorithm for BrokenAlgorithm {
    fn id(&self) -> &str {
        "broken"
    }

    fn name(&self) -> &str {
        "Broken"
    }

    fn supported_kinds(&self) -> &[DatasetKind] {
        &[DatasetKind::Pdf]
    }

    fn suitability(&self, _criterion: &CriterionId) -> u8 {
        100
    }

    fn encapsulate(&self, dataset: &Dataset, staging: &Path) -> Result<PathBuf, PackagingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let partial = staging.join(format!("{}.partial", dataset.stem()));
        fs::write(&partial, b"half written").map_err(PackagingError::io(&partial))?;
        Err(PackagingError::MalformedArtifact("carrier truncated".to_string()))
    }

    fn decapsulate(
        &self,
        _artifact: &Path,
        _restore_dir: &Path,
    ) -> Result<Vec<PathBuf>, PackagingError> {
        Err(PackagingError::MalformedArtifact("not supported".to_string()))
    }
}
