use crate::output::traits::{CorpusSink, FinalArtifacts, OutputError, OutputResult};
use chrono::Utc;
use std::path::PathBuf;

/// Copies the final artifacts into a timestamped directory
///
/// `final/archive/run_20240101_120000/SviClanci.txt`, and so on. Earlier
/// packages are left untouched.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    root: PathBuf,
}

impl DirectorySink {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

impl CorpusSink for DirectorySink {
    fn package(&self, artifacts: &FinalArtifacts<'_>) -> OutputResult<PathBuf> {
        let base = format!("run_{}", Utc::now().format("%Y%m%d_%H%M%S"));
        let mut target = self.root.join(&base);
        let mut suffix = 1;
        while target.exists() {
            suffix += 1;
            target = self.root.join(format!("{}_{}", base, suffix));
        }
        std::fs::create_dir_all(&target)?;

        for path in artifacts.paths() {
            let name = path.file_name().ok_or_else(|| {
                OutputError::Package(format!("{} has no file name", path.display()))
            })?;
            std::fs::copy(path, target.join(name))?;
        }

        tracing::info!("Packaged final artifacts into {}", target.display());
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_package_copies_all_artifacts() {
        let dir = tempdir().unwrap();
        let corpus = dir.path().join("SviClanci.txt");
        let json = dir.path().join("report.json");
        let md = dir.path().join("report.md");
        std::fs::write(&corpus, "<***>\n").unwrap();
        std::fs::write(&json, "{}").unwrap();
        std::fs::write(&md, "# Izvještaj\n").unwrap();

        let sink = DirectorySink::new(dir.path().join("archive"));
        let artifacts = FinalArtifacts {
            corpus: &corpus,
            report_json: &json,
            report_markdown: &md,
        };

        let first = sink.package(&artifacts).unwrap();
        assert_eq!(
            std::fs::read_to_string(first.join("SviClanci.txt")).unwrap(),
            "<***>\n"
        );
        assert!(first.join("report.json").exists());
        assert!(first.join("report.md").exists());

        let second = sink.package(&artifacts).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_missing_artifact_is_an_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.txt");
        let sink = DirectorySink::new(dir.path().join("archive"));
        let artifacts = FinalArtifacts {
            corpus: &missing,
            report_json: &missing,
            report_markdown: &missing,
        };
        assert!(matches!(sink.package(&artifacts), Err(OutputError::Io(_))));
    }
}
