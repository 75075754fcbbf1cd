//! Resolution of case identifiers to runnable cases

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::common::{Error, Result};

use super::case::TestCase;
use super::config::TestScenario;
use super::runner::ScenarioCase;

/// Maps a case identifier to a freshly constructed case
///
/// Loading only constructs the case; starting it is the scheduler's job.
pub trait CaseLoader {
    fn load(&self, id: &str) -> Result<Box<dyn TestCase>>;
}

/// Loads `case_<id>.yaml` (or `.yml`) scenario files from a directory
#[derive(Debug, Clone)]
pub struct ScenarioLoader {
    dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Candidate file paths for an identifier, in lookup order
    pub fn candidates(&self, id: &str) -> Vec<PathBuf> {
        ["yaml", "yml"]
            .iter()
            .map(|ext| self.dir.join(format!("case_{}.{}", id, ext)))
            .collect()
    }

    /// Parse the scenario for an identifier without wrapping it in a case
    pub fn load_scenario(&self, id: &str) -> Result<TestScenario> {
        if id.is_empty() || id.contains(|c: char| c == '/' || c == '\\') || id.contains("..") {
            return Err(Error::invalid_case(id, "identifier must be a plain name"));
        }

        let candidates = self.candidates(id);
        let path = candidates
            .iter()
            .find(|p| p.is_file())
            .ok_or_else(|| {
                let searched: Vec<String> =
                    candidates.iter().map(|p| p.display().to_string()).collect();
                Error::case_not_found(id, &searched)
            })?;

        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| Error::invalid_case(id, e))
    }

    /// Identifiers of all scenario files in the directory, sorted
    pub fn available(&self) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let is_yaml = matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("yaml") | Some("yml")
            );
            if !is_yaml {
                continue;
            }
            if let Some(id) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .and_then(|s| s.strip_prefix("case_"))
            {
                ids.push(id.to_string());
            }
        }
        ids.sort();
        ids.dedup();
        Ok(ids)
    }
}

impl CaseLoader for ScenarioLoader {
    fn load(&self, id: &str) -> Result<Box<dyn TestCase>> {
        let scenario = self.load_scenario(id)?;
        tracing::debug!(id, name = %scenario.name, "Loaded scenario");
        Ok(Box::new(ScenarioCase::new(id, scenario)))
    }
}

type CaseFactory = Box<dyn Fn() -> Box<dyn TestCase> + Send + Sync>;

/// In-process cases registered by identifier
#[derive(Default)]
pub struct Registry {
    factories: BTreeMap<String, CaseFactory>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory; a later registration under the same id wins
    pub fn register<F, C>(&mut self, id: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> C + Send + Sync + 'static,
        C: TestCase + 'static,
    {
        let boxed: CaseFactory = Box::new(move || -> Box<dyn TestCase> { Box::new(factory()) });
        self.factories.insert(id.into(), boxed);
        self
    }

    /// Registered identifiers, sorted
    pub fn ids(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }
}

impl CaseLoader for Registry {
    fn load(&self, id: &str) -> Result<Box<dyn TestCase>> {
        self.factories
            .get(id)
            .map(|factory| factory())
            .ok_or_else(|| Error::case_not_found(id, &["registry"]))
    }
}
