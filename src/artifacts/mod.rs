//! Startup artifacts: the team list, the city list and the trained classifier.
//!
//! The three files are read once per process. [`ArtifactCache`] hands out the
//! same [`ArtifactStore`] to every caller after the first successful load;
//! concurrent first callers wait on a single load instead of racing.

pub mod classifier;

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{info, warn};

pub use classifier::{InferenceError, LogisticPipeline, LogisticSpec, WinClassifier};

pub const TEAM_FILE: &str = "team.json";
pub const CITY_FILE: &str = "city.json";
pub const MODEL_FILE: &str = "model.json";

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("required artifact file(s) missing from {}: {}", .dir.display(), .missing.join(", "))]
    Missing { dir: PathBuf, missing: Vec<String> },
    #[error("could not read {file}: {source}")]
    Io {
        file: String,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse {file}: {source}")]
    Parse {
        file: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{file} is unusable: {reason}")]
    Corrupt { file: String, reason: String },
}

impl ArtifactError {
    /// File names this error is about, for the startup message.
    pub fn files(&self) -> Vec<String> {
        match self {
            ArtifactError::Missing { missing, .. } => missing.clone(),
            ArtifactError::Io { file, .. }
            | ArtifactError::Parse { file, .. }
            | ArtifactError::Corrupt { file, .. } => vec![file.clone()],
        }
    }
}

/// Known team and city names, sorted for display.
#[derive(Debug, Clone)]
pub struct Catalog {
    teams: BTreeSet<String>,
    cities: BTreeSet<String>,
}

impl Catalog {
    pub fn new(teams: Vec<String>, cities: Vec<String>) -> Self {
        Catalog {
            teams: teams.into_iter().collect(),
            cities: cities.into_iter().collect(),
        }
    }

    pub fn has_team(&self, name: &str) -> bool {
        self.teams.contains(name)
    }

    pub fn has_city(&self, name: &str) -> bool {
        self.cities.contains(name)
    }

    pub fn teams(&self) -> impl Iterator<Item = &str> {
        self.teams.iter().map(String::as_str)
    }

    pub fn cities(&self) -> impl Iterator<Item = &str> {
        self.cities.iter().map(String::as_str)
    }

    pub fn team_count(&self) -> usize {
        self.teams.len()
    }

    pub fn city_count(&self) -> usize {
        self.cities.len()
    }
}

/// Everything loaded at startup. Immutable once built.
#[derive(Clone)]
pub struct ArtifactStore {
    catalog: Catalog,
    classifier: Arc<dyn WinClassifier>,
}

impl fmt::Debug for ArtifactStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtifactStore")
            .field("catalog", &self.catalog)
            .field("classifier", &self.classifier.name())
            .finish()
    }
}

impl ArtifactStore {
    pub fn new(catalog: Catalog, classifier: Arc<dyn WinClassifier>) -> Self {
        ArtifactStore {
            catalog,
            classifier,
        }
    }

    /// Read `team.json`, `city.json` and `model.json` from `dir`.
    ///
    /// Presence of all three is checked before anything is parsed so that the
    /// error names every missing file at once.
    pub fn load(dir: &Path) -> Result<Self, ArtifactError> {
        let mut missing = Vec::new();
        for file in [TEAM_FILE, CITY_FILE, MODEL_FILE] {
            let present = dir.join(file).is_file();
            info!("Artifact {}: {}", file, if present { "found" } else { "missing" });
            if !present {
                missing.push(file.to_string());
            }
        }
        if !missing.is_empty() {
            return Err(ArtifactError::Missing {
                dir: dir.to_path_buf(),
                missing,
            });
        }

        let teams: Vec<String> = read_json(dir, TEAM_FILE)?;
        let cities: Vec<String> = read_json(dir, CITY_FILE)?;
        let spec: LogisticSpec = read_json(dir, MODEL_FILE)?;

        let catalog = Catalog::new(teams, cities);
        if catalog.team_count() < 2 {
            return Err(ArtifactError::Corrupt {
                file: TEAM_FILE.to_string(),
                reason: format!("need at least two teams, found {}", catalog.team_count()),
            });
        }
        if catalog.city_count() == 0 {
            return Err(ArtifactError::Corrupt {
                file: CITY_FILE.to_string(),
                reason: "no cities listed".to_string(),
            });
        }

        let model = LogisticPipeline::from_spec(spec).map_err(|e| ArtifactError::Corrupt {
            file: MODEL_FILE.to_string(),
            reason: e.to_string(),
        })?;
        info!(
            "Loaded {} teams, {} cities and classifier {} ({})",
            catalog.team_count(),
            catalog.city_count(),
            model.name(),
            model.version()
        );

        Ok(ArtifactStore::new(catalog, Arc::new(model)))
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn classifier(&self) -> &dyn WinClassifier {
        self.classifier.as_ref()
    }
}

fn read_json<T: serde::de::DeserializeOwned>(dir: &Path, file: &str) -> Result<T, ArtifactError> {
    let bytes = std::fs::read(dir.join(file)).map_err(|source| ArtifactError::Io {
        file: file.to_string(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| ArtifactError::Parse {
        file: file.to_string(),
        source,
    })
}

/// Process-scoped, load-once holder for the [`ArtifactStore`].
///
/// A failed load is not cached; the next caller tries again.
#[derive(Clone)]
pub struct ArtifactCache {
    dir: PathBuf,
    cell: Arc<OnceCell<Arc<ArtifactStore>>>,
}

impl ArtifactCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        ArtifactCache {
            dir: dir.into(),
            cell: Arc::new(OnceCell::new()),
        }
    }

    /// Return the cached store, loading it on first use.
    pub async fn get(&self) -> Result<Arc<ArtifactStore>, ArtifactError> {
        let store = self
            .cell
            .get_or_try_init(|| async {
                let dir = self.dir.clone();
                let loaded = tokio::task::spawn_blocking(move || ArtifactStore::load(&dir))
                    .await
                    .map_err(|e| ArtifactError::Io {
                        file: self.dir.display().to_string(),
                        source: std::io::Error::new(std::io::ErrorKind::Other, e),
                    })?;
                if let Err(e) = &loaded {
                    warn!("Artifact load failed: {}", e);
                }
                loaded.map(Arc::new)
            })
            .await?;
        Ok(store.clone())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
