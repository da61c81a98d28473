use crate::custody::TRANSITION_HORIZON_DAYS;
use crate::model::{Family, ParentRole};
use crate::storage::{FamilyStore, JsonStore, MemoryStore};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Nombre maximal d'éléments par lot de suppression.
pub const DEFAULT_BATCH_LIMIT: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Json,
    Memory,
}

impl std::str::FromStr for Backend {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Backend::Json),
            "memory" => Ok(Backend::Memory),
            other => Err(format!("unknown backend: {other}")),
        }
    }
}

/// Noms affichés quand un membre n'a pas renseigné le sien.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentNames {
    pub parent1: String,
    pub parent2: String,
}

impl Default for ParentNames {
    fn default() -> Self {
        Self {
            parent1: "Parent 1".to_string(),
            parent2: "Parent 2".to_string(),
        }
    }
}

impl ParentNames {
    pub fn fallback(&self, role: ParentRole) -> &str {
        match role {
            ParentRole::Parent1 => &self.parent1,
            ParentRole::Parent2 => &self.parent2,
        }
    }

    /// Nom du membre tenant ce rôle, sinon la valeur par défaut.
    pub fn display_name(&self, family: Option<&Family>, role: ParentRole) -> String {
        family
            .and_then(|f| f.member_with_role(role))
            .map(|m| m.display_name.trim())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| self.fallback(role))
            .to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: Backend,
    pub data_dir: PathBuf,
    pub transition_horizon_days: u32,
    pub batch_limit: usize,
    pub parent_names: ParentNames,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: Backend::Json,
            data_dir: PathBuf::from("garde-data"),
            transition_horizon_days: TRANSITION_HORIZON_DAYS,
            batch_limit: DEFAULT_BATCH_LIMIT,
            parent_names: ParentNames::default(),
        }
    }
}

impl Config {
    /// Défauts, puis fichier JSON éventuel, puis variables `GARDE_*`.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => {
                let data =
                    fs::read(path).with_context(|| format!("reading {}", path.display()))?;
                serde_json::from_slice(&data)
                    .with_context(|| format!("parsing {}", path.display()))?
            }
            None => Config::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("GARDE_BACKEND") {
            self.backend = v.parse().map_err(anyhow::Error::msg)?;
        }
        if let Some(v) = lookup("GARDE_DATA_DIR") {
            self.data_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("GARDE_TRANSITION_HORIZON_DAYS") {
            self.transition_horizon_days = v
                .trim()
                .parse()
                .context("GARDE_TRANSITION_HORIZON_DAYS")?;
        }
        if let Some(v) = lookup("GARDE_BATCH_LIMIT") {
            self.batch_limit = v.trim().parse().context("GARDE_BATCH_LIMIT")?;
        }
        if let Some(v) = lookup("GARDE_PARENT1_NAME") {
            self.parent_names.parent1 = v;
        }
        if let Some(v) = lookup("GARDE_PARENT2_NAME") {
            self.parent_names.parent2 = v;
        }
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.batch_limit == 0 {
            bail!("batch_limit must be > 0");
        }
        if self.transition_horizon_days == 0 {
            bail!("transition_horizon_days must be > 0");
        }
        Ok(())
    }

    /// Instancie le backend choisi.
    pub fn open_store(&self) -> anyhow::Result<Box<dyn FamilyStore>> {
        Ok(match self.backend {
            Backend::Json => Box::new(JsonStore::open(&self.data_dir)?),
            Backend::Memory => Box::new(MemoryStore::new()),
        })
    }
}
