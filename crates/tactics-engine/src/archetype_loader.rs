//! Archetype loading from TOML files.
//!
//! An archetype file holds optional `[player]`, `[enemy]`, `[ranged]`,
//! `[boss]` and `[arena]` tables. Whatever the file leaves out keeps the
//! built-in value of that archetype, including nested tables such as
//! `[ranged.base]` or `[boss.tuning.thresholds]`.
//!
//! # Example TOML Format
//!
//! ```toml
//! [player]
//! max_health = 150.0
//! hit_detection = { mode = "sweep", probe_radius = 60.0 }
//!
//! [ranged.base]
//! attack_range = 700.0
//!
//! [ranged.projectile]
//! name = "arrow"
//! radius = 12.0
//! lifetime = 2.5
//!
//! [boss.tuning]
//! enrage_damage_multiplier = 1.5
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tactics_common::TacticsError;
use tactics_gameplay::Archetypes;
use thiserror::Error;
use tracing::{debug, info};

/// Tables whose `mode` key selects a variant are replaced, not merged.
const VARIANT_TAG: &str = "mode";

/// Errors that can occur when loading archetypes.
#[derive(Debug, Error)]
pub enum ArchetypeLoadError {
    /// File not found
    #[error("Archetype file not found: {0}")]
    NotFound(PathBuf),

    /// IO error reading file
    #[error("IO error: {0}")]
    ReadError(#[from] io::Error),

    /// TOML parse error
    #[error("Parse error: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Built-in defaults could not be expressed as TOML
    #[error("Serialize error: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// Values parsed but failed validation
    #[error("Validation error: {0}")]
    ValidationError(#[from] TacticsError),
}

/// Result type for archetype loading.
pub type ArchetypeLoadResult<T> = Result<T, ArchetypeLoadError>;

/// Loads [`Archetypes`] layered over a base set.
#[derive(Debug, Clone, Default)]
pub struct ArchetypeLoader {
    base: Archetypes,
}

impl ArchetypeLoader {
    /// Creates a loader layering over the built-in archetypes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a loader layering over `base`.
    #[must_use]
    pub fn with_base(base: Archetypes) -> Self {
        Self { base }
    }

    /// The archetypes files are layered over.
    #[must_use]
    pub fn base(&self) -> &Archetypes {
        &self.base
    }

    /// Loads archetypes from a file.
    pub fn load_file(&self, path: &Path) -> ArchetypeLoadResult<Archetypes> {
        if !path.exists() {
            return Err(ArchetypeLoadError::NotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        let archetypes = self.load_str(&content)?;
        info!("Loaded archetypes from {}", path.display());
        Ok(archetypes)
    }

    /// Loads archetypes from TOML text.
    pub fn load_str(&self, content: &str) -> ArchetypeLoadResult<Archetypes> {
        let overlay: toml::Table = toml::from_str(content)?;
        debug!(tables = ?overlay.keys().collect::<Vec<_>>(), "archetype overrides");

        let mut merged = toml::Value::try_from(&self.base)?;
        merge_value(&mut merged, toml::Value::Table(overlay));

        let archetypes: Archetypes = merged.try_into()?;
        archetypes.validate()?;
        Ok(archetypes)
    }

    /// Loads from `path` if given, otherwise returns the base set.
    pub fn load_or_base(&self, path: Option<&Path>) -> ArchetypeLoadResult<Archetypes> {
        match path {
            Some(path) => self.load_file(path),
            None => {
                debug!("No archetype file configured, using built-in archetypes");
                Ok(self.base.clone())
            },
        }
    }
}

/// Deep-merges `overlay` into `base`.
///
/// Tables merge key by key. Anything else, and any table carrying a
/// variant tag, replaces the base value.
fn merge_value(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay))
            if !overlay.contains_key(VARIANT_TAG) =>
        {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_value(existing, value),
                    None => {
                        base.insert(key, value);
                    },
                }
            }
        },
        (base, overlay) => *base = overlay,
    }
}
