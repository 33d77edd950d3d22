//! Loading and saving the settings file.
//!
//! The file is always replaced atomically (temp file in the same
//! directory, then rename). Single-section updates go through `toml_edit`
//! so the user's comments in other sections survive.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;
use toml_edit::{DocumentMut, Item, Table};

use super::settings::{ConfigSection, Settings};

/// Errors that can occur during config operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid settings in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Failed to edit {path}: {source}")]
    Edit {
        path: PathBuf,
        #[source]
        source: toml_edit::TomlError,
    },

    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
}

impl ConfigError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Result type for config operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Owns the settings file and the settings loaded from it.
pub struct ConfigManager {
    config_path: PathBuf,
    settings: Settings,
}

impl ConfigManager {
    /// Manager for `config_path` holding default settings.
    ///
    /// Nothing is read until [`load`](Self::load) or
    /// [`load_or_create`](Self::load_or_create).
    pub fn new(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
            settings: Settings::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// In-memory changes are only written by `save` or `update_section`.
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Read the settings file; it must exist.
    pub fn load(&mut self) -> ConfigResult<()> {
        let content = self.read_existing()?;
        self.settings = self.parse(&content)?;
        Ok(())
    }

    /// Read the settings file, writing a default one first if missing.
    ///
    /// A file with unknown tables or missing keys is rewritten in full
    /// with the settings that were understood.
    pub fn load_or_create(&mut self) -> ConfigResult<()> {
        if !self.config_path.exists() {
            tracing::info!("Creating default config at {}", self.config_path.display());
            self.settings = Settings::default();
            return self.save();
        }

        let content = self.read_existing()?;
        self.settings = self.parse(&content)?;
        if self.needs_rewrite(&content)? {
            tracing::info!("Repairing config file {}", self.config_path.display());
            self.save()?;
        }
        Ok(())
    }

    /// Create the output and logs folders.
    pub fn ensure_dirs_exist(&self) -> ConfigResult<()> {
        for dir in [self.output_folder(), self.logs_folder()] {
            fs::create_dir_all(&dir).map_err(|e| ConfigError::io(&dir, e))?;
        }
        Ok(())
    }

    pub fn output_folder(&self) -> PathBuf {
        PathBuf::from(&self.settings.paths.output_folder)
    }

    pub fn logs_folder(&self) -> PathBuf {
        PathBuf::from(&self.settings.paths.logs_folder)
    }

    /// Where the CLI writes the artifact when no output is given.
    pub fn output_path(&self) -> PathBuf {
        self.output_folder()
            .join(&self.settings.paths.output_file_name)
    }

    /// Write every section, each under its descriptive comment.
    pub fn save(&self) -> ConfigResult<()> {
        let mut doc = DocumentMut::new();
        for (i, section) in ConfigSection::ALL.into_iter().enumerate() {
            let mut table = self.section_table(section)?;
            let header = if i == 0 { "# retime configuration\n\n" } else { "\n" };
            table
                .decor_mut()
                .set_prefix(format!("{}# {}\n", header, section.comment()));
            doc.insert(section.table_name(), Item::Table(table));
        }
        self.write_atomic(&doc.to_string())
    }

    /// Write only `section`, keeping the rest of the file as it is on disk.
    pub fn update_section(&mut self, section: ConfigSection) -> ConfigResult<()> {
        let mut doc = if self.config_path.exists() {
            let content = self.read_existing()?;
            content
                .parse::<DocumentMut>()
                .map_err(|source| ConfigError::Edit {
                    path: self.config_path.clone(),
                    source,
                })?
        } else {
            DocumentMut::new()
        };

        let fresh = self.section_table(section)?;
        match doc
            .get_mut(section.table_name())
            .and_then(Item::as_table_mut)
        {
            Some(existing) => {
                existing.clear();
                for (key, value) in fresh.iter() {
                    existing.insert(key, value.clone());
                }
            }
            None => {
                doc.insert(section.table_name(), Item::Table(fresh));
            }
        }
        self.write_atomic(&doc.to_string())
    }

    /// One section of the current settings as an editable table.
    fn section_table(&self, section: ConfigSection) -> ConfigResult<Table> {
        let s = &self.settings;
        let body = match section {
            ConfigSection::Paths => toml::to_string(&s.paths)?,
            ConfigSection::Logging => toml::to_string(&s.logging)?,
            ConfigSection::Encoding => toml::to_string(&s.encoding)?,
            ConfigSection::Sync => toml::to_string(&s.sync)?,
            ConfigSection::Engine => toml::to_string(&s.engine)?,
        };
        let doc = body
            .parse::<DocumentMut>()
            .map_err(|source| ConfigError::Edit {
                path: self.config_path.clone(),
                source,
            })?;
        Ok(doc.as_table().clone())
    }

    fn read_existing(&self) -> ConfigResult<String> {
        fs::read_to_string(&self.config_path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => ConfigError::NotFound(self.config_path.clone()),
            _ => ConfigError::io(&self.config_path, e),
        })
    }

    fn parse(&self, content: &str) -> ConfigResult<Settings> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: self.config_path.clone(),
            source,
        })
    }

    /// Whether `content` differs from what the loaded settings would
    /// write: unknown tables or keys, or keys that had to be defaulted.
    fn needs_rewrite(&self, content: &str) -> ConfigResult<bool> {
        let on_disk: toml::Value = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: self.config_path.clone(),
            source,
        })?;
        let understood = toml::Value::try_from(&self.settings)?;
        Ok(on_disk != understood)
    }

    fn write_atomic(&self, content: &str) -> ConfigResult<()> {
        let dir = match self.config_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).map_err(|e| ConfigError::io(&dir, e))?;

        let mut temp = NamedTempFile::new_in(&dir).map_err(|e| ConfigError::io(&dir, e))?;
        temp.write_all(content.as_bytes())
            .and_then(|_| temp.as_file().sync_all())
            .map_err(|e| ConfigError::io(temp.path(), e))?;
        temp.persist(&self.config_path)
            .map_err(|e| ConfigError::io(&self.config_path, e.error))?;
        Ok(())
    }
}
