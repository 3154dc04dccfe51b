//! Loading of configuration split across several files.
//!
//! The entry file may name other files in an `include` directive, as a string
//! or an array of strings. Included files may include further files; paths
//! are relative to the including file. Top-level sections from every file are
//! merged into one table, and a section defined twice is an error rather than
//! a silent override.

use crate::{resolve_env_vars, Config, ConfigError};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Configuration loader that handles multi-file configurations with includes.
pub struct ConfigLoader {
	/// Directory the entry file is resolved against
	base_path: PathBuf,
	/// Canonical paths already read, to reject include cycles
	loaded_files: HashSet<PathBuf>,
	/// File each top-level section came from, for error reporting
	section_sources: HashMap<String, PathBuf>,
}

impl ConfigLoader {
	/// Creates a new ConfigLoader with the given base path.
	pub fn new(base_path: impl AsRef<Path>) -> Self {
		Self {
			base_path: base_path.as_ref().to_path_buf(),
			loaded_files: HashSet::new(),
			section_sources: HashMap::new(),
		}
	}

	/// Loads a configuration file and everything it includes.
	pub async fn load_config(
		&mut self,
		config_path: impl AsRef<Path>,
	) -> Result<Config, ConfigError> {
		let entry = resolve_path(&self.base_path, config_path.as_ref())?;
		let mut pending = vec![entry];
		let mut combined = toml::Table::new();

		// Depth-first, so sections are attributed in include order
		while let Some(path) = pending.pop() {
			let mut table = self.load_file(&path).await?;
			let includes = take_includes(&mut table)?;
			self.merge_sections(&path, table, &mut combined)?;

			let dir = path.parent().unwrap_or(&self.base_path).to_path_buf();
			for include in includes.iter().rev() {
				pending.push(resolve_path(&dir, include)?);
			}
		}

		// Environment variables are already resolved per file
		let config: Config = toml::Value::Table(combined).try_into()?;
		config.validate()?;
		Ok(config)
	}

	/// Reads a file, resolves its environment variables and parses it.
	async fn load_file(&mut self, path: &Path) -> Result<toml::Table, ConfigError> {
		let canonical_path = path.canonicalize().map_err(|e| {
			ConfigError::Io(std::io::Error::new(
				std::io::ErrorKind::NotFound,
				format!("Cannot resolve path {}: {}", path.display(), e),
			))
		})?;

		if !self.loaded_files.insert(canonical_path.clone()) {
			return Err(ConfigError::Validation(format!(
				"Circular include detected: {} was already loaded",
				canonical_path.display()
			)));
		}

		let content = tokio::fs::read_to_string(path).await?;
		let resolved = resolve_env_vars(&content)?;
		Ok(toml::from_str(&resolved)?)
	}

	/// Moves the sections of `table` into `combined`, rejecting duplicates.
	fn merge_sections(
		&mut self,
		source: &Path,
		table: toml::Table,
		combined: &mut toml::Table,
	) -> Result<(), ConfigError> {
		for (key, value) in table {
			if let Some(existing_source) = self.section_sources.get(&key) {
				return Err(ConfigError::Validation(format!(
					"Duplicate section '{}' found in {} and {}. \
					Each top-level section must be unique across all configuration files.",
					key,
					existing_source.display(),
					source.display()
				)));
			}
			self.section_sources
				.insert(key.clone(), source.to_path_buf());
			combined.insert(key, value);
		}
		Ok(())
	}
}

/// Removes the `include` directive from `table` and returns its paths.
fn take_includes(table: &mut toml::Table) -> Result<Vec<PathBuf>, ConfigError> {
	match table.remove("include") {
		None => Ok(Vec::new()),
		Some(toml::Value::String(path)) => Ok(vec![PathBuf::from(path)]),
		Some(toml::Value::Array(items)) => items
			.into_iter()
			.map(|item| match item {
				toml::Value::String(path) => Ok(PathBuf::from(path)),
				_ => Err(ConfigError::Validation(
					"Include array must contain only strings".into(),
				)),
			})
			.collect(),
		Some(_) => Err(ConfigError::Validation(
			"Include must be a string or array of strings".into(),
		)),
	}
}

/// Resolves `path` against `dir` and checks that the file exists.
fn resolve_path(dir: &Path, path: &Path) -> Result<PathBuf, ConfigError> {
	let resolved = if path.is_absolute() {
		path.to_path_buf()
	} else {
		dir.join(path)
	};

	if !resolved.exists() {
		return Err(ConfigError::Io(std::io::Error::new(
			std::io::ErrorKind::NotFound,
			format!("Configuration file not found: {}", resolved.display()),
		)));
	}

	Ok(resolved)
}
