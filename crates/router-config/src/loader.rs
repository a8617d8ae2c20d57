//! Option file loading.

use crate::{ConfigError, RawOptions};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Loads [`RawOptions`] from an optional TOML file and layers overrides
/// (environment, command line) on top.
#[derive(Debug, Default)]
pub struct OptionsLoader {
	file_path: Option<PathBuf>,
	overrides: RawOptions,
}

impl OptionsLoader {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
		self.file_path = Some(path.as_ref().to_path_buf());
		self
	}

	pub fn with_overrides(mut self, overrides: RawOptions) -> Self {
		self.overrides = overrides;
		self
	}

	pub fn load(self) -> Result<RawOptions, ConfigError> {
		let base = match &self.file_path {
			Some(path) => Self::from_file(path)?,
			None => RawOptions::default(),
		};

		Ok(base.merge(self.overrides))
	}

	/// Load options from a TOML file.
	pub fn from_file(path: &Path) -> Result<RawOptions, ConfigError> {
		info!("Loading options from {:?}", path);

		let contents =
			std::fs::read_to_string(path).map_err(|source| ConfigError::OptionFileUnreadable {
				path: path.to_path_buf(),
				source,
			})?;

		let options = Self::from_toml(&contents).map_err(|reason| ConfigError::OptionFileInvalid {
			path: path.to_path_buf(),
			reason,
		})?;

		debug!(?options, "Option file parsed");
		Ok(options)
	}

	pub fn from_toml(contents: &str) -> Result<RawOptions, String> {
		toml::from_str(contents).map_err(|e| e.to_string())
	}
}
