// router-config/src/lib.rs

//! # Router Configuration
//!
//! Turns operator input into an immutable [`NodeConfig`].
//!
//! Raw options come from an optional TOML option file, the environment and
//! the command line; [`validate`] checks required fields, applies defaults
//! and parses the exchange configuration document. Validation never
//! touches the network and never terminates the process: the caller maps
//! a [`ConfigError`] to an exit code.

use std::path::PathBuf;
use thiserror::Error;

pub mod exchange;
pub mod loader;
pub mod types;
pub mod validation;

pub use exchange::{parse_exchange_document, DocumentSource, FsDocumentSource};
pub use loader::OptionsLoader;
pub use types::{NodeConfig, RawOptions, DEFAULT_DISCOVERY_URI, DEFAULT_LOSS_SECONDS};
pub use validation::validate;

#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("'{0}' parameter is required")]
	MissingRequiredField(&'static str),

	#[error("Invalid value for '{field}': {reason}")]
	InvalidValue { field: &'static str, reason: String },

	#[error("Invalid exchange configuration: {0}")]
	InvalidExchangeConfig(String),

	#[error("Cannot read exchange configuration {path:?}: {source}")]
	ExchangeConfigUnreadable {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Cannot read option file {path:?}: {source}")]
	OptionFileUnreadable {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Parse error in option file {path:?}: {reason}")]
	OptionFileInvalid { path: PathBuf, reason: String },
}
