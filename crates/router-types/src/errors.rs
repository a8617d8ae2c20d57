// router-types/src/errors.rs

use thiserror::Error;

/// Outcome of a call into an external collaborator.
///
/// The controller only distinguishes success from failure; the variant and
/// message exist for operators reading the logs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComponentError {
	#[error("Construction failed: {0}")]
	Construction(String),

	#[error("Bind failed: {0}")]
	Bind(String),

	#[error("Start failed: {0}")]
	Start(String),

	#[error("Shutdown failed: {0}")]
	Shutdown(String),

	#[error("Connection error: {0}")]
	Connection(String),

	#[error("Invalid parameters: {0}")]
	InvalidParameters(String),

	#[error("Not found: {0}")]
	NotFound(String),
}

pub type ComponentResult<T> = Result<T, ComponentError>;
