//! Exchange configuration document.
//!
//! The document is a JSON array of objects, one per exchange connector,
//! each carrying at least a string `exchangeType`. Reading the bytes is
//! delegated to a [`DocumentSource`]; classifying them is done here.

use crate::ConfigError;
use router_types::ExchangeSpec;
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;

/// Reads raw document bytes.
pub trait DocumentSource: Send + Sync {
	fn read(&self, path: &Path) -> std::io::Result<Vec<u8>>;
}

/// Reads documents from the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsDocumentSource;

impl DocumentSource for FsDocumentSource {
	fn read(&self, path: &Path) -> std::io::Result<Vec<u8>> {
		std::fs::read(path)
	}
}

/// Parse an exchange configuration document.
///
/// Anything other than an array of well-formed objects is rejected as a
/// whole; no partial list is returned.
pub fn parse_exchange_document(bytes: &[u8]) -> Result<Vec<ExchangeSpec>, ConfigError> {
	let document: Value = serde_json::from_slice(bytes)
		.map_err(|e| ConfigError::InvalidExchangeConfig(format!("malformed JSON: {}", e)))?;

	let entries = match document {
		Value::Array(entries) => entries,
		other => {
			return Err(ConfigError::InvalidExchangeConfig(format!(
				"expected an array of exchange objects, found {}",
				json_kind(&other)
			)))
		}
	};

	let mut seen = HashSet::new();
	let mut specs = Vec::with_capacity(entries.len());

	for (index, entry) in entries.into_iter().enumerate() {
		let parameters = match entry {
			Value::Object(map) => map,
			other => {
				return Err(ConfigError::InvalidExchangeConfig(format!(
					"entry {} is {}, expected an object",
					index,
					json_kind(&other)
				)))
			}
		};

		let exchange_type = match parameters.get("exchangeType") {
			Some(Value::String(t)) if !t.trim().is_empty() => t.clone(),
			Some(_) => {
				return Err(ConfigError::InvalidExchangeConfig(format!(
					"entry {}: 'exchangeType' must be a non-empty string",
					index
				)))
			}
			None => {
				return Err(ConfigError::InvalidExchangeConfig(format!(
					"entry {}: missing 'exchangeType'",
					index
				)))
			}
		};

		let name = match parameters.get("name") {
			None => None,
			Some(Value::String(n)) if !n.trim().is_empty() => Some(n.clone()),
			Some(_) => {
				return Err(ConfigError::InvalidExchangeConfig(format!(
					"entry {}: 'name' must be a non-empty string",
					index
				)))
			}
		};

		let spec = ExchangeSpec {
			index,
			exchange_type,
			name,
			parameters,
		};

		if !seen.insert(spec.identity()) {
			return Err(ConfigError::InvalidExchangeConfig(format!(
				"entry {}: exchange '{}' is configured more than once",
				index,
				spec.identity()
			)));
		}

		specs.push(spec);
	}

	Ok(specs)
}

fn json_kind(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "a boolean",
		Value::Number(_) => "a number",
		Value::String(_) => "a string",
		Value::Array(_) => "an array",
		Value::Object(_) => "an object",
	}
}
