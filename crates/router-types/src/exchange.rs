// router-types/src/exchange.rs

use serde::Serialize;
use serde_json::{Map, Value};

/// Identity of an exchange connector within one node.
pub type ExchangeId = String;

/// One entry of the exchange configuration document.
///
/// `parameters` is the complete JSON object of the entry, `exchangeType`
/// and `name` included, so connector factories see exactly what the
/// operator wrote.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExchangeSpec {
	/// Position in the document, starting at zero.
	pub index: usize,
	pub exchange_type: String,
	pub name: Option<String>,
	pub parameters: Map<String, Value>,
}

impl ExchangeSpec {
	pub fn new(index: usize, exchange_type: impl Into<String>) -> Self {
		let exchange_type = exchange_type.into();
		let mut parameters = Map::new();
		parameters.insert(
			"exchangeType".to_string(),
			Value::String(exchange_type.clone()),
		);
		Self {
			index,
			exchange_type,
			name: None,
			parameters,
		}
	}

	pub fn with_name(mut self, name: impl Into<String>) -> Self {
		let name = name.into();
		self.parameters
			.insert("name".to_string(), Value::String(name.clone()));
		self.name = Some(name);
		self
	}

	pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.parameters.insert(key.into(), value.into());
		self
	}

	/// The explicit `name` when present, the exchange type otherwise.
	pub fn identity(&self) -> ExchangeId {
		self.name
			.clone()
			.unwrap_or_else(|| self.exchange_type.clone())
	}

	pub fn get_string(&self, key: &str) -> Option<&str> {
		self.parameters.get(key)?.as_str()
	}

	pub fn get_u64(&self, key: &str) -> Option<u64> {
		self.parameters.get(key)?.as_u64()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_identity_prefers_name() {
		let spec = ExchangeSpec::new(0, "openrtb");
		assert_eq!(spec.identity(), "openrtb");

		let spec = spec.with_name("openrtb-eu");
		assert_eq!(spec.identity(), "openrtb-eu");
		assert_eq!(spec.get_string("name"), Some("openrtb-eu"));
	}

	#[test]
	fn test_parameter_accessors() {
		let spec = ExchangeSpec::new(3, "rubicon")
			.with_parameter("port", 10002);

		assert_eq!(spec.get_string("exchangeType"), Some("rubicon"));
		assert_eq!(spec.get_u64("port"), Some(10002));
		assert_eq!(spec.get_u64("missing"), None);
	}
}
