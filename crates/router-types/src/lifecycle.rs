// router-types/src/lifecycle.rs

use serde::Serialize;

/// States of the node lifecycle.
///
/// ```text
/// Uninitialized -> Initialized -> Running -> ShuttingDown -> Stopped
///        \______________\____________\____________\______> Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LifecycleState {
	Uninitialized,
	Initialized,
	Running,
	ShuttingDown,
	Stopped,
	Failed,
}

impl LifecycleState {
	/// `Stopped` and `Failed` accept no further forward transition.
	pub fn is_terminal(&self) -> bool {
		matches!(self, Self::Stopped | Self::Failed)
	}

	/// Numeric code published as the `lifecycle.state` gauge.
	pub fn code(&self) -> u8 {
		match self {
			Self::Uninitialized => 0,
			Self::Initialized => 1,
			Self::Running => 2,
			Self::ShuttingDown => 3,
			Self::Stopped => 4,
			Self::Failed => 5,
		}
	}
}

impl std::fmt::Display for LifecycleState {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Uninitialized => write!(f, "Uninitialized"),
			Self::Initialized => write!(f, "Initialized"),
			Self::Running => write!(f, "Running"),
			Self::ShuttingDown => write!(f, "ShuttingDown"),
			Self::Stopped => write!(f, "Stopped"),
			Self::Failed => write!(f, "Failed"),
		}
	}
}
