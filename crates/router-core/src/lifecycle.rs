// router-core/src/lifecycle.rs

use crate::error::LifecycleError;
use router_types::LifecycleState;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::info;

/// The node lifecycle state machine.
///
/// Holds the single authoritative [`LifecycleState`] of the process and
/// rejects transitions the state machine does not allow. Observers may
/// subscribe to be told when shutdown begins.
pub struct LifecycleManager {
	state: Arc<RwLock<LifecycleState>>,
	shutdown_tx: broadcast::Sender<()>,
}

impl LifecycleManager {
	pub fn new() -> Self {
		let (shutdown_tx, _) = broadcast::channel(16);

		Self {
			state: Arc::new(RwLock::new(LifecycleState::Uninitialized)),
			shutdown_tx,
		}
	}

	pub async fn get_state(&self) -> LifecycleState {
		*self.state.read().await
	}

	pub async fn set_state(&self, new_state: LifecycleState) -> Result<(), LifecycleError> {
		let mut state = self.state.write().await;
		let old_state = *state;

		if !Self::is_valid_transition(old_state, new_state) {
			return Err(LifecycleError::IllegalStateChange {
				from: old_state,
				to: new_state,
			});
		}

		*state = new_state;
		info!("Lifecycle state changed: {} -> {}", old_state, new_state);

		if new_state == LifecycleState::ShuttingDown {
			let _ = self.shutdown_tx.send(());
		}

		Ok(())
	}

	/// Move to `Failed`.
	///
	/// Failing from a state that does not allow it is a no-op, so the
	/// caller can always report its original error.
	pub async fn fail(&self) {
		if let Err(e) = self.set_state(LifecycleState::Failed).await {
			tracing::debug!("Not marking lifecycle failed: {}", e);
		}
	}

	pub fn subscribe_shutdown(&self) -> broadcast::Receiver<()> {
		self.shutdown_tx.subscribe()
	}

	fn is_valid_transition(from: LifecycleState, to: LifecycleState) -> bool {
		use LifecycleState::*;

		match (from, to) {
			(Uninitialized, Initialized) => true,
			(Initialized, Running) => true,
			(Initialized, ShuttingDown) => true,
			(Running, ShuttingDown) => true,
			// Cleanup after a failed init or start.
			(Failed, ShuttingDown) => true,
			(ShuttingDown, Stopped) => true,
			(from, Failed) => !from.is_terminal(),
			_ => false,
		}
	}
}

impl Default for LifecycleManager {
	fn default() -> Self {
		Self::new()
	}
}
