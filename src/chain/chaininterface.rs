// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Traits which allow the signer to interact with the blockchain.
//!
//! Includes transaction broadcasting and chain synchronization status requests.

use bitcoin::blockdata::transaction::Transaction;
use bitcoin::hash_types::{BlockHash, Txid};

use crate::util::errors::WalletError;

/// An interface to send a transaction to the Bitcoin network.
pub trait BroadcasterInterface {
	/// Sends a transaction out to (hopefully) be mined.
	///
	/// Returns the txid the backend accepted, or the backend's rejection reason verbatim. Callers
	/// match on the reason (e.g. `"Missing inputs"`) so implementations should not reword it.
	fn broadcast_transaction(&self, tx: &Transaction) -> Result<Txid, WalletError>;
}

/// The synchronization state of the chain backend, as reported by [`ChainSource::sync_status`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SyncStatus {
	/// The height of our locally validated header chain.
	pub local_height: u32,
	/// The height the server we are connected to reports.
	pub server_height: u32,
	/// Whether the backend considers its wallet history up to date.
	pub up_to_date: bool,
}

impl SyncStatus {
	/// We are only synced if the backend says so and we have caught up with the server's tip.
	pub fn is_synced(&self) -> bool {
		self.up_to_date && self.local_height == self.server_height
	}
}

/// An interface to query the state of the chain backend.
pub trait ChainSource {
	/// Returns the current synchronization status.
	fn sync_status(&self) -> Result<SyncStatus, WalletError>;

	/// Returns the hash of the block at the given height in the best chain, if known.
	fn block_hash_at(&self, height: u32) -> Option<BlockHash>;
}

#[cfg(test)]
mod tests {
	use super::SyncStatus;

	#[test]
	fn synced_only_at_server_tip() {
		let mut status = SyncStatus { local_height: 100, server_height: 100, up_to_date: true };
		assert!(status.is_synced());
		status.local_height = 99;
		assert!(!status.is_synced());
		status.local_height = 100;
		status.up_to_date = false;
		assert!(!status.is_synced());
	}
}
