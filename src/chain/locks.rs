// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Advisory reservation of wallet outputs.
//!
//! The channel state machine locks the outpoints it is about to spend so that a concurrent
//! request enumerating our UTXOs does not select the same coin. Nothing here is persisted and
//! nothing is rolled back: callers unlock on their own error paths.

use bitcoin::blockdata::transaction::OutPoint;

use crate::chain::walletinterface::Utxo;
use crate::util::errors::SignerError;
use crate::util::hash_tables::{new_hash_set, HashSet};
use crate::util::logger::Logger;

use core::ops::Deref;
use std::sync::Mutex;

/// The set of outpoints currently reserved against spending.
pub struct OutpointLockSet {
	locked: Mutex<HashSet<OutPoint>>,
}

impl OutpointLockSet {
	/// Creates an empty lock set.
	pub fn new() -> Self {
		OutpointLockSet { locked: Mutex::new(new_hash_set()) }
	}

	/// Reserves `outpoint`. Locking an already-locked outpoint is a no-op.
	pub fn lock(&self, outpoint: &OutPoint) {
		self.locked.lock().unwrap().insert(*outpoint);
	}

	/// Releases `outpoint`, failing with [`SignerError::NotLocked`] if it was never locked.
	pub fn unlock(&self, outpoint: &OutPoint) -> Result<(), SignerError> {
		if self.locked.lock().unwrap().remove(outpoint) {
			Ok(())
		} else {
			Err(SignerError::NotLocked { outpoint: *outpoint })
		}
	}

	/// Returns whether `outpoint` is currently locked.
	pub fn is_locked(&self, outpoint: &OutPoint) -> bool {
		self.locked.lock().unwrap().contains(outpoint)
	}

	/// Returns the number of locked outpoints.
	pub fn len(&self) -> usize {
		self.locked.lock().unwrap().len()
	}

	/// Returns true if no outpoint is locked.
	pub fn is_empty(&self) -> bool {
		self.locked.lock().unwrap().is_empty()
	}

	/// Drops every locked outpoint from `utxos`, as of the time of the call.
	pub fn filter_unlocked<L: Deref>(&self, utxos: Vec<Utxo>, logger: &L) -> Vec<Utxo>
	where
		L::Target: Logger,
	{
		let locked = self.locked.lock().unwrap();
		utxos
			.into_iter()
			.filter(|utxo| {
				if locked.contains(&utxo.outpoint) {
					log_debug!(logger, "Skipping locked outpoint {}", utxo.outpoint);
					false
				} else {
					true
				}
			})
			.collect()
	}
}

impl Default for OutpointLockSet {
	fn default() -> Self {
		Self::new()
	}
}
