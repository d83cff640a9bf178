// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Hands out wallet public keys such that no key is ever handed out twice.

use bitcoin::secp256k1::PublicKey;

use crate::util::errors::SignerError;
use crate::util::hash_tables::{new_hash_set, HashSet};

/// Round-robins over a pool of candidate keys supplied by the wallet, remembering every key it
/// has issued.
///
/// The wallet may return a different pool on every call (keys become "used" on its side only once
/// they receive funds), so the pool is passed in rather than owned. Positions in one pool mean
/// nothing in the next, so the cursor is the last issued key rather than an index.
pub struct KeyAllocator {
	last_issued: Option<PublicKey>,
	issued: HashSet<PublicKey>,
}

impl KeyAllocator {
	/// Creates an allocator which has not issued any keys yet.
	pub fn new() -> Self {
		KeyAllocator { last_issued: None, issued: new_hash_set() }
	}

	/// Issues the next key from `pool` which was never issued before, starting just past the
	/// last issued key, or at the start of `pool` if that key is no longer in it.
	///
	/// Fails with [`SignerError::PoolExhausted`] if every key in `pool` was already issued.
	pub fn issue_next(&mut self, pool: &[PublicKey]) -> Result<PublicKey, SignerError> {
		let start = self
			.last_issued
			.and_then(|last| pool.iter().position(|key| *key == last))
			.map_or(0, |idx| idx + 1);
		for offset in 0..pool.len() {
			let key = pool[(start + offset) % pool.len()];
			if self.issued.insert(key) {
				self.last_issued = Some(key);
				return Ok(key);
			}
		}
		Err(SignerError::PoolExhausted)
	}

	/// Returns true if `key` was issued by this allocator.
	pub fn is_issued(&self, key: &PublicKey) -> bool {
		self.issued.contains(key)
	}

	/// The number of keys issued so far.
	pub fn issued_count(&self) -> usize {
		self.issued.len()
	}
}

impl Default for KeyAllocator {
	fn default() -> Self {
		Self::new()
	}
}
