// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! The signer uses `std`'s `HashMap`s unless the `hashbrown` feature is set, in which case
//! `hashbrown`'s tables are used with `std`'s randomized `SipHasher`.
//!
//! This module simply re-exports the `HashMap` used by the signer for public consumption.

#[cfg(feature = "hashbrown")]
extern crate hashbrown;

#[cfg(not(feature = "hashbrown"))]
mod std_hashtables {
	pub use std::collections::hash_map::RandomState;
	pub use std::collections::HashMap;

	pub(crate) use std::collections::HashSet;

	/// Builds a new [`HashMap`].
	pub fn new_hash_map<K, V>() -> HashMap<K, V> {
		HashMap::new()
	}

	pub(crate) fn new_hash_set<K>() -> HashSet<K> {
		HashSet::new()
	}
}
#[cfg(not(feature = "hashbrown"))]
pub use std_hashtables::*;

#[cfg(feature = "hashbrown")]
mod hashbrown_tables {
	pub use std::collections::hash_map::RandomState;

	/// The HashMap type used by the signer.
	pub type HashMap<K, V> = super::hashbrown::HashMap<K, V, RandomState>;
	pub(crate) type HashSet<K> = super::hashbrown::HashSet<K, RandomState>;

	/// Builds a new [`HashMap`].
	pub fn new_hash_map<K, V>() -> HashMap<K, V> {
		HashMap::with_hasher(RandomState::new())
	}

	pub(crate) fn new_hash_set<K>() -> HashSet<K> {
		HashSet::with_hasher(RandomState::new())
	}
}
#[cfg(feature = "hashbrown")]
pub use hashbrown_tables::*;
