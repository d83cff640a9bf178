// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Types describing on-chain transactions as they arrive over the wire.

use bitcoin::blockdata::transaction::{OutPoint, Transaction};
use bitcoin::consensus::encode;

use crate::util::errors::SignerError;

/// A transaction in consensus serialization, exactly as a caller handed it to us.
///
/// The bytes are only parsed when a request needs to look inside, so that a malformed
/// transaction fails the request that uses it rather than the transport.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RawTransaction(pub Vec<u8>);

impl RawTransaction {
	/// Wraps a consensus-serialized transaction.
	pub fn from_transaction(tx: &Transaction) -> Self {
		RawTransaction(encode::serialize(tx))
	}

	/// Parses the wrapped bytes. Trailing bytes are rejected.
	pub fn parse(&self) -> Result<Transaction, SignerError> {
		encode::deserialize(&self.0)
			.map_err(|e| SignerError::InvalidTransaction { err: format!("{}", e) })
	}

	/// Returns the outpoint spent by the input at `index`.
	pub fn outpoint(&self, index: usize) -> Result<OutPoint, SignerError> {
		let tx = self.parse()?;
		match tx.input.get(index) {
			Some(txin) => Ok(txin.previous_output),
			None => Err(SignerError::InvalidInputIndex { index: index as u32, input_count: tx.input.len() }),
		}
	}

	/// The raw bytes.
	pub fn as_bytes(&self) -> &[u8] {
		&self.0
	}
}

impl From<Vec<u8>> for RawTransaction {
	fn from(bytes: Vec<u8>) -> Self {
		RawTransaction(bytes)
	}
}
