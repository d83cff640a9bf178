// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Error types live here.

use bitcoin::OutPoint;

use core::fmt;

/// The broad class a [`SignerError`] falls into. Callers use this to decide whether a request
/// should be retried, reported as a capability gap or treated as a bug on their side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
	/// The request was malformed. Fatal to the request and never worth retrying.
	Precondition,
	/// The requested script type or signature hash mode is not implemented.
	Unsupported,
	/// The wallet, chain source or broadcaster failed to do its part.
	Collaborator,
	/// The request conflicts with process state, such as the set of locked outpoints.
	ResourceState,
}

/// Indicates an error on the client's part, a missing capability on ours, or a failure of one of
/// the backends we were handed.
#[derive(Clone, PartialEq, Eq)]
pub enum SignerError {
	/// A request field had the wrong length or could not be interpreted.
	InvalidRequest {
		/// A human-readable error message
		err: String,
	},
	/// The descriptor's input index does not exist in the transaction being signed.
	InvalidInputIndex {
		/// The requested input index.
		index: u32,
		/// The number of inputs the transaction actually has.
		input_count: usize,
	},
	/// The raw transaction bytes could not be parsed.
	InvalidTransaction {
		/// A human-readable error message
		err: String,
	},
	/// Applying a tweak produced an invalid private key, or the tweak itself was not a valid
	/// scalar.
	InvalidTweak {
		/// A human-readable error message
		err: String,
	},
	/// Only `SIGHASH_ALL` (optionally with `ANYONECANPAY`) is implemented.
	UnsupportedSigHashMode {
		/// The sighash type byte that was requested.
		sighash_type: u8,
	},
	/// The output being spent is not a native P2WPKH output.
	UnsupportedScriptType {
		/// A human-readable error message
		err: String,
	},
	/// An address type other than native P2WPKH was requested.
	UnsupportedAddressType {
		/// A human-readable error message
		err: String,
	},
	/// The wallet backend could not satisfy the request.
	Wallet {
		/// A human-readable error message
		err: String,
	},
	/// An outpoint was unlocked without having been locked first.
	NotLocked {
		/// The outpoint which was not locked.
		outpoint: OutPoint,
	},
	/// Every candidate key in the wallet's pool has already been handed out.
	PoolExhausted,
}

impl SignerError {
	/// Returns the [`ErrorCategory`] this error belongs to.
	pub fn category(&self) -> ErrorCategory {
		match self {
			SignerError::InvalidRequest { .. }
			| SignerError::InvalidInputIndex { .. }
			| SignerError::InvalidTransaction { .. }
			| SignerError::InvalidTweak { .. } => ErrorCategory::Precondition,
			SignerError::UnsupportedSigHashMode { .. }
			| SignerError::UnsupportedScriptType { .. }
			| SignerError::UnsupportedAddressType { .. } => ErrorCategory::Unsupported,
			SignerError::Wallet { .. } => ErrorCategory::Collaborator,
			SignerError::NotLocked { .. } | SignerError::PoolExhausted => {
				ErrorCategory::ResourceState
			},
		}
	}
}

impl fmt::Debug for SignerError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match *self {
			SignerError::InvalidRequest { ref err } => write!(f, "Invalid request: {}", err),
			SignerError::InvalidInputIndex { index, input_count } => {
				write!(f, "Invalid input index {} for a transaction with {} inputs", index, input_count)
			},
			SignerError::InvalidTransaction { ref err } => {
				write!(f, "Invalid transaction provided: {}", err)
			},
			SignerError::InvalidTweak { ref err } => write!(f, "Invalid tweak: {}", err),
			SignerError::UnsupportedSigHashMode { sighash_type } => {
				write!(f, "Unsupported sighash type 0x{:02x}", sighash_type)
			},
			SignerError::UnsupportedScriptType { ref err } => {
				write!(f, "Unsupported script type: {}", err)
			},
			SignerError::UnsupportedAddressType { ref err } => {
				write!(f, "Unsupported address type: {}", err)
			},
			SignerError::Wallet { ref err } => write!(f, "Wallet error: {}", err),
			SignerError::NotLocked { ref outpoint } => {
				write!(f, "Outpoint {} is not locked", outpoint)
			},
			SignerError::PoolExhausted => f.write_str("All keys in the wallet's pool have been issued"),
		}
	}
}

impl fmt::Display for SignerError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		fmt::Debug::fmt(self, f)
	}
}

impl std::error::Error for SignerError {}

/// A failure reported by a wallet, chain or broadcast backend.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WalletError {
	/// A human-readable error message
	pub err: String,
}

impl WalletError {
	/// Builds a [`WalletError`] from anything printable.
	pub fn new<E: fmt::Display>(err: E) -> Self {
		WalletError { err: err.to_string() }
	}
}

impl fmt::Display for WalletError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.write_str(&self.err)
	}
}

impl From<WalletError> for SignerError {
	fn from(e: WalletError) -> Self {
		SignerError::Wallet { err: e.err }
	}
}

#[cfg(test)]
mod tests {
	use super::{ErrorCategory, SignerError, WalletError};
	use bitcoin::hashes::Hash;
	use bitcoin::{OutPoint, Txid};

	#[test]
	fn categories() {
		let outpoint = OutPoint { txid: Txid::all_zeros(), vout: 3 };
		assert_eq!(SignerError::InvalidRequest { err: String::new() }.category(), ErrorCategory::Precondition);
		assert_eq!(SignerError::InvalidInputIndex { index: 2, input_count: 1 }.category(), ErrorCategory::Precondition);
		assert_eq!(SignerError::UnsupportedSigHashMode { sighash_type: 3 }.category(), ErrorCategory::Unsupported);
		assert_eq!(SignerError::UnsupportedScriptType { err: String::new() }.category(), ErrorCategory::Unsupported);
		assert_eq!(SignerError::from(WalletError::new("offline")).category(), ErrorCategory::Collaborator);
		assert_eq!(SignerError::NotLocked { outpoint }.category(), ErrorCategory::ResourceState);
		assert_eq!(SignerError::PoolExhausted.category(), ErrorCategory::ResourceState);
	}

	#[test]
	fn messages() {
		assert_eq!(
			SignerError::UnsupportedSigHashMode { sighash_type: 0x83 }.to_string(),
			"Unsupported sighash type 0x83"
		);
		assert_eq!(
			SignerError::from(WalletError::new("no key for address")).to_string(),
			"Wallet error: no key for address"
		);
	}
}
