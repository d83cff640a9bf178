// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Various user-configurable settings which the [`SignerManager`] applies for you.
//!
//! [`SignerManager`]: crate::ln::signermanager::SignerManager

use bitcoin::Network;

use crate::sign::sighash::SIGHASH_ALL;

/// Top-level config which holds the settings the signer needs for every request.
///
/// `Default::default()` provides sane defaults for a regtest node.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SignerConfig {
	/// The network used when deriving addresses from output scripts and public keys. Wallet keys
	/// are looked up by address, so this must match the network the wallet was created for.
	///
	/// Default value: [`Network::Regtest`].
	pub network: Network,
	/// The absolute fee, in satoshis, handed to the wallet when building a transaction for
	/// `SendOutputs`.
	///
	/// Default value: 1000.
	pub send_outputs_fee_sats: u64,
	/// The sighash type committed to when a sign descriptor leaves its hash type at 0. The
	/// channel state machine appends its own sighash byte to raw signatures and assumes "sign
	/// everything", so only [`SIGHASH_ALL`] (optionally with `SIGHASH_ANYONECANPAY`) is usable
	/// here.
	///
	/// Default value: [`SIGHASH_ALL`].
	pub sighash_type: u8,
}

impl Default for SignerConfig {
	fn default() -> Self {
		SignerConfig {
			network: Network::Regtest,
			send_outputs_fee_sats: 1000,
			sighash_type: SIGHASH_ALL,
		}
	}
}
