// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! The interface the signer uses to reach the on-chain wallet which actually holds our keys and
//! coins.

use bitcoin::blockdata::transaction::{OutPoint, Transaction, TxOut};
use bitcoin::hash_types::Txid;
use bitcoin::secp256k1::{PublicKey, SecretKey};
use bitcoin::{Address, Amount};

use crate::util::errors::WalletError;

/// An unspent transaction output the wallet controls.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Utxo {
	/// The unique identifier of the output.
	pub outpoint: OutPoint,
	/// The output to spend.
	pub output: TxOut,
	/// The number of confirmations the output has, 0 if unconfirmed.
	pub confirmations: u32,
}

/// A transaction from the wallet's history along with how it affected our balance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionDetails {
	/// The transaction's id.
	pub txid: Txid,
	/// The net change in our balance caused by this transaction, in satoshis.
	pub value_sats: i64,
	/// The number of confirmations, 0 if unconfirmed.
	pub confirmations: u32,
	/// The height of the block which confirmed the transaction, or 0 if unconfirmed.
	pub block_height: u32,
	/// The timestamp of the confirming block (or first-seen time), in seconds since the epoch.
	pub timestamp: u64,
	/// The fee paid by the transaction, if the wallet knows it.
	pub total_fees: Option<Amount>,
}

/// A wallet which holds the keys and coins the signer works with.
///
/// Every key the signer ever signs with is looked up by address through
/// [`WalletSource::secret_key_for_address`], so the wallet is the only place secret material is
/// stored.
pub trait WalletSource {
	/// Returns the sum of all outputs with at least `min_confs` confirmations.
	fn confirmed_balance(&self, min_confs: u32) -> Result<Amount, WalletError>;

	/// Returns a fresh native P2WPKH receive address.
	fn new_address(&self) -> Result<Address, WalletError>;

	/// Returns every output we can spend with at least `min_confs` confirmations. Locked
	/// outpoints are filtered by the caller.
	///
	/// Any P2SH output returned must wrap a P2WPKH program of one of our keys. Callers report
	/// such outputs as nested P2WPKH without looking at the redeem script.
	fn list_unspent(&self, min_confs: u32) -> Result<Vec<Utxo>, WalletError>;

	/// Returns the public keys of all addresses the wallet considers unused, in a stable order.
	fn unused_public_keys(&self) -> Result<Vec<PublicKey>, WalletError>;

	/// Returns the private key controlling `address`.
	fn secret_key_for_address(&self, address: &Address) -> Result<SecretKey, WalletError>;

	/// Returns the transaction with the given txid if it is one of the wallet's own.
	fn get_transaction(&self, txid: &Txid) -> Option<Transaction>;

	/// Builds and fully signs a transaction paying to `outputs`, paying exactly `fee`.
	fn create_transaction(&self, outputs: Vec<TxOut>, fee: Amount)
		-> Result<Transaction, WalletError>;

	/// Returns the wallet's transaction history.
	fn transaction_history(&self) -> Result<Vec<TransactionDetails>, WalletError>;

	/// Returns the 32-byte root key the channel state machine derives its own keys from.
	fn root_key(&self) -> Result<[u8; 32], WalletError>;
}
