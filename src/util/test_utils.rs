// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

use crate::chain::chaininterface::{BroadcasterInterface, ChainSource, SyncStatus};
use crate::chain::walletinterface::{TransactionDetails, Utxo, WalletSource};
use crate::sign::sighash::TxSigHashes;
use crate::util::crypto::sha256d;
use crate::util::errors::WalletError;
use crate::util::hash_tables::{new_hash_map, HashMap};
use crate::util::logger::{Level, Logger, Record};

use bitcoin::absolute::LockTime;
use bitcoin::blockdata::script::ScriptBuf;
use bitcoin::blockdata::transaction::{Transaction, TxIn, TxOut, Version};
use bitcoin::consensus::encode;
use bitcoin::hash_types::{BlockHash, Txid};
use bitcoin::hashes::Hash;
use bitcoin::hex::FromHex;
use bitcoin::key::CompressedPublicKey;
use bitcoin::secp256k1::{PublicKey, Secp256k1, SecretKey};
use bitcoin::{Address, Amount, Network, Sequence, Witness};

use std::sync::Mutex;

/// The unsigned native P2WPKH example transaction from BIP 143.
pub const BIP143_P2WPKH_TX: &str = "0100000002fff7f7881a8099afa6940d42d1e7f6362bec38171ea3edf433541db4e4ad969f0000000000eeffffffef51e1b804cc89d182d279655c3aa89e815b1b309fe287d9b2b55d57b90ec68a0100000000ffffffff02202cb206000000001976a9148280b37df378db99f66f85c95a783a76ac7a6d5988ac9093510d000000001976a9143bde42dbee7e4dbe6a21b2d50ce2f0167faa815988ac11000000";
/// The unsigned P2SH-P2WPKH example transaction from BIP 143.
pub const BIP143_P2SH_P2WPKH_TX: &str = "0100000001db6b1b20aa0fd7b23880be2ecbd4a98130974cf4748fb66092ac4d3ceb1a54770100000000feffffff02b8b4eb0b000000001976a914a457b684d7f0d539a46a45bbc043f35b59d0d96388ac0008af2f000000001976a914fd270b1ee6abcaea97fea7ad0402e8bd8ad6d77c88ac92040000";
/// The unsigned two-input P2WSH example transaction from BIP 143.
pub const BIP143_P2WSH_TX: &str = "0100000002fe3dc9208094f3ffd12645477b3dc56f60ec4fa8e6f5d67c565d1c6b9216b36e0000000000ffffffff0815cf020f013ed6cf91d29f4202e8a58726b1ac6c79da47c23d1bee0a6925f80000000000ffffffff0100f2052a010000001976a914a30741f8145e5acadf23f4c10542d4b2f4e08a2f88ac00000000";

pub fn hex_array<const N: usize>(hex: &str) -> [u8; N] {
	let bytes = Vec::<u8>::from_hex(hex).unwrap();
	<[u8; N]>::try_from(&bytes[..]).unwrap()
}

fn display_order(mut hash: [u8; 32]) -> [u8; 32] {
	hash.reverse();
	hash
}

/// Computes the BIP 143 aggregates for `tx` the way a client would before handing them to us.
pub fn bip143_sighashes(tx: &Transaction) -> TxSigHashes {
	let mut prev_outs = Vec::new();
	let mut sequences = Vec::new();
	for txin in tx.input.iter() {
		prev_outs.extend_from_slice(&txin.previous_output.txid.to_byte_array());
		prev_outs.extend_from_slice(&txin.previous_output.vout.to_le_bytes());
		sequences.extend_from_slice(&txin.sequence.0.to_le_bytes());
	}
	let mut outputs = Vec::new();
	for txout in tx.output.iter() {
		outputs.extend_from_slice(&encode::serialize(txout));
	}
	TxSigHashes {
		hash_prev_outs: display_order(sha256d(&prev_outs)),
		hash_sequence: display_order(sha256d(&sequences)),
		hash_outputs: display_order(sha256d(&outputs)),
	}
}

pub struct TestLogger {
	level: Level,
	pub lines: Mutex<HashMap<(String, String), usize>>,
	pub methods: Mutex<HashMap<(String, String), usize>>,
}

impl TestLogger {
	pub fn new() -> TestLogger {
		TestLogger {
			level: Level::Trace,
			lines: Mutex::new(new_hash_map()),
			methods: Mutex::new(new_hash_map()),
		}
	}
	pub fn assert_log(&self, module: &str, line: &str, count: usize) {
		let log_entries = self.lines.lock().unwrap();
		assert_eq!(log_entries.get(&(module.to_owned(), line.to_owned())), Some(&count));
	}

	/// Search for the number of occurrence of the logged lines which
	/// 1. belongs to the specified module and
	/// 2. contains `line` in it.
	/// And asserts if the number of occurrences is the same with the given `count`
	pub fn assert_log_contains(&self, module: &str, line: &str, count: usize) {
		let log_entries = self.lines.lock().unwrap();
		let l: usize = log_entries
			.iter()
			.filter(|&(&(ref m, ref l), _c)| m == module && l.contains(line))
			.map(|(_, c)| c)
			.sum();
		assert_eq!(l, count)
	}

	/// Search for the number of occurrences of logged lines which
	/// 1. belong to the specified module and
	/// 2. match the given regex pattern.
	/// Assert that the number of occurrences equals the given `count`
	pub fn assert_log_regex(&self, module: &str, pattern: regex::Regex, count: usize) {
		let log_entries = self.lines.lock().unwrap();
		let l: usize = log_entries
			.iter()
			.filter(|&(&(ref m, ref l), _c)| m == module && pattern.is_match(&l))
			.map(|(_, c)| c)
			.sum();
		assert_eq!(l, count)
	}

	/// Asserts that `count` records from `module` were tagged with the RPC operation `method`.
	pub fn assert_log_method_contains(&self, module: &str, method: &str, count: usize) {
		let methods = self.methods.lock().unwrap();
		let l: usize = methods
			.iter()
			.filter(|&(&(ref m, ref rpc), _c)| m == module && rpc == method)
			.map(|(_, c)| c)
			.sum();
		assert_eq!(l, count)
	}
}

impl Logger for TestLogger {
	fn log(&self, record: Record) {
		*self
			.lines
			.lock()
			.unwrap()
			.entry((record.module_path.to_string(), format!("{}", record.args)))
			.or_insert(0) += 1;
		if let Some(method) = record.method {
			*self
				.methods
				.lock()
				.unwrap()
				.entry((record.module_path.to_string(), method.to_string()))
				.or_insert(0) += 1;
		}
		if record.level >= self.level {
			println!("{}", record);
		}
	}
}

pub struct TestBroadcaster {
	pub txn_broadcasted: Mutex<Vec<Transaction>>,
	/// If set, every broadcast is rejected with this reason.
	pub reject_with: Mutex<Option<String>>,
}

impl TestBroadcaster {
	pub fn new() -> TestBroadcaster {
		TestBroadcaster { txn_broadcasted: Mutex::new(Vec::new()), reject_with: Mutex::new(None) }
	}
}

impl BroadcasterInterface for TestBroadcaster {
	fn broadcast_transaction(&self, tx: &Transaction) -> Result<Txid, WalletError> {
		if let Some(reason) = self.reject_with.lock().unwrap().as_ref() {
			return Err(WalletError::new(reason));
		}
		self.txn_broadcasted.lock().unwrap().push(tx.clone());
		Ok(tx.compute_txid())
	}
}

pub struct TestChainSource {
	pub status: Mutex<Result<SyncStatus, WalletError>>,
	pub block_hashes: Mutex<HashMap<u32, BlockHash>>,
}

impl TestChainSource {
	pub fn new(height: u32) -> TestChainSource {
		TestChainSource {
			status: Mutex::new(Ok(SyncStatus {
				local_height: height,
				server_height: height,
				up_to_date: true,
			})),
			block_hashes: Mutex::new(new_hash_map()),
		}
	}
}

impl ChainSource for TestChainSource {
	fn sync_status(&self) -> Result<SyncStatus, WalletError> {
		self.status.lock().unwrap().clone()
	}

	fn block_hash_at(&self, height: u32) -> Option<BlockHash> {
		self.block_hashes.lock().unwrap().get(&height).copied()
	}
}

/// An in-memory wallet holding a fixed list of P2WPKH keys.
pub struct TestWallet {
	keys: Vec<(Address, SecretKey, PublicKey)>,
	next_address: Mutex<usize>,
	pub utxos: Mutex<Vec<Utxo>>,
	pub transactions: Mutex<HashMap<Txid, Transaction>>,
	pub history: Mutex<Vec<TransactionDetails>>,
	pub root_key: [u8; 32],
	/// The fee passed to the last [`WalletSource::create_transaction`] call.
	pub last_fee: Mutex<Option<Amount>>,
	/// If set, every fallible call fails with this reason.
	pub fail_with: Mutex<Option<String>>,
}

impl TestWallet {
	pub fn new(network: Network, secrets: Vec<SecretKey>) -> TestWallet {
		let secp_ctx = Secp256k1::signing_only();
		let keys = secrets
			.into_iter()
			.map(|secret| {
				let pubkey = PublicKey::from_secret_key(&secp_ctx, &secret);
				(Address::p2wpkh(&CompressedPublicKey(pubkey), network), secret, pubkey)
			})
			.collect();
		TestWallet {
			keys,
			next_address: Mutex::new(0),
			utxos: Mutex::new(Vec::new()),
			transactions: Mutex::new(new_hash_map()),
			history: Mutex::new(Vec::new()),
			root_key: [0x5a; 32],
			last_fee: Mutex::new(None),
			fail_with: Mutex::new(None),
		}
	}

	pub fn script_pubkey(&self, idx: usize) -> ScriptBuf {
		self.keys[idx].0.script_pubkey()
	}

	pub fn address(&self, idx: usize) -> Address {
		self.keys[idx].0.clone()
	}

	pub fn public_key(&self, idx: usize) -> PublicKey {
		self.keys[idx].2
	}

	/// Adds a transaction to the wallet and records each of its outputs paying to key `idx` as
	/// spendable with `confirmations` confirmations.
	pub fn receive(&self, tx: Transaction, idx: usize, confirmations: u32) {
		let txid = tx.compute_txid();
		let script_pubkey = self.script_pubkey(idx);
		let mut utxos = self.utxos.lock().unwrap();
		for (vout, output) in tx.output.iter().enumerate() {
			if output.script_pubkey == script_pubkey {
				utxos.push(Utxo {
					outpoint: bitcoin::OutPoint { txid, vout: vout as u32 },
					output: output.clone(),
					confirmations,
				});
			}
		}
		self.transactions.lock().unwrap().insert(txid, tx);
	}

	fn check_failure(&self) -> Result<(), WalletError> {
		match self.fail_with.lock().unwrap().as_ref() {
			Some(reason) => Err(WalletError::new(reason)),
			None => Ok(()),
		}
	}
}

impl WalletSource for TestWallet {
	fn confirmed_balance(&self, min_confs: u32) -> Result<Amount, WalletError> {
		self.check_failure()?;
		Ok(self.list_unspent(min_confs)?.iter().map(|utxo| utxo.output.value).sum())
	}

	fn new_address(&self) -> Result<Address, WalletError> {
		self.check_failure()?;
		if self.keys.is_empty() {
			return Err(WalletError::new("wallet has no keys"));
		}
		let mut next = self.next_address.lock().unwrap();
		let address = self.keys[*next % self.keys.len()].0.clone();
		*next += 1;
		Ok(address)
	}

	fn list_unspent(&self, min_confs: u32) -> Result<Vec<Utxo>, WalletError> {
		self.check_failure()?;
		Ok(self
			.utxos
			.lock()
			.unwrap()
			.iter()
			.filter(|utxo| utxo.confirmations >= min_confs)
			.cloned()
			.collect())
	}

	fn unused_public_keys(&self) -> Result<Vec<PublicKey>, WalletError> {
		self.check_failure()?;
		Ok(self.keys.iter().map(|(_, _, pubkey)| *pubkey).collect())
	}

	fn secret_key_for_address(&self, address: &Address) -> Result<SecretKey, WalletError> {
		self.check_failure()?;
		self.keys
			.iter()
			.find(|(addr, _, _)| addr == address)
			.map(|(_, secret, _)| *secret)
			.ok_or_else(|| WalletError::new(format!("No key for address {}", address)))
	}

	fn get_transaction(&self, txid: &Txid) -> Option<Transaction> {
		self.transactions.lock().unwrap().get(txid).cloned()
	}

	fn create_transaction(&self, outputs: Vec<TxOut>, fee: Amount) -> Result<Transaction, WalletError> {
		self.check_failure()?;
		*self.last_fee.lock().unwrap() = Some(fee);
		let utxos = self.list_unspent(1)?;
		let available: Amount = utxos.iter().map(|utxo| utxo.output.value).sum();
		let needed: Amount = outputs.iter().map(|output| output.value).sum::<Amount>() + fee;
		if available < needed {
			return Err(WalletError::new(format!("Insufficient funds: {} < {}", available, needed)));
		}
		let input = utxos
			.iter()
			.map(|utxo| TxIn {
				previous_output: utxo.outpoint,
				script_sig: ScriptBuf::new(),
				sequence: Sequence::ENABLE_RBF_NO_LOCKTIME,
				witness: Witness::new(),
			})
			.collect();
		Ok(Transaction { version: Version::TWO, lock_time: LockTime::ZERO, input, output: outputs })
	}

	fn transaction_history(&self) -> Result<Vec<TransactionDetails>, WalletError> {
		self.check_failure()?;
		Ok(self.history.lock().unwrap().clone())
	}

	fn root_key(&self) -> Result<[u8; 32], WalletError> {
		self.check_failure()?;
		Ok(self.root_key)
	}
}

/// A transaction paying `values` to `script_pubkey`, spending a made-up outpoint tagged `tag`.
pub fn funding_tx(tag: u8, script_pubkey: &ScriptBuf, values: &[u64]) -> Transaction {
	Transaction {
		version: Version::TWO,
		lock_time: LockTime::ZERO,
		input: vec![TxIn {
			previous_output: bitcoin::OutPoint { txid: Txid::from_byte_array([tag; 32]), vout: 0 },
			script_sig: ScriptBuf::new(),
			sequence: Sequence::MAX,
			witness: Witness::new(),
		}],
		output: values
			.iter()
			.map(|value| TxOut { value: Amount::from_sat(*value), script_pubkey: script_pubkey.clone() })
			.collect(),
	}
}
