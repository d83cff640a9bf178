// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! The top-level signer object and its one-method-per-RPC surface.
//!
//! [`SignerManager`] owns everything a request may touch: the wallet (through an
//! [`InputScriptBuilder`]), the broadcaster, the chain source, the set of locked outpoints and the
//! allocator for raw keys. It is built once at startup and handed every request in turn.
//!
//! Malformed requests are logged and returned as `Err`. Operations which depend on the network
//! ([`SignerManager::send_outputs`], [`SignerManager::publish_transaction`]) or on a key having
//! been issued ([`SignerManager::sign_message`]) instead always return a response with a
//! `success` flag and an error string.

use bitcoin::blockdata::transaction::{self, Transaction};
use bitcoin::key::CompressedPublicKey;
use bitcoin::secp256k1::{self, PublicKey, Secp256k1};
use bitcoin::{Address, Amount};

use crate::chain::chaininterface::{BroadcasterInterface, ChainSource};
use crate::chain::locks::OutpointLockSet;
use crate::chain::transaction::RawTransaction;
use crate::chain::walletinterface::WalletSource;
use crate::ln::msgs;
use crate::ln::script::is_witness_pubkey_hash;
use crate::sign::key_pool::KeyAllocator;
use crate::sign::{InputScriptBuilder, SignDescriptor};
use crate::util::config::SignerConfig;
use crate::util::crypto::{sha256d, sign_digest_der};
use crate::util::errors::{ErrorCategory, SignerError};
use crate::util::logger::{Logger, WithContext};

use core::ops::Deref;
use std::sync::Mutex;

fn logged<LG: Logger + ?Sized>(logger: &LG, err: SignerError) -> SignerError {
	match err.category() {
		ErrorCategory::Collaborator | ErrorCategory::ResourceState => {
			log_warn!(logger, "{}", err);
		},
		ErrorCategory::Precondition | ErrorCategory::Unsupported => {
			log_error!(logger, "{}", err);
		},
	}
	err
}

fn sign_descriptor<LG: Logger + ?Sized>(
	logger: &LG, desc: &msgs::SignDescriptor,
) -> Result<SignDescriptor, SignerError> {
	SignDescriptor::try_from(desc).map_err(|e| {
		log_error!(logger,
			"Rejected sign descriptor with a {}-byte pub_key, {}-byte single_tweak, {}-byte double_tweak, hash_type {} and {}/{}/{}-byte sighash aggregates: {}",
			desc.pub_key.len(), desc.single_tweak.len(), desc.double_tweak.len(), desc.hash_type,
			desc.sig_hashes.hash_prev_outs.len(), desc.sig_hashes.hash_sequence.len(),
			desc.sig_hashes.hash_outputs.len(), e);
		e
	})
}

fn parse_tx<LG: Logger + ?Sized>(logger: &LG, bytes: &[u8]) -> Result<Transaction, SignerError> {
	RawTransaction::from(bytes.to_vec()).parse().map_err(|e| logged(logger, e))
}

/// Serves every RPC of the signer.
///
/// `W`, `B`, `C` and `L` are usually references or `Arc`s to the wallet, broadcaster, chain
/// source and logger implementations respectively.
pub struct SignerManager<W: Deref, B: Deref, C: Deref, L: Deref>
where
	W::Target: WalletSource,
	B::Target: BroadcasterInterface,
	C::Target: ChainSource,
	L::Target: Logger,
{
	signer: InputScriptBuilder<W, L>,
	broadcaster: B,
	chain_source: C,
	locked_outpoints: OutpointLockSet,
	key_allocator: Mutex<KeyAllocator>,
	secp_ctx: Secp256k1<secp256k1::SignOnly>,
}

impl<W: Deref, B: Deref, C: Deref, L: Deref> SignerManager<W, B, C, L>
where
	W::Target: WalletSource,
	B::Target: BroadcasterInterface,
	C::Target: ChainSource,
	L::Target: Logger,
{
	/// Constructs a new `SignerManager` with no locked outpoints and no issued keys.
	pub fn new(wallet: W, broadcaster: B, chain_source: C, logger: L, config: SignerConfig) -> Self {
		SignerManager {
			signer: InputScriptBuilder::new(wallet, logger, config),
			broadcaster,
			chain_source,
			locked_outpoints: OutpointLockSet::new(),
			key_allocator: Mutex::new(KeyAllocator::new()),
			secp_ctx: Secp256k1::signing_only(),
		}
	}

	/// Returns the configuration the manager was built with.
	pub fn config(&self) -> &SignerConfig {
		self.signer.config()
	}

	/// Returns the outpoints locked through [`Self::lock_outpoint`].
	pub fn locked_outpoints(&self) -> &OutpointLockSet {
		&self.locked_outpoints
	}

	/// Returns the wallet's root key.
	pub fn fetch_root_key(&self) -> Result<msgs::FetchRootKeyResponse, SignerError> {
		let logger = WithContext::from(&self.signer.logger, Some("FetchRootKey"));
		let root_key = self.signer.wallet.root_key().map_err(|e| logged(&logger, e.into()))?;
		Ok(msgs::FetchRootKeyResponse { root_key: root_key.to_vec() })
	}

	/// Returns the sum of the wallet's outputs with at least `confirmations` confirmations.
	///
	/// The `witness` flag is accepted but has no effect as every output we hold is a witness
	/// output.
	pub fn confirmed_balance(
		&self, req: &msgs::ConfirmedBalanceRequest,
	) -> Result<msgs::ConfirmedBalanceResponse, SignerError> {
		let logger = WithContext::from(&self.signer.logger, Some("ConfirmedBalance"));
		let amount = self
			.signer
			.wallet
			.confirmed_balance(req.confirmations)
			.map_err(|e| logged(&logger, e.into()))?;
		Ok(msgs::ConfirmedBalanceResponse { amount: amount.to_sat() })
	}

	/// Returns a fresh receive address. Only [`msgs::AddressType::WitnessPubkeyHash`] is
	/// supported.
	pub fn new_address(
		&self, req: &msgs::NewAddressRequest,
	) -> Result<msgs::NewAddressResponse, SignerError> {
		let logger = WithContext::from(&self.signer.logger, Some("NewAddress"));
		match req.address_type {
			msgs::AddressType::WitnessPubkeyHash => {},
			other => {
				return Err(logged(&logger, SignerError::UnsupportedAddressType {
					err: format!("Cannot generate {:?} addresses", other),
				}))
			},
		}
		let address = self.signer.wallet.new_address().map_err(|e| logged(&logger, e.into()))?;
		log_debug!(logger, "Handing out address {}", address);
		Ok(msgs::NewAddressResponse { address: address.to_string() })
	}

	/// Lists the wallet's spendable outputs with at least `min_confirmations` confirmations,
	/// leaving out locked outpoints.
	///
	/// P2SH outputs are taken to be nested P2WPKH, as [`WalletSource::list_unspent`] requires.
	/// Outputs which are neither are skipped.
	pub fn list_unspent_witness(
		&self, req: &msgs::ListUnspentWitnessRequest,
	) -> Result<msgs::ListUnspentWitnessResponse, SignerError> {
		let logger = WithContext::from(&self.signer.logger, Some("ListUnspentWitness"));
		let utxos = self
			.signer
			.wallet
			.list_unspent(req.min_confirmations)
			.map_err(|e| logged(&logger, e.into()))?;

		let mut res = Vec::new();
		for utxo in self.locked_outpoints.filter_unlocked(utxos, &&logger) {
			let script = &utxo.output.script_pubkey;
			let address_type = if is_witness_pubkey_hash(script) {
				msgs::AddressType::WitnessPubkeyHash
			} else if script.is_p2sh() {
				msgs::AddressType::NestedPubkeyHash
			} else {
				log_debug!(logger, "Skipping non-witness output {}", utxo.outpoint);
				continue;
			};
			res.push(msgs::Utxo {
				address_type,
				redeem_script: Vec::new(),
				pk_script: script.to_bytes(),
				value: utxo.output.value.to_sat(),
				confirmations: utxo.confirmations,
				out_point: (&utxo.outpoint).into(),
			});
		}
		Ok(msgs::ListUnspentWitnessResponse { utxos: res })
	}

	/// Hands out a wallet public key which was never handed out before.
	pub fn new_raw_key(&self) -> Result<msgs::NewRawKeyResponse, SignerError> {
		let logger = WithContext::from(&self.signer.logger, Some("NewRawKey"));
		let pool = self.signer.wallet.unused_public_keys().map_err(|e| logged(&logger, e.into()))?;
		let key = self
			.key_allocator
			.lock()
			.unwrap()
			.issue_next(&pool)
			.map_err(|e| logged(&logger, e))?;
		log_debug!(logger, "Issued raw key {}", log_pubkey!(key));
		Ok(msgs::NewRawKeyResponse { public_key: key.serialize().to_vec() })
	}

	/// Looks up the output spent by `req.out_point`.
	///
	/// If the transaction is not one of the wallet's own, `mine` is false and no output is
	/// returned.
	pub fn fetch_input_info(
		&self, req: &msgs::FetchInputInfoRequest,
	) -> Result<msgs::FetchInputInfoResponse, SignerError> {
		let logger = WithContext::from(&self.signer.logger, Some("FetchInputInfo"));
		let outpoint =
			transaction::OutPoint::try_from(&req.out_point).map_err(|e| logged(&logger, e))?;
		let tx = match self.signer.wallet.get_transaction(&outpoint.txid) {
			Some(tx) => tx,
			None => {
				log_debug!(logger, "Transaction {} is not ours", outpoint.txid);
				return Ok(msgs::FetchInputInfoResponse { mine: false, tx_out: None });
			},
		};
		let output = tx.output.get(outpoint.vout as usize).ok_or_else(|| {
			logged(&logger, SignerError::InvalidRequest {
				err: format!("{} has only {} outputs", outpoint.txid, tx.output.len()),
			})
		})?;
		if let Err(e) = Address::from_script(&output.script_pubkey, self.config().network) {
			return Err(logged(&logger, SignerError::UnsupportedScriptType {
				err: format!("Output {} does not pay to an address: {}", outpoint, e),
			}));
		}
		Ok(msgs::FetchInputInfoResponse { mine: true, tx_out: Some(output.into()) })
	}

	/// Builds, signs and broadcasts a transaction paying to `req.outputs`, paying
	/// [`SignerConfig::send_outputs_fee_sats`] in fees.
	pub fn send_outputs(&self, req: &msgs::SendOutputsRequest) -> msgs::SendOutputsResponse {
		let logger = WithContext::from(&self.signer.logger, Some("SendOutputs"));
		let outputs: Vec<transaction::TxOut> = req.outputs.iter().map(|txout| txout.into()).collect();
		let fee = Amount::from_sat(self.config().send_outputs_fee_sats);
		let tx = match self.signer.wallet.create_transaction(outputs, fee) {
			Ok(tx) => tx,
			Err(e) => {
				log_warn!(logger, "Could not create transaction: {}", e);
				return msgs::SendOutputsResponse {
					success: false,
					error: e.err,
					result_hash: String::new(),
				};
			},
		};
		match self.broadcaster.broadcast_transaction(&tx) {
			Ok(txid) => {
				log_info!(logger, "Broadcast {}", log_tx!(tx));
				msgs::SendOutputsResponse {
					success: true,
					error: String::new(),
					result_hash: txid.to_string(),
				}
			},
			Err(e) => {
				log_warn!(logger, "Could not broadcast {}: {}", tx.compute_txid(), e);
				msgs::SendOutputsResponse {
					success: false,
					error: format!("SendOutputs: Could not broadcast: {}", e),
					result_hash: String::new(),
				}
			},
		}
	}

	/// We are synced once the backend reports its history is up to date and our header chain
	/// has reached the server's tip.
	pub fn is_synced(&self) -> Result<msgs::IsSyncedResponse, SignerError> {
		let logger = WithContext::from(&self.signer.logger, Some("IsSynced"));
		let status = self.chain_source.sync_status().map_err(|e| logged(&logger, e.into()))?;
		log_trace!(logger, "Local height {}, server height {}, up to date: {}",
			status.local_height, status.server_height, status.up_to_date);
		Ok(msgs::IsSyncedResponse { synced: status.is_synced() })
	}

	/// Signs the double-SHA256 of `req.message_to_be_signed` with the key behind `req.pub_key`.
	///
	/// Only keys handed out by [`Self::new_raw_key`] may be used.
	pub fn sign_message(&self, req: &msgs::SignMessageRequest) -> msgs::SignMessageResponse {
		let logger = WithContext::from(&self.signer.logger, Some("SignMessage"));
		let failure = |err: String| {
			log_warn!(logger, "Refusing to sign message: {}", err);
			msgs::SignMessageResponse { signature: Vec::new(), success: false, error: err }
		};

		let pub_key = match PublicKey::from_slice(&req.pub_key) {
			Ok(pub_key) => pub_key,
			Err(e) => return failure(format!("Invalid pub_key: {}", e)),
		};
		if !self.key_allocator.lock().unwrap().is_issued(&pub_key) {
			return failure(format!("Key {} was not issued by NewRawKey", log_pubkey!(pub_key)));
		}
		let address = Address::p2wpkh(&CompressedPublicKey(pub_key), self.config().network);
		let secret = match self.signer.wallet.secret_key_for_address(&address) {
			Ok(secret) => secret,
			Err(e) => return failure(e.err),
		};

		let digest = sha256d(&req.message_to_be_signed);
		let signature = sign_digest_der(&self.secp_ctx, digest, &secret);
		log_trace!(logger, "Signed message with key {}", log_pubkey!(pub_key));
		msgs::SignMessageResponse { signature, success: true, error: String::new() }
	}

	/// Reserves an outpoint so [`Self::list_unspent_witness`] no longer returns it.
	pub fn lock_outpoint(&self, req: &msgs::LockOutpointRequest) -> Result<(), SignerError> {
		let logger = WithContext::from(&self.signer.logger, Some("LockOutpoint"));
		let outpoint =
			transaction::OutPoint::try_from(&req.outpoint).map_err(|e| logged(&logger, e))?;
		self.locked_outpoints.lock(&outpoint);
		log_debug!(logger, "Locked outpoint {}", outpoint);
		Ok(())
	}

	/// Releases an outpoint locked with [`Self::lock_outpoint`].
	pub fn unlock_outpoint(&self, req: &msgs::UnlockOutpointRequest) -> Result<(), SignerError> {
		let logger = WithContext::from(&self.signer.logger, Some("UnlockOutpoint"));
		let outpoint =
			transaction::OutPoint::try_from(&req.outpoint).map_err(|e| logged(&logger, e))?;
		self.locked_outpoints.unlock(&outpoint).map_err(|e| logged(&logger, e))?;
		log_debug!(logger, "Unlocked outpoint {}", outpoint);
		Ok(())
	}

	/// Lists the wallet's transaction history, resolving the hash of each confirming block.
	pub fn list_transaction_details(
		&self,
	) -> Result<msgs::ListTransactionDetailsResponse, SignerError> {
		let logger = WithContext::from(&self.signer.logger, Some("ListTransactionDetails"));
		let history =
			self.signer.wallet.transaction_history().map_err(|e| logged(&logger, e.into()))?;

		let details = history
			.into_iter()
			.map(|detail| {
				let block_hash = if detail.block_height == 0 {
					log_warn!(logger, "Transaction {} has zero height", detail.txid);
					String::new()
				} else {
					match self.chain_source.block_hash_at(detail.block_height) {
						Some(hash) => hash.to_string(),
						None => {
							log_warn!(logger, "No block known at height {} for {}",
								detail.block_height, detail.txid);
							String::new()
						},
					}
				};
				msgs::TransactionDetail {
					hash: detail.txid.to_string(),
					value: detail.value_sats,
					num_confirmations: detail.confirmations,
					block_hash,
					block_height: detail.block_height,
					timestamp: detail.timestamp,
					total_fees: detail.total_fees.map(|fee| fee.to_sat()).unwrap_or(0),
				}
			})
			.collect();
		Ok(msgs::ListTransactionDetailsResponse { details })
	}

	/// Signs one input of `req.tx` as described by `req.sign_desc` and returns the DER signature
	/// without a sighash type byte.
	pub fn sign_output_raw(
		&self, req: &msgs::SignOutputRawRequest,
	) -> Result<msgs::SignOutputRawResponse, SignerError> {
		let logger = WithContext::from(&self.signer.logger, Some("SignOutputRaw"));
		let desc = sign_descriptor(&logger, &req.sign_desc)?;
		let tx = parse_tx(&logger, &req.tx)?;
		let signature = self.signer.sign_output_raw(&tx, &desc).map_err(|e| logged(&logger, e))?;
		Ok(msgs::SignOutputRawResponse { signature })
	}

	/// Builds the complete witness and scriptSig for one input of `req.tx`.
	///
	/// Malformed requests and unsupported script types or sighash modes are returned as `Err`.
	/// Any other failure while signing, such as the wallet not holding the key, is logged and
	/// reported as `Ok(None)`.
	pub fn compute_input_script(
		&self, req: &msgs::ComputeInputScriptRequest,
	) -> Result<Option<msgs::ComputeInputScriptResponse>, SignerError> {
		let logger = WithContext::from(&self.signer.logger, Some("ComputeInputScript"));
		let desc = sign_descriptor(&logger, &req.sign_desc)?;
		let tx = parse_tx(&logger, &req.tx)?;
		match self.signer.compute_input_script(&tx, &desc) {
			Ok(input_script) => Ok(Some(msgs::ComputeInputScriptResponse {
				witness_script: input_script.witness.iter().map(|elem| elem.to_vec()).collect(),
				script_sig: input_script.script_sig.to_bytes(),
			})),
			Err(e) if e.category() == ErrorCategory::Unsupported => Err(logged(&logger, e)),
			Err(e) => {
				log_error!(logger, "Failed to build input script for input {} of {}: {}",
					desc.input_index, tx.compute_txid(), e);
				Ok(None)
			},
		}
	}

	/// Broadcasts a fully signed transaction.
	pub fn publish_transaction(
		&self, req: &msgs::PublishTransactionRequest,
	) -> msgs::PublishTransactionResponse {
		let logger = WithContext::from(&self.signer.logger, Some("PublishTransaction"));
		let tx = match parse_tx(&logger, &req.tx) {
			Ok(tx) => tx,
			Err(e) => {
				return msgs::PublishTransactionResponse { success: false, error: e.to_string() }
			},
		};
		match self.broadcaster.broadcast_transaction(&tx) {
			Ok(txid) => {
				log_info!(logger, "Published {}", txid);
				msgs::PublishTransactionResponse { success: true, error: String::new() }
			},
			Err(e) => {
				log_warn!(logger, "Broadcast of {} failed: {}", tx.compute_txid(), e);
				if e.err.contains("Missing inputs") {
					log_warn!(logger, "Rejected {}", log_tx!(tx));
				}
				msgs::PublishTransactionResponse { success: false, error: e.err }
			},
		}
	}
}
