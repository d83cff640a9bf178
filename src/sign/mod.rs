// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Provides keys to the signer and defines how individual inputs are signed.
//!
//! The [`InputScriptBuilder`] looks up the wallet key behind a [`SignDescriptor`], applies any
//! per-commitment or revocation tweak, computes the BIP 143 signature hash and produces either a
//! bare signature or a complete P2WPKH witness.

use bitcoin::address::AddressType;
use bitcoin::blockdata::script::ScriptBuf;
use bitcoin::blockdata::transaction::{Transaction, TxOut};
use bitcoin::blockdata::witness::Witness;
use bitcoin::key::CompressedPublicKey;
use bitcoin::secp256k1::{self, PublicKey, Secp256k1, SecretKey};
use bitcoin::Address;

use crate::chain::walletinterface::WalletSource;
use crate::ln::chan_utils;
use crate::sign::sighash::{
	build_witness_sighash_preimage, check_sighash_type, compute_witness_sighash, TxSigHashes,
};
use crate::util::config::SignerConfig;
use crate::util::crypto::{sha256d, sign_digest_der};
use crate::util::errors::SignerError;
use crate::util::logger::Logger;

use core::ops::Deref;

pub mod key_pool;
pub mod sighash;

/// Information about how to sign one transaction input, validated and strongly typed.
///
/// Built from the wire-level [`crate::ln::msgs::SignDescriptor`] with `TryFrom`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignDescriptor {
	/// The public key of the key to sign with, before any tweak is applied. If unset, the key is
	/// looked up by the address of [`SignDescriptor::output`].
	pub pub_key: Option<PublicKey>,
	/// The BIP 143 aggregates for the transaction being signed.
	pub sig_hashes: TxSigHashes,
	/// The index of the input being signed.
	pub input_index: u32,
	/// An additive tweak, usually `SHA256(per_commitment_point || base_point)`. See
	/// [`chan_utils::single_tweak_bytes`].
	pub single_tweak: Option<[u8; 32]>,
	/// The counterparty secret to combine our key with into a revocation key. See
	/// [`chan_utils::derive_private_revocation_key`].
	pub double_tweak: Option<SecretKey>,
	/// The sighash type. 0 means "use [`SignerConfig::sighash_type`]".
	pub hash_type: u8,
	/// The script the signature hash commits to for raw signatures.
	pub witness_script: ScriptBuf,
	/// The output being spent.
	pub output: TxOut,
}

/// A fully formed input script for one input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputScript {
	/// The scriptSig, empty for native segwit inputs.
	pub script_sig: ScriptBuf,
	/// The witness stack.
	pub witness: Witness,
}

/// Signs inputs with keys held by a [`WalletSource`].
pub struct InputScriptBuilder<W: Deref, L: Deref>
where
	W::Target: WalletSource,
	L::Target: Logger,
{
	pub(crate) wallet: W,
	pub(crate) logger: L,
	config: SignerConfig,
	secp_ctx: Secp256k1<secp256k1::All>,
}

impl<W: Deref, L: Deref> InputScriptBuilder<W, L>
where
	W::Target: WalletSource,
	L::Target: Logger,
{
	/// Constructs a new builder signing with keys from `wallet`.
	pub fn new(wallet: W, logger: L, config: SignerConfig) -> Self {
		InputScriptBuilder { wallet, logger, config, secp_ctx: Secp256k1::new() }
	}

	/// Returns the configuration this builder signs with.
	pub fn config(&self) -> &SignerConfig {
		&self.config
	}

	fn hash_type(&self, desc: &SignDescriptor) -> Result<u8, SignerError> {
		let hash_type = if desc.hash_type == 0 { self.config.sighash_type } else { desc.hash_type };
		check_sighash_type(hash_type)?;
		Ok(hash_type)
	}

	fn address_for_script(&self, script: &ScriptBuf) -> Result<Address, SignerError> {
		Address::from_script(script, self.config.network).map_err(|e| {
			SignerError::UnsupportedScriptType { err: format!("Output script has no address: {}", e) }
		})
	}

	fn tweaked_key(&self, desc: &SignDescriptor, address: &Address) -> Result<SecretKey, SignerError> {
		let base_secret = self.wallet.secret_key_for_address(address)?;
		chan_utils::maybe_tweak_private_key(&self.secp_ctx, desc, &base_secret)
	}

	/// Signs input `desc.input_index` of `tx` over `desc.witness_script` and returns the
	/// DER-encoded signature without a trailing sighash type byte.
	///
	/// The key is the wallet's key for the P2WPKH address of `desc.pub_key` if set, or for the
	/// address of `desc.output` otherwise, tweaked as the descriptor asks.
	pub fn sign_output_raw(&self, tx: &Transaction, desc: &SignDescriptor) -> Result<Vec<u8>, SignerError> {
		let hash_type = self.hash_type(desc)?;
		let address = match desc.pub_key {
			Some(pub_key) => Address::p2wpkh(&CompressedPublicKey(pub_key), self.config.network),
			None => self.address_for_script(&desc.output.script_pubkey)?,
		};
		let key = self.tweaked_key(desc, &address)?;

		let preimage = build_witness_sighash_preimage(
			&desc.witness_script, &desc.sig_hashes, hash_type, tx, desc.input_index, desc.output.value,
		)?;
		log_trace!(self.logger, "Signature hash preimage for input {}: {}", desc.input_index,
			log_bytes!(preimage[..]));
		let sig = sign_digest_der(&self.secp_ctx, sha256d(&preimage), &key);
		log_trace!(self.logger, "Signed input {} of {} with key {}", desc.input_index,
			tx.compute_txid(), log_pubkey!(PublicKey::from_secret_key(&self.secp_ctx, &key)));
		Ok(sig)
	}

	/// Builds the complete input script spending `desc.output` as input `desc.input_index` of
	/// `tx`.
	///
	/// Only native P2WPKH outputs are supported. P2SH-nested P2WPKH and every other script type
	/// fail with [`SignerError::UnsupportedScriptType`].
	pub fn compute_input_script(&self, tx: &Transaction, desc: &SignDescriptor) -> Result<InputScript, SignerError> {
		let hash_type = self.hash_type(desc)?;
		let address = self.address_for_script(&desc.output.script_pubkey)?;
		match address.address_type() {
			Some(AddressType::P2wpkh) => {},
			Some(AddressType::P2sh) => {
				return Err(SignerError::UnsupportedScriptType {
					err: "Nested P2SH-P2WPKH inputs are not supported".to_owned(),
				})
			},
			other => {
				return Err(SignerError::UnsupportedScriptType {
					err: format!("Cannot build an input script for address type {:?}", other),
				})
			},
		}
		let key = self.tweaked_key(desc, &address)?;

		// For native outputs the witness program is the output script itself.
		let witness_program = &desc.output.script_pubkey;
		let sighash = compute_witness_sighash(
			witness_program, &desc.sig_hashes, hash_type, tx, desc.input_index, desc.output.value,
		)?;
		let mut sig = sign_digest_der(&self.secp_ctx, sighash, &key);
		sig.push(hash_type);
		let pub_key = PublicKey::from_secret_key(&self.secp_ctx, &key);
		log_trace!(self.logger, "Built witness for input {} of {} with key {}", desc.input_index,
			tx.compute_txid(), log_pubkey!(pub_key));

		Ok(InputScript {
			script_sig: ScriptBuf::new(),
			witness: Witness::from_slice(&[sig, pub_key.serialize().to_vec()]),
		})
	}
}
