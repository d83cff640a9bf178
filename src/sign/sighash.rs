// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! BIP 143 signature hashes for segwit v0 inputs.
//!
//! The three per-transaction aggregates (previous outpoints, sequences and outputs) are computed
//! once by the caller and handed to us in a [`TxSigHashes`], so signing many inputs of one
//! transaction does not rehash the whole transaction per input.

use bitcoin::blockdata::script::Script;
use bitcoin::blockdata::transaction::Transaction;
use bitcoin::consensus::encode::{self, VarInt};
use bitcoin::hashes::Hash;
use bitcoin::Amount;

use crate::chain::transaction::RawTransaction;
use crate::ln::script::{p2pkh_script_code, witness_pubkey_hash};
use crate::util::crypto::sha256d;
use crate::util::errors::SignerError;

/// Commit to every input and every output.
pub const SIGHASH_ALL: u8 = 0x01;
/// Commit to no outputs. Not supported for signing.
pub const SIGHASH_NONE: u8 = 0x02;
/// Commit only to the output at the signed input's index. Not supported for signing.
pub const SIGHASH_SINGLE: u8 = 0x03;
/// Commit only to the signed input, letting others add inputs.
pub const SIGHASH_ANYONECANPAY: u8 = 0x80;
/// Masks out the `ANYONECANPAY` bit, leaving the output-commitment mode.
pub const SIGHASH_MASK: u8 = 0x1f;

/// The per-transaction aggregate hashes BIP 143 reuses across inputs.
///
/// Each field is the double-SHA256 of the relevant transaction parts in display byte order, i.e.
/// reversed relative to how it appears in the signature hash preimage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TxSigHashes {
	/// Hash of all input outpoints.
	pub hash_prev_outs: [u8; 32],
	/// Hash of all input sequence numbers.
	pub hash_sequence: [u8; 32],
	/// Hash of all outputs.
	pub hash_outputs: [u8; 32],
}

#[inline]
fn reversed(hash: &[u8; 32]) -> [u8; 32] {
	let mut res = *hash;
	res.reverse();
	res
}

/// Fails for the output-commitment modes we do not implement.
pub fn check_sighash_type(hash_type: u8) -> Result<(), SignerError> {
	let mode = hash_type & SIGHASH_MASK;
	if mode == SIGHASH_SINGLE || mode == SIGHASH_NONE {
		return Err(SignerError::UnsupportedSigHashMode { sighash_type: hash_type });
	}
	Ok(())
}

/// Builds the BIP 143 signature hash preimage for input `input_index` of `tx`, spending an output
/// worth `amount` locked by `subscript`.
///
/// A P2WPKH witness program as `subscript` is replaced by its P2PKH script code, anything else
/// (e.g. a P2WSH witness script) is committed to verbatim.
pub fn build_witness_sighash_preimage(
	subscript: &Script, sighashes: &TxSigHashes, hash_type: u8, tx: &Transaction,
	input_index: u32, amount: Amount,
) -> Result<Vec<u8>, SignerError> {
	check_sighash_type(hash_type)?;
	if subscript.is_empty() {
		return Err(SignerError::InvalidRequest { err: "Empty subscript".to_owned() });
	}
	let txin = tx
		.input
		.get(input_index as usize)
		.ok_or(SignerError::InvalidInputIndex { index: input_index, input_count: tx.input.len() })?;

	let anyone_can_pay = hash_type & SIGHASH_ANYONECANPAY != 0;
	let mode = hash_type & SIGHASH_MASK;

	let mut preimage = Vec::with_capacity(156 + subscript.len());
	preimage.extend_from_slice(&tx.version.0.to_le_bytes());
	if anyone_can_pay {
		preimage.extend_from_slice(&[0; 32]);
	} else {
		preimage.extend_from_slice(&reversed(&sighashes.hash_prev_outs));
	}
	if anyone_can_pay || mode == SIGHASH_SINGLE || mode == SIGHASH_NONE {
		preimage.extend_from_slice(&[0; 32]);
	} else {
		preimage.extend_from_slice(&reversed(&sighashes.hash_sequence));
	}

	preimage.extend_from_slice(&txin.previous_output.txid.to_byte_array());
	preimage.extend_from_slice(&txin.previous_output.vout.to_le_bytes());

	match witness_pubkey_hash(subscript) {
		Some(pubkey_hash) => preimage.extend_from_slice(&p2pkh_script_code(&pubkey_hash)),
		None => {
			preimage.extend_from_slice(&encode::serialize(&VarInt(subscript.len() as u64)));
			preimage.extend_from_slice(subscript.as_bytes());
		},
	}

	preimage.extend_from_slice(&amount.to_sat().to_le_bytes());
	preimage.extend_from_slice(&txin.sequence.0.to_le_bytes());
	// SINGLE and NONE were rejected above, so we always commit to every output.
	preimage.extend_from_slice(&reversed(&sighashes.hash_outputs));
	preimage.extend_from_slice(&tx.lock_time.to_consensus_u32().to_le_bytes());
	preimage.extend_from_slice(&(hash_type as u32).to_le_bytes());
	Ok(preimage)
}

/// Computes the BIP 143 signature hash for input `input_index` of `tx`. See
/// [`build_witness_sighash_preimage`] for the parameters.
pub fn compute_witness_sighash(
	subscript: &Script, sighashes: &TxSigHashes, hash_type: u8, tx: &Transaction,
	input_index: u32, amount: Amount,
) -> Result<[u8; 32], SignerError> {
	let preimage =
		build_witness_sighash_preimage(subscript, sighashes, hash_type, tx, input_index, amount)?;
	Ok(sha256d(&preimage))
}

/// As [`compute_witness_sighash`], parsing the transaction from its wire form first.
pub fn compute_witness_sighash_raw(
	subscript: &Script, sighashes: &TxSigHashes, hash_type: u8, raw_tx: &RawTransaction,
	input_index: u32, amount: Amount,
) -> Result<[u8; 32], SignerError> {
	let tx = raw_tx.parse()?;
	compute_witness_sighash(subscript, sighashes, hash_type, &tx, input_index, amount)
}
