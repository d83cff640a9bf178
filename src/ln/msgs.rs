// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Wire-level request and response messages for every RPC the signer serves.
//!
//! Fields are kept as loosely typed as they arrive from the transport: byte fields are plain
//! `Vec<u8>`s whose lengths have not been checked yet. Conversion into the strongly typed forms in
//! [`crate::sign`] happens through `TryFrom`, which is where malformed requests are rejected.
//! Serializing these to and from any particular transport is left to the caller.

use bitcoin::blockdata::script::ScriptBuf;
use bitcoin::blockdata::transaction;
use bitcoin::hash_types::Txid;
use bitcoin::hashes::Hash;
use bitcoin::secp256k1::{PublicKey, SecretKey};
use bitcoin::Amount;

use crate::sign::sighash::TxSigHashes as TypedTxSigHashes;
use crate::sign::SignDescriptor as TypedSignDescriptor;
use crate::util::errors::SignerError;

fn array_32(field: &str, bytes: &[u8]) -> Result<[u8; 32], SignerError> {
	<[u8; 32]>::try_from(bytes).map_err(|_| SignerError::InvalidRequest {
		err: format!("{} must be 32 bytes, got {}", field, bytes.len()),
	})
}

/// A reference to a transaction output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutPoint {
	/// The referenced transaction's txid, in internal (not display) byte order.
	pub hash: Vec<u8>,
	/// The index of the referenced output in its transaction's vout.
	pub index: u32,
}

impl TryFrom<&OutPoint> for transaction::OutPoint {
	type Error = SignerError;
	fn try_from(outpoint: &OutPoint) -> Result<Self, SignerError> {
		let txid = Txid::from_byte_array(array_32("outpoint hash", &outpoint.hash)?);
		Ok(transaction::OutPoint { txid, vout: outpoint.index })
	}
}

impl From<&transaction::OutPoint> for OutPoint {
	fn from(outpoint: &transaction::OutPoint) -> Self {
		OutPoint { hash: outpoint.txid.to_byte_array().to_vec(), index: outpoint.vout }
	}
}

/// A transaction output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TxOut {
	/// The output value in satoshis.
	pub value: u64,
	/// The output script.
	pub pk_script: Vec<u8>,
}

impl From<&TxOut> for transaction::TxOut {
	fn from(txout: &TxOut) -> Self {
		transaction::TxOut {
			value: Amount::from_sat(txout.value),
			script_pubkey: ScriptBuf::from(txout.pk_script.clone()),
		}
	}
}

impl From<&transaction::TxOut> for TxOut {
	fn from(txout: &transaction::TxOut) -> Self {
		TxOut { value: txout.value.to_sat(), pk_script: txout.script_pubkey.to_bytes() }
	}
}

/// The BIP 143 aggregate hashes, each expected to be 32 bytes in display byte order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TxSigHashes {
	/// Hash of all input outpoints.
	pub hash_prev_outs: Vec<u8>,
	/// Hash of all input sequence numbers.
	pub hash_sequence: Vec<u8>,
	/// Hash of all outputs.
	pub hash_outputs: Vec<u8>,
}

impl TryFrom<&TxSigHashes> for TypedTxSigHashes {
	type Error = SignerError;
	fn try_from(hashes: &TxSigHashes) -> Result<Self, SignerError> {
		Ok(TypedTxSigHashes {
			hash_prev_outs: array_32("hash_prev_outs", &hashes.hash_prev_outs)?,
			hash_sequence: array_32("hash_sequence", &hashes.hash_sequence)?,
			hash_outputs: array_32("hash_outputs", &hashes.hash_outputs)?,
		})
	}
}

/// Everything needed to sign one input, as sent by the channel state machine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignDescriptor {
	/// The compressed public key to sign with, or empty to use the key behind `output`.
	pub pub_key: Vec<u8>,
	/// The BIP 143 aggregates for the transaction being signed.
	pub sig_hashes: TxSigHashes,
	/// The index of the input being signed.
	pub input_index: u32,
	/// A 32-byte additive tweak, or empty.
	pub single_tweak: Vec<u8>,
	/// A 32-byte counterparty secret for revocation key derivation, or empty.
	pub double_tweak: Vec<u8>,
	/// The sighash type, 0 if unset.
	pub hash_type: u32,
	/// The script committed to by the signature hash.
	pub witness_script: Vec<u8>,
	/// The output being spent.
	pub output: TxOut,
}

impl TryFrom<&SignDescriptor> for TypedSignDescriptor {
	type Error = SignerError;
	fn try_from(desc: &SignDescriptor) -> Result<Self, SignerError> {
		let pub_key = match desc.pub_key.len() {
			0 => None,
			33 => Some(PublicKey::from_slice(&desc.pub_key).map_err(|e| {
				SignerError::InvalidRequest { err: format!("Invalid pub_key: {}", e) }
			})?),
			len => {
				return Err(SignerError::InvalidRequest {
					err: format!("pub_key must be 0 or 33 bytes, got {}", len),
				})
			},
		};
		let single_tweak = match desc.single_tweak.len() {
			0 => None,
			_ => Some(array_32("single_tweak", &desc.single_tweak)?),
		};
		let double_tweak = match desc.double_tweak.len() {
			0 => None,
			32 => Some(SecretKey::from_slice(&desc.double_tweak).map_err(|e| {
				SignerError::InvalidTweak { err: format!("double_tweak is not a valid key: {}", e) }
			})?),
			len => {
				return Err(SignerError::InvalidRequest {
					err: format!("double_tweak must be 0 or 32 bytes, got {}", len),
				})
			},
		};
		if desc.hash_type > u8::MAX as u32 {
			return Err(SignerError::InvalidRequest {
				err: format!("hash_type {} does not fit in a byte", desc.hash_type),
			});
		}
		Ok(TypedSignDescriptor {
			pub_key,
			sig_hashes: TypedTxSigHashes::try_from(&desc.sig_hashes)?,
			input_index: desc.input_index,
			single_tweak,
			double_tweak,
			hash_type: desc.hash_type as u8,
			witness_script: ScriptBuf::from(desc.witness_script.clone()),
			output: (&desc.output).into(),
		})
	}
}

/// The address types a [`NewAddressRequest`] may ask for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AddressType {
	/// Native segwit v0 pay-to-witness-pubkey-hash.
	WitnessPubkeyHash,
	/// P2WPKH nested in P2SH. Not supported.
	NestedPubkeyHash,
	/// Legacy pay-to-pubkey-hash. Not supported.
	PubkeyHash,
}

/// Returns the 32-byte root key the channel state machine derives its keys from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchRootKeyResponse {
	/// The root key.
	pub root_key: Vec<u8>,
}

/// Asks for the wallet's confirmed balance.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConfirmedBalanceRequest {
	/// The minimum number of confirmations an output needs to be counted.
	pub confirmations: u32,
	/// Whether only witness outputs should be counted. All our outputs are witness outputs.
	pub witness: bool,
}

/// The wallet's confirmed balance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfirmedBalanceResponse {
	/// The balance in satoshis.
	pub amount: u64,
}

/// Asks for a fresh receive address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewAddressRequest {
	/// The requested address type.
	pub address_type: AddressType,
}

/// A fresh receive address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewAddressResponse {
	/// The address in its string encoding.
	pub address: String,
}

/// Asks for every spendable, unlocked witness output.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListUnspentWitnessRequest {
	/// The minimum number of confirmations an output needs to be listed.
	pub min_confirmations: u32,
}

/// A spendable witness output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Utxo {
	/// The output's address type.
	pub address_type: AddressType,
	/// The redeem script for nested outputs, empty for native ones.
	pub redeem_script: Vec<u8>,
	/// The output script.
	pub pk_script: Vec<u8>,
	/// The output value in satoshis.
	pub value: u64,
	/// The number of confirmations the output has.
	pub confirmations: u32,
	/// Where the output lives.
	pub out_point: OutPoint,
}

/// The spendable, unlocked witness outputs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListUnspentWitnessResponse {
	/// The outputs.
	pub utxos: Vec<Utxo>,
}

/// A public key which has never been handed out before.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewRawKeyResponse {
	/// The compressed public key.
	pub public_key: Vec<u8>,
}

/// Asks for information about an output we may own.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchInputInfoRequest {
	/// The output to look up.
	pub out_point: OutPoint,
}

/// Information about an output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchInputInfoResponse {
	/// Whether the output belongs to one of the wallet's transactions.
	pub mine: bool,
	/// The output itself, if `mine`.
	pub tx_out: Option<TxOut>,
}

/// Asks the wallet to pay to the given outputs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SendOutputsRequest {
	/// The outputs to pay to.
	pub outputs: Vec<TxOut>,
}

/// The result of a [`SendOutputsRequest`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SendOutputsResponse {
	/// Whether the transaction was built and broadcast.
	pub success: bool,
	/// Why it was not, empty on success.
	pub error: String,
	/// The txid of the broadcast transaction, empty on failure.
	pub result_hash: String,
}

/// Whether the chain backend has caught up with the network.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IsSyncedResponse {
	/// True if synced.
	pub synced: bool,
}

/// Asks for a message to be signed with a key previously handed out by `NewRawKey`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignMessageRequest {
	/// The compressed public key to sign with.
	pub pub_key: Vec<u8>,
	/// The message. Its double-SHA256 is what gets signed.
	pub message_to_be_signed: Vec<u8>,
}

/// The result of a [`SignMessageRequest`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignMessageResponse {
	/// The DER-encoded signature, empty on failure.
	pub signature: Vec<u8>,
	/// Whether the message was signed.
	pub success: bool,
	/// Why it was not, empty on success.
	pub error: String,
}

/// Reserves an output against concurrent spends.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LockOutpointRequest {
	/// The output to reserve.
	pub outpoint: OutPoint,
}

/// Releases an output reserved with a [`LockOutpointRequest`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnlockOutpointRequest {
	/// The output to release.
	pub outpoint: OutPoint,
}

/// One transaction in the wallet's history.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionDetail {
	/// The txid, hex encoded in display order.
	pub hash: String,
	/// The net change in our balance, in satoshis.
	pub value: i64,
	/// The number of confirmations.
	pub num_confirmations: u32,
	/// The confirming block's hash, hex encoded, or empty if unknown.
	pub block_hash: String,
	/// The confirming block's height, 0 if unconfirmed.
	pub block_height: u32,
	/// Seconds since the epoch.
	pub timestamp: u64,
	/// The fee paid, 0 if unknown.
	pub total_fees: u64,
}

/// The wallet's transaction history.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListTransactionDetailsResponse {
	/// The transactions.
	pub details: Vec<TransactionDetail>,
}

/// Asks for a raw signature over one input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignOutputRawRequest {
	/// The consensus-serialized transaction being signed.
	pub tx: Vec<u8>,
	/// How to sign it.
	pub sign_desc: SignDescriptor,
}

/// A raw signature, without a trailing sighash type byte.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignOutputRawResponse {
	/// The DER-encoded signature.
	pub signature: Vec<u8>,
}

/// Asks for a complete input script for one input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComputeInputScriptRequest {
	/// The consensus-serialized transaction being signed.
	pub tx: Vec<u8>,
	/// How to sign it.
	pub sign_desc: SignDescriptor,
}

/// A complete input script.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComputeInputScriptResponse {
	/// The witness stack, bottom first.
	pub witness_script: Vec<Vec<u8>>,
	/// The scriptSig, empty for native segwit inputs.
	pub script_sig: Vec<u8>,
}

/// Asks for a transaction to be broadcast.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublishTransactionRequest {
	/// The consensus-serialized transaction.
	pub tx: Vec<u8>,
}

/// The result of a [`PublishTransactionRequest`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublishTransactionResponse {
	/// Whether the backend accepted the transaction.
	pub success: bool,
	/// The backend's rejection reason, empty on success.
	pub error: String,
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::util::errors::ErrorCategory;

	fn sign_desc() -> SignDescriptor {
		SignDescriptor {
			pub_key: Vec::new(),
			sig_hashes: TxSigHashes {
				hash_prev_outs: vec![1; 32],
				hash_sequence: vec![2; 32],
				hash_outputs: vec![3; 32],
			},
			input_index: 1,
			single_tweak: Vec::new(),
			double_tweak: Vec::new(),
			hash_type: 1,
			witness_script: vec![0x51],
			output: TxOut { value: 1000, pk_script: vec![0x00, 0x14] },
		}
	}

	#[test]
	fn converts_well_formed_descriptor() {
		let typed = TypedSignDescriptor::try_from(&sign_desc()).unwrap();
		assert_eq!(typed.pub_key, None);
		assert_eq!(typed.sig_hashes.hash_sequence, [2; 32]);
		assert_eq!(typed.input_index, 1);
		assert_eq!(typed.single_tweak, None);
		assert_eq!(typed.double_tweak, None);
		assert_eq!(typed.output.value, Amount::from_sat(1000));
		assert_eq!(typed.witness_script.as_bytes(), &[0x51]);

		let mut desc = sign_desc();
		desc.pub_key = PublicKey::from_secret_key(
			&bitcoin::secp256k1::Secp256k1::new(),
			&SecretKey::from_slice(&[9; 32]).unwrap(),
		)
		.serialize()
		.to_vec();
		desc.double_tweak = vec![7; 32];
		let typed = TypedSignDescriptor::try_from(&desc).unwrap();
		assert!(typed.pub_key.is_some());
		assert_eq!(typed.double_tweak, Some(SecretKey::from_slice(&[7; 32]).unwrap()));
	}

	#[test]
	fn rejects_bad_field_lengths() {
		let mut desc = sign_desc();
		desc.pub_key = vec![2; 32];
		assert!(matches!(TypedSignDescriptor::try_from(&desc), Err(SignerError::InvalidRequest { .. })));

		let mut desc = sign_desc();
		desc.double_tweak = vec![1; 31];
		assert!(matches!(TypedSignDescriptor::try_from(&desc), Err(SignerError::InvalidRequest { .. })));

		let mut desc = sign_desc();
		desc.single_tweak = vec![1; 33];
		assert!(matches!(TypedSignDescriptor::try_from(&desc), Err(SignerError::InvalidRequest { .. })));

		for field in 0..3 {
			let mut desc = sign_desc();
			match field {
				0 => {
					desc.sig_hashes.hash_prev_outs.pop();
				},
				1 => desc.sig_hashes.hash_sequence.push(0),
				_ => desc.sig_hashes.hash_outputs.clear(),
			}
			let err = TypedSignDescriptor::try_from(&desc).unwrap_err();
			assert_eq!(err.category(), ErrorCategory::Precondition);
		}

		let mut desc = sign_desc();
		desc.hash_type = 0x101;
		assert!(matches!(TypedSignDescriptor::try_from(&desc), Err(SignerError::InvalidRequest { .. })));
	}

	#[test]
	fn zero_double_tweak_is_invalid() {
		let mut desc = sign_desc();
		desc.double_tweak = vec![0; 32];
		assert!(matches!(TypedSignDescriptor::try_from(&desc), Err(SignerError::InvalidTweak { .. })));
	}

	#[test]
	fn outpoint_conversion() {
		let wire = OutPoint { hash: vec![0xab; 32], index: 7 };
		let outpoint = transaction::OutPoint::try_from(&wire).unwrap();
		assert_eq!(outpoint.vout, 7);
		assert_eq!(OutPoint::from(&outpoint), wire);
		assert!(transaction::OutPoint::try_from(&OutPoint { hash: vec![0; 31], index: 0 }).is_err());
	}
}
