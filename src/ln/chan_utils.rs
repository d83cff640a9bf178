// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Various utilities for deriving the per-commitment and revocation keys the channel state
//! machine asks us to sign with. These mirror the derivations in BOLT 3, but operate on tweaks
//! handed to us in a [`SignDescriptor`] rather than on channel state.
//!
//! [`SignDescriptor`]: crate::sign::SignDescriptor

use bitcoin::secp256k1::constants::CURVE_ORDER;
use bitcoin::secp256k1::{self, PublicKey, Scalar, Secp256k1, SecretKey};

use crate::sign::SignDescriptor;
use crate::util::crypto::sha256_concat;
use crate::util::errors::SignerError;

/// Computes the single tweak for a per-commitment key: `SHA256(per_commitment_point || base_point)`.
///
/// This is what the counterparty places in [`SignDescriptor::single_tweak`] when asking us to
/// sign with a key derived from `base_point`.
pub fn single_tweak_bytes(per_commitment_point: &PublicKey, base_point: &PublicKey) -> [u8; 32] {
	sha256_concat(&[&per_commitment_point.serialize(), &base_point.serialize()])
}

// Reduces a big-endian 256-bit integer modulo the curve order. Any 256-bit value is below twice
// the order, so one subtraction suffices.
fn reduce_mod_order(bytes: &[u8; 32]) -> [u8; 32] {
	if bytes[..] < CURVE_ORDER[..] {
		return *bytes;
	}
	let mut res = [0u8; 32];
	let mut borrow = 0i16;
	for i in (0..32).rev() {
		let mut diff = bytes[i] as i16 - CURVE_ORDER[i] as i16 - borrow;
		if diff < 0 {
			diff += 256;
			borrow = 1;
		} else {
			borrow = 0;
		}
		res[i] = diff as u8;
	}
	res
}

fn scalar_from_hash(hash: [u8; 32]) -> Result<Scalar, SignerError> {
	Scalar::from_be_bytes(hash).map_err(|_| SignerError::InvalidTweak {
		err: "Hash is not a valid scalar".to_owned(),
	})
}

/// Adds `tweak`, read as a big-endian integer and reduced modulo the curve order, to
/// `base_secret`.
///
/// Fails with [`SignerError::InvalidTweak`] only if the result would be zero, i.e. the tweak is
/// the negation of the key.
pub fn tweak_private_key(base_secret: &SecretKey, tweak: &[u8; 32]) -> Result<SecretKey, SignerError> {
	let scalar = Scalar::from_be_bytes(reduce_mod_order(tweak)).map_err(|_| {
		SignerError::InvalidTweak { err: "Tweak is not a valid scalar".to_owned() }
	})?;
	base_secret.add_tweak(&scalar).map_err(|_| SignerError::InvalidTweak {
		err: "Tweak is the negation of the base key".to_owned(),
	})
}

/// Derives a revocation private key from its constituent parts:
/// `base_secret * SHA256(B || C) + counterparty_secret * SHA256(C || B)` where `B` and `C` are the
/// public keys of `base_secret` and `counterparty_secret`.
///
/// Once a commitment is revoked, the punishing party knows both secrets (its own revocation base
/// secret and the revealed per-commitment secret) and can thus spend the revoked output. The
/// result does not depend on which of the two keys is passed as `base_secret`.
pub fn derive_private_revocation_key<T: secp256k1::Signing>(
	secp_ctx: &Secp256k1<T>, base_secret: &SecretKey, counterparty_secret: &SecretKey,
) -> Result<SecretKey, SignerError> {
	let base_point = PublicKey::from_secret_key(secp_ctx, base_secret);
	let counterparty_point = PublicKey::from_secret_key(secp_ctx, counterparty_secret);

	let base_append_counterparty =
		sha256_concat(&[&base_point.serialize(), &counterparty_point.serialize()]);
	let counterparty_append_base =
		sha256_concat(&[&counterparty_point.serialize(), &base_point.serialize()]);

	let base_contrib = base_secret
		.mul_tweak(&scalar_from_hash(base_append_counterparty)?)
		.map_err(|_| SignerError::InvalidTweak { err: "Zero revocation hash".to_owned() })?;
	let counterparty_contrib = counterparty_secret
		.mul_tweak(&scalar_from_hash(counterparty_append_base)?)
		.map_err(|_| SignerError::InvalidTweak { err: "Zero revocation hash".to_owned() })?;
	base_contrib
		.add_tweak(&Scalar::from(counterparty_contrib))
		.map_err(|_| SignerError::InvalidTweak { err: "Revocation key sums to zero".to_owned() })
}

/// Derives a revocation public key from its constituent parts. This is the public equivalent of
/// [`derive_private_revocation_key`], so that either party can learn the key before the secrets
/// needed to sign with it are known.
pub fn derive_public_revocation_key<T: secp256k1::Verification>(
	secp_ctx: &Secp256k1<T>, base_point: &PublicKey, counterparty_point: &PublicKey,
) -> Result<PublicKey, SignerError> {
	let base_append_counterparty =
		sha256_concat(&[&base_point.serialize(), &counterparty_point.serialize()]);
	let counterparty_append_base =
		sha256_concat(&[&counterparty_point.serialize(), &base_point.serialize()]);

	let base_contrib = base_point
		.mul_tweak(secp_ctx, &scalar_from_hash(base_append_counterparty)?)
		.map_err(|_| SignerError::InvalidTweak { err: "Zero revocation hash".to_owned() })?;
	let counterparty_contrib = counterparty_point
		.mul_tweak(secp_ctx, &scalar_from_hash(counterparty_append_base)?)
		.map_err(|_| SignerError::InvalidTweak { err: "Zero revocation hash".to_owned() })?;
	base_contrib
		.combine(&counterparty_contrib)
		.map_err(|_| SignerError::InvalidTweak { err: "Revocation key sums to infinity".to_owned() })
}

/// Applies whichever tweak `descriptor` carries to `base_secret`: the single tweak additively,
/// the double tweak as the counterparty secret of a revocation key, or neither.
///
/// A descriptor carrying both tweaks is rejected.
pub fn maybe_tweak_private_key<T: secp256k1::Signing>(
	secp_ctx: &Secp256k1<T>, descriptor: &SignDescriptor, base_secret: &SecretKey,
) -> Result<SecretKey, SignerError> {
	match (&descriptor.single_tweak, &descriptor.double_tweak) {
		(Some(_), Some(_)) => Err(SignerError::InvalidRequest {
			err: "Only one of single_tweak and double_tweak may be set".to_owned(),
		}),
		(Some(tweak), None) => tweak_private_key(base_secret, tweak),
		(None, Some(counterparty_secret)) => {
			derive_private_revocation_key(secp_ctx, base_secret, counterparty_secret)
		},
		(None, None) => Ok(*base_secret),
	}
}
