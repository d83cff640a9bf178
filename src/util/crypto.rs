// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

use bitcoin::hashes::sha256::Hash as Sha256;
use bitcoin::hashes::sha256d::Hash as Sha256dHash;
use bitcoin::hashes::{Hash, HashEngine};
use bitcoin::secp256k1::{ecdsa::Signature, Message, Secp256k1, SecretKey, Signing};

/// SHA256 over the concatenation of the given slices.
pub fn sha256_concat(parts: &[&[u8]]) -> [u8; 32] {
	let mut engine = Sha256::engine();
	for part in parts {
		engine.input(part);
	}
	Sha256::from_engine(engine).to_byte_array()
}

#[inline]
pub fn sha256d(data: &[u8]) -> [u8; 32] {
	Sha256dHash::hash(data).to_byte_array()
}

#[inline]
pub fn sign<C: Signing>(ctx: &Secp256k1<C>, msg: &Message, sk: &SecretKey) -> Signature {
	#[cfg(feature = "grind_signatures")]
	let sig = ctx.sign_ecdsa_low_r(msg, sk);
	#[cfg(not(feature = "grind_signatures"))]
	let sig = ctx.sign_ecdsa(msg, sk);
	sig
}

/// Signs the given 32-byte digest and returns the DER-encoded signature.
pub fn sign_digest_der<C: Signing>(
	ctx: &Secp256k1<C>, digest: [u8; 32], sk: &SecretKey,
) -> Vec<u8> {
	let msg = Message::from_digest(digest);
	sign(ctx, &msg, sk).serialize_der().to_vec()
}
