// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Recognition of the witness programs we know how to sign for.

use bitcoin::blockdata::opcodes::all::{
	OP_CHECKSIG, OP_DUP, OP_EQUALVERIFY, OP_HASH160, OP_PUSHBYTES_0, OP_PUSHBYTES_20,
};
use bitcoin::blockdata::script::{Instruction, Script};

/// The length of a P2PKH script code as committed to by a BIP 143 signature hash, including its
/// length prefix.
pub const P2PKH_SCRIPT_CODE_LEN: usize = 26;

/// Returns the 20-byte key hash committed to by a native P2WPKH witness program, or `None` if
/// `script` is anything else.
///
/// Only the canonical form is accepted: exactly two script elements, `OP_0` followed by a direct
/// 20-byte push.
pub fn witness_pubkey_hash(script: &Script) -> Option<[u8; 20]> {
	let bytes = script.as_bytes();
	if bytes.len() < 2
		|| bytes[0] != OP_PUSHBYTES_0.to_u8()
		|| bytes[1] != OP_PUSHBYTES_20.to_u8()
	{
		return None;
	}

	let mut instructions = script.instructions();
	match (instructions.next(), instructions.next(), instructions.next()) {
		(
			Some(Ok(Instruction::PushBytes(version))),
			Some(Ok(Instruction::PushBytes(program))),
			None,
		) if version.is_empty() && program.len() == 20 => {
			let mut hash = [0; 20];
			hash.copy_from_slice(program.as_bytes());
			Some(hash)
		},
		_ => None,
	}
}

/// Returns true if `script` is a native P2WPKH witness program.
pub fn is_witness_pubkey_hash(script: &Script) -> bool {
	witness_pubkey_hash(script).is_some()
}

/// Builds the length-prefixed P2PKH script code a P2WPKH input commits to:
/// `0x19 OP_DUP OP_HASH160 <20 bytes> OP_EQUALVERIFY OP_CHECKSIG`.
pub fn p2pkh_script_code(pubkey_hash: &[u8; 20]) -> [u8; P2PKH_SCRIPT_CODE_LEN] {
	let mut code = [0; P2PKH_SCRIPT_CODE_LEN];
	code[0] = 0x19;
	code[1] = OP_DUP.to_u8();
	code[2] = OP_HASH160.to_u8();
	code[3] = OP_PUSHBYTES_20.to_u8();
	code[4..24].copy_from_slice(pubkey_hash);
	code[24] = OP_EQUALVERIFY.to_u8();
	code[25] = OP_CHECKSIG.to_u8();
	code
}
