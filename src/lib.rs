// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

#![crate_name = "lightning_remote_signer"]

//! A remote signing oracle for the on-chain wallet of a Lightning node.
//!
//! An external channel state machine hands us a partially specified transaction together with a
//! [`sign::SignDescriptor`] and we hand back either a raw signature or a complete witness for a
//! single input. Keys are looked up in a wallet backend (see [`chain::walletinterface`]) and may be
//! tweaked with the per-commitment and revocation derivation schemes of BOLT 3 before signing.
//!
//! The entry point is [`ln::signermanager::SignerManager`], which exposes one method per RPC
//! operation. Transport and wire schema are left to the caller.
//!
//! ## Usage Example:
//!
//! ```ignore
//! let manager = SignerManager::new(
//! 	&some_wallet,
//! 	&some_broadcaster,
//! 	&some_chain_source,
//! 	&some_logger,
//! 	SignerConfig::default(),
//! );
//!
//! let res = manager.compute_input_script(&request)?;
//! ```

#![cfg_attr(not(test), deny(missing_docs))]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

extern crate bitcoin;
#[cfg(test)]
extern crate regex;

#[macro_use]
pub mod util;
pub mod chain;
pub mod ln;
pub mod sign;
