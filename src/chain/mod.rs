// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Structs and traits which allow the signer to interact with the wallet and the blockchain.
//!
//! The signer never talks to the network or stores keys itself. Key lookup, UTXO enumeration and
//! transaction construction go through [`walletinterface::WalletSource`], broadcasting and sync
//! status through [`chaininterface`].

pub mod chaininterface;
pub mod locks;
pub mod transaction;
pub mod walletinterface;
