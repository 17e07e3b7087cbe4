mod error;
mod keyring;
mod keystore;
mod session;

pub use {error::*, keyring::*, keystore::*, session::*};

pub use alloy::signers::local::PrivateKeySigner;
