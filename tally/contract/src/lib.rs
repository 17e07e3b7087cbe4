mod binding;
mod error;
mod evm;

pub use {binding::*, error::*, evm::*};
