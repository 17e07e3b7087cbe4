mod codec;
mod directory;
mod error;
mod firestore;
mod index;
mod memory;
mod store;
mod value;

pub use {directory::*, error::*, firestore::*, index::*, memory::*, store::*, value::*};
