mod fixtures;
mod mock;
mod tracing;

pub use {fixtures::*, mock::*, tracing::*};
