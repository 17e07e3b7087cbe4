mod client;
mod error;
mod reconciler;
mod results;

pub use {client::*, error::*, reconciler::*, results::*};
