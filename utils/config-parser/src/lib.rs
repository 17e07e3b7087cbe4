mod error;
mod parser;

pub use {error::*, parser::*};
