mod address;
mod directory;
mod error;
mod ids;
mod validation;
mod vote;

pub use {address::*, directory::*, error::*, ids::*, validation::*, vote::*};
