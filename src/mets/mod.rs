//! METS/MODS document parsing

#[cfg(test)]
pub(crate) mod fixtures;
mod parser;
mod types;

pub use parser::{decode, parse, ParseError, DV_NS, METS_NS, MODS_NS, RESERVED_LICENSE, XLINK_NS};
pub use types::*;
