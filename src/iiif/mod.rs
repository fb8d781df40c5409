//! IIIF Presentation and Image API generation

mod collection;
mod fragment;
mod image;
mod manifest;
mod metadata;
mod types;

pub use collection::*;
pub use fragment::*;
pub use self::image::*;
pub use manifest::*;
pub use metadata::*;
pub use types::*;
