//! demetsiiify
//!
//! Converts METS/MODS documents from digital libraries into IIIF
//! Presentation 2.x manifests and serves them together with paginated
//! collections and a level 0 Image API.
//!
//! # Modules
//!
//! - `mets`: METS/MODS parsing into a typed document model
//! - `imgfetch`: HTTP fetching and image dimension resolution
//! - `iiif`: manifest, collection and Image API generation
//! - `tasks`: the import pipeline and job tracking
//! - `db`: SQLite persistence

pub mod config;
pub mod db;
pub mod error;
pub mod iiif;
pub mod imgfetch;
pub mod mets;
pub mod routes;
pub mod state;
pub mod tasks;
