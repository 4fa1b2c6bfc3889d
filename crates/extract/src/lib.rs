//! Audio tag parsing and metadata normalization.
//!
//! The [`Parser`] reads a file's tags through a [`TagCodec`](codec::TagCodec)
//! and turns whatever it finds into a canonical [`Metadata`](models::Metadata)
//! record: trimmed strings, numeric genre references resolved to names, track
//! and disc numbers validated. It can also write a record back.
//!
//! ```no_run
//! use std::sync::Arc;
//! use tagcache_extract::codec::AutoCodec;
//! use tagcache_extract::{Parser, ParserOptions};
//!
//! let parser = Parser::new(Arc::new(AutoCodec), ParserOptions::default());
//! if parser.is_applicable("/music/track.mp3") {
//!     let metadata = parser.extract("/music/track.mp3");
//!     println!("{:?} by {:?}", metadata.title, metadata.artist);
//! }
//! ```

pub mod codec;
mod consts;
pub mod error;
#[cfg(test)]
mod fixtures;
pub mod genre;
pub mod models;
pub mod normalize;
mod parser;
#[cfg(feature = "probe")]
mod probe;

pub use crate::consts::SUPPORTED_EXTENSIONS;
pub use crate::parser::{Parser, ParserOptions};
