//! typedtext — reads delimited text into a typed, rectangular in-memory table.
//!
//! The core is a resumable tokenizer ([`tokenizer`]) paired with a row reader
//! ([`reader::read`]) that drives it, resolves columns, dispatches converters,
//! and writes values into a growing output buffer according to a [`Schema`].
//!
//! ```no_run
//! use typedtext::{ReaderBuilder, Schema, ElementDesc, ElementKind, stream::FileChunkSource};
//!
//! let (config, options) = ReaderBuilder::new().delimiter(',').build();
//! let schema = Schema::homogeneous(ElementDesc::new(ElementKind::Float64));
//! let file = std::fs::File::open("data.csv").unwrap();
//! let table = typedtext::read(FileChunkSource::new(file), &config, &options, &schema).unwrap();
//! ```

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

pub mod config;
pub mod error;
pub mod mem;
pub mod parse;
pub mod reader;
pub mod schema;
pub mod stream;
pub mod tokenizer;

pub use config::{ParserConfig, ReadOptions, ReaderBuilder};
pub use error::ReaderError;
pub use reader::{read, Converter, Table};
pub use schema::{ByteOrder, ElementDesc, ElementKind, GenericValue, Layout, Schema};
pub use stream::{Chunk, ChunkSource, ChunkStatus, FileChunkSource, LinesChunkSource};
pub use tokenizer::TokenizerState;
