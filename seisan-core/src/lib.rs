//! Чтение волновых файлов SeisAn и упаковка трасс в Mini-SEED.
//!
//! Поддерживаются PC формат (до версии 7.0, 1-байтовые длины записей) и
//! формат 7.0+ (4-байтовые длины) в любом порядке байт.
//!
//! # Быстрый старт
//!
//! ```no_run
//! use seisan_core::{DecodeOptions, MseedPacker, PackParams, Packer, SeisanReader, TraceGroup};
//! use std::fs::File;
//!
//! let opts = DecodeOptions::default();
//! let mut group = TraceGroup::new(false);
//!
//! for block in SeisanReader::new(File::open("2005-02-01-1005-12S.TEST__003")?, &opts)? {
//!     group.add_block(block?);
//! }
//!
//! let mut packer = MseedPacker::new(File::create("out.mseed")?, PackParams::default())?;
//! for trace in group.iter_mut() {
//!     packer.pack(trace, true)?;
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod binary;
pub mod channel;
pub mod decoder;
pub mod detect;
pub mod header;
pub mod pack;
pub mod record;
pub mod samples;
pub mod stream;
pub mod trace;

pub use binary::*;
pub use channel::*;
pub use decoder::*;
pub use detect::*;
pub use header::*;
pub use pack::*;
pub use record::*;
pub use samples::*;
pub use stream::*;
pub use trace::*;

/// Версия библиотеки.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
