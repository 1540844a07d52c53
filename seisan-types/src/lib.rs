pub mod error;
pub mod format;
pub mod header;
pub mod time;

pub use error::*;
pub use format::*;
pub use header::*;
pub use time::*;
