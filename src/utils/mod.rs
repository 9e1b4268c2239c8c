//! Configuration, collection reading and tokenization.
//!
//! - [`config`] - JSON configuration (build, index, search sections)
//! - [`collection`] - Walking a directory of plain-text documents
//! - [`tokenizer`] - Letters-only, lowercase term extraction
//! - [`progress`] - Progress bar, no-op without the `progress` feature
//!
//! ```no_run
//! use proxima::utils::{tokenize, Config};
//!
//! let config = Config::load_or_default(None).unwrap();
//! let terms = tokenize("Sleep, perchance to dream");
//! // Returns: ["sleep", "perchance", "to", "dream"]
//! ```

pub mod collection;
pub mod config;
pub mod progress;
pub mod tokenizer;

pub use collection::*;
pub use config::*;
pub use tokenizer::*;
