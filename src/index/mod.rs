pub mod build;
pub mod codec;
pub mod cursor;
pub mod disk;
pub mod docs;
pub mod memory;
pub mod reader;
pub mod stats;
pub mod types;
pub mod writer;

pub use build::{build_from_directory, build_index, BuildSummary, IndexBuilder};
pub use cursor::PositionsCursor;
pub use disk::DiskIndex;
pub use docs::DocumentTable;
pub use memory::MemoryIndex;
pub use reader::{open_index, Index, IndexKind};
pub use types::*;
pub use writer::IndexWriter;
