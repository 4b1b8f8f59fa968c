//! Report sink adapters.

pub mod file;
pub mod memory;

pub use file::FileReportSink;
pub use memory::MemoryReportSink;
