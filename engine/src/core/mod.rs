//! Pure logic shared by every pipeline.

pub mod arch;
pub mod brainfuck;
pub mod directive;
pub mod hexdump;
pub mod merge;
pub mod source;
pub mod types;
