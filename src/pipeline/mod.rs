pub mod assembler;
pub mod demux;
pub mod prompt;
pub mod retry;

pub use assembler::{assemble, AssembledRequest, SkippedReference};
pub use demux::{consume, OutputNamer};
pub use prompt::build_prompt;
pub use retry::{GenerationMode, MangaGenerator};
