//! Best-first enumeration of prefix-corrected translations over a word
//! graph.

mod processor;
mod result_builder;

pub use processor::{ErrorCorrectionWordGraphProcessor, Results};
pub use result_builder::TranslationResultBuilder;
