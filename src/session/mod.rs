//! Interactive translation sessions: a translator per source segment plus a
//! factory that wires engines, tokenizers, and the error-correction model
//! together.

mod factory;
mod translator;

pub use factory::InteractiveTranslatorFactory;
pub use translator::InteractiveTranslator;
