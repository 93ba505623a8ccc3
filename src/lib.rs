pub mod error;
pub mod ir;
pub mod parse;
pub mod translate;
pub mod wasm;

pub use error::CompilerError;
pub use translate::{TranslateOptions, compile, translate};
