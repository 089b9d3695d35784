//! TypeScript and JavaScript support

pub mod parser;

pub use parser::{TYPESCRIPT_EXTENSIONS, TypeScriptAdapter};
