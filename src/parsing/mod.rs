pub mod parser;
pub mod typescript;

pub use parser::{
    CallSite, ImportBinding, ImportKind, ImportSpec, LanguageAdapter, ParseError, ParseResult,
    ParsedFile,
};
pub use typescript::TypeScriptAdapter;
