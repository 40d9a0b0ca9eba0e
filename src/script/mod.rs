//! Material script front end: source text → tokens → concrete tree → AST.

pub mod ast;
pub mod builder;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod token;

use std::path::PathBuf;

pub use ast::Ast;
pub use error::{CompileError, Diagnostic, ErrorCode};

use builder::AstBuilder;
use lexer::Lexer;
use parser::Parser;

/// The script front end.
///
/// A syntax error aborts the whole file; semantic problems found while
/// building the AST come back as diagnostics next to the tree.
pub struct ScriptParser;

impl ScriptParser {
    /// Parse source into an AST, resolving imports relative to `file` and
    /// then `import_paths`.
    pub fn parse(
        source: &str,
        file: &str,
        import_paths: &[PathBuf],
    ) -> Result<(Ast, Vec<Diagnostic>), Diagnostic> {
        let tokens = Lexer::new(source, file).tokenize();
        let tree = Parser::new(tokens).parse()?;
        let mut builder = AstBuilder::new().with_import_paths(import_paths.to_vec());
        Ok(builder.build(&tree))
    }
}
