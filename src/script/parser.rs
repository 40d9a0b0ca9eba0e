//! Concrete parser: groups tokens into a tree of lines and blocks.
//!
//! Every statement becomes a node whose children are the rest of its line,
//! an optional `:` base list and an optional `{ ... }` block. The tree keeps
//! the surface shape only; deciding what is an object and what is a property
//! is left to the [`AstBuilder`](super::builder::AstBuilder).

use std::sync::Arc;

use super::error::{Diagnostic, ErrorCode};
use super::token::{Token, TokenKind};

pub type NodeId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConcreteKind {
    Variable,
    VariableAssign,
    Word,
    Import,
    Quote,
    LBrace,
    RBrace,
    Colon,
}

#[derive(Debug, Clone)]
pub struct ConcreteNode {
    /// Lexeme text; quotes are already stripped for `Quote` nodes.
    pub token: String,
    pub file: Arc<str>,
    pub line: u32,
    pub kind: ConcreteKind,
    pub children: Vec<NodeId>,
    pub parent: Option<NodeId>,
}

#[derive(Debug, Clone, Default)]
pub struct ConcreteTree {
    pub nodes: Vec<ConcreteNode>,
    pub roots: Vec<NodeId>,
}

impl ConcreteTree {
    pub fn node(&self, id: NodeId) -> &ConcreteNode {
        &self.nodes[id]
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &ConcreteNode> {
        self.nodes[id].children.iter().map(|&c| &self.nodes[c])
    }

    fn push(&mut self, token: &Token, kind: ConcreteKind, parent: Option<NodeId>) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(ConcreteNode {
            token: token.text().to_string(),
            file: Arc::clone(&token.file),
            line: token.line,
            kind,
            children: Vec::new(),
            parent,
        });
        match parent {
            Some(p) => self.nodes[p].children.push(id),
            None => self.roots.push(id),
        }
        id
    }
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    tree: ConcreteTree,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| t.kind) != Some(TokenKind::End) {
            let (file, line) = tokens
                .last()
                .map(|t| (Arc::clone(&t.file), t.line))
                .unwrap_or_else(|| (Arc::from(""), 1));
            tokens.push(Token {
                kind: TokenKind::End,
                lexeme: String::new(),
                file,
                line,
            });
        }
        Self {
            tokens,
            pos: 0,
            tree: ConcreteTree::default(),
        }
    }

    pub fn parse(mut self) -> Result<ConcreteTree, Diagnostic> {
        self.parse_block(None)?;
        Ok(self.tree)
    }

    /// Parses statements until the matching `}` (left unconsumed) or, at the
    /// top level, the end of input.
    fn parse_block(&mut self, parent: Option<NodeId>) -> Result<(), Diagnostic> {
        loop {
            self.skip_newlines();
            let t = self.peek();
            match t.kind {
                TokenKind::End => {
                    if parent.is_some() {
                        return Err(self.error(
                            ErrorCode::UnbalancedBraces,
                            "expected '}' before end of input",
                        ));
                    }
                    return Ok(());
                }
                TokenKind::RBrace => {
                    if parent.is_none() {
                        return Err(self.error(
                            ErrorCode::UnbalancedBraces,
                            "found '}' without a matching '{'",
                        ));
                    }
                    return Ok(());
                }
                TokenKind::Word if t.lexeme == "import" => self.parse_import(parent)?,
                TokenKind::Word if t.lexeme == "set" => self.parse_set(parent)?,
                TokenKind::Word | TokenKind::Quote => self.parse_statement(parent)?,
                _ => {
                    let found = describe(t);
                    return Err(self.error(
                        ErrorCode::UnexpectedToken,
                        format!("expected a statement, found {found}"),
                    ));
                }
            }
        }
    }

    fn parse_statement(&mut self, parent: Option<NodeId>) -> Result<(), Diagnostic> {
        let head = self.advance();
        let kind = if head.kind == TokenKind::Quote {
            ConcreteKind::Quote
        } else {
            ConcreteKind::Word
        };
        let node = self.tree.push(&head, kind, parent);

        loop {
            let t = self.peek().clone();
            match t.kind {
                TokenKind::Word => {
                    self.advance();
                    self.tree.push(&t, ConcreteKind::Word, Some(node));
                }
                TokenKind::Quote => {
                    self.advance();
                    self.tree.push(&t, ConcreteKind::Quote, Some(node));
                }
                TokenKind::Variable => {
                    self.advance();
                    self.tree.push(&t, ConcreteKind::Variable, Some(node));
                }
                TokenKind::Colon => {
                    self.advance();
                    self.parse_bases(&t, node)?;
                }
                TokenKind::LBrace => {
                    self.advance();
                    let block = self.tree.push(&t, ConcreteKind::LBrace, Some(node));
                    self.parse_block(Some(block))?;
                    let close = self.advance();
                    self.tree.push(&close, ConcreteKind::RBrace, Some(block));
                    return Ok(());
                }
                TokenKind::Newline => {
                    self.advance();
                    // A block may open on the line after its header
                    if !self.check(TokenKind::LBrace) {
                        return Ok(());
                    }
                }
                TokenKind::RBrace | TokenKind::End => return Ok(()),
                TokenKind::Unknown => {
                    return Err(self.error(
                        ErrorCode::UnexpectedToken,
                        format!("unexpected character sequence '{}'", t.lexeme),
                    ));
                }
            }
        }
    }

    fn parse_bases(&mut self, colon: &Token, node: NodeId) -> Result<(), Diagnostic> {
        let list = self.tree.push(colon, ConcreteKind::Colon, Some(node));
        while matches!(self.peek().kind, TokenKind::Word | TokenKind::Quote) {
            let t = self.advance();
            let kind = if t.kind == TokenKind::Quote {
                ConcreteKind::Quote
            } else {
                ConcreteKind::Word
            };
            self.tree.push(&t, kind, Some(list));
        }
        if self.tree.nodes[list].children.is_empty() {
            let found = describe(self.peek());
            return Err(self.error(
                ErrorCode::ObjectNameExpected,
                format!("expected a base object name after ':', found {found}"),
            ));
        }
        Ok(())
    }

    fn parse_import(&mut self, parent: Option<NodeId>) -> Result<(), Diagnostic> {
        let keyword = self.advance();
        let target = self.expect_value("an import target")?;
        if !(self.check(TokenKind::Word) && self.peek().lexeme == "from") {
            let found = describe(self.peek());
            return Err(self.error(
                ErrorCode::UnexpectedToken,
                format!("expected 'from', found {found}"),
            ));
        }
        self.advance();
        let source = self.expect_value("an import source")?;
        self.expect_line_end()?;

        let node = self.tree.push(&keyword, ConcreteKind::Import, parent);
        self.push_value(&target, node);
        self.push_value(&source, node);
        Ok(())
    }

    fn parse_set(&mut self, parent: Option<NodeId>) -> Result<(), Diagnostic> {
        let keyword = self.advance();
        if !self.check(TokenKind::Variable) {
            let found = describe(self.peek());
            return Err(self.error(
                ErrorCode::UnexpectedToken,
                format!("expected a variable after 'set', found {found}"),
            ));
        }
        let var = self.advance();
        let value = self.expect_value("a variable value")?;
        self.expect_line_end()?;

        let node = self.tree.push(&keyword, ConcreteKind::VariableAssign, parent);
        self.tree.push(&var, ConcreteKind::Variable, Some(node));
        self.push_value(&value, node);
        Ok(())
    }

    fn push_value(&mut self, token: &Token, parent: NodeId) {
        let kind = if token.kind == TokenKind::Quote {
            ConcreteKind::Quote
        } else {
            ConcreteKind::Word
        };
        self.tree.push(token, kind, Some(parent));
    }

    fn expect_value(&mut self, what: &str) -> Result<Token, Diagnostic> {
        if matches!(self.peek().kind, TokenKind::Word | TokenKind::Quote) {
            Ok(self.advance())
        } else {
            let found = describe(self.peek());
            Err(self.error(
                ErrorCode::StringExpected,
                format!("expected {what}, found {found}"),
            ))
        }
    }

    fn expect_line_end(&mut self) -> Result<(), Diagnostic> {
        match self.peek().kind {
            TokenKind::Newline => {
                self.advance();
                Ok(())
            }
            TokenKind::End | TokenKind::RBrace => Ok(()),
            _ => {
                let found = describe(self.peek());
                Err(self.error(
                    ErrorCode::UnexpectedToken,
                    format!("expected end of line, found {found}"),
                ))
            }
        }
    }

    // --- Helpers ---

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let t = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        t
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn skip_newlines(&mut self) {
        while self.check(TokenKind::Newline) {
            self.advance();
        }
    }

    fn error(&self, code: ErrorCode, message: impl Into<String>) -> Diagnostic {
        let t = self.peek();
        Diagnostic::new(code, &*t.file, t.line, message)
    }
}

fn describe(t: &Token) -> String {
    match t.kind {
        TokenKind::End => "end of input".to_string(),
        TokenKind::Newline => "end of line".to_string(),
        _ => format!("'{}'", t.lexeme),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script::lexer::Lexer;

    fn parse(src: &str) -> Result<ConcreteTree, Diagnostic> {
        let tokens = Lexer::new(src, "test.material").tokenize();
        Parser::new(tokens).parse()
    }

    fn child_tokens(tree: &ConcreteTree, id: NodeId) -> Vec<String> {
        tree.children(id).map(|n| n.token.clone()).collect()
    }

    #[test]
    fn parse_nested_blocks() {
        let tree = parse("material Red\n{\n  technique\n  {\n    pass { lighting off }\n  }\n}\n")
            .unwrap();
        assert_eq!(tree.roots.len(), 1);
        let material = tree.roots[0];
        assert_eq!(tree.node(material).token, "material");
        assert_eq!(child_tokens(&tree, material), vec!["Red", "{"]);

        let block = tree.node(material).children[1];
        let technique = tree.node(block).children[0];
        assert_eq!(tree.node(technique).token, "technique");
        let tblock = tree.node(technique).children[0];
        let pass = tree.node(tblock).children[0];
        let pblock = tree.node(pass).children[0];
        let lighting = tree.node(pblock).children[0];
        assert_eq!(child_tokens(&tree, lighting), vec!["off"]);
        assert_eq!(tree.node(lighting).parent, Some(pblock));
    }

    #[test]
    fn parse_properties_end_at_newline() {
        let tree = parse("pass\n{\n  ambient 1 0 0\n  diffuse 0 1 0\n}").unwrap();
        let block = tree.node(tree.roots[0]).children[0];
        let props: Vec<&ConcreteNode> = tree.children(block).collect();
        assert_eq!(props[0].token, "ambient");
        assert_eq!(props[0].children.len(), 3);
        assert_eq!(props[1].token, "diffuse");
        assert_eq!(props[1].line, 4);
        assert_eq!(props[2].kind, ConcreteKind::RBrace);
    }

    #[test]
    fn parse_inheritance_list() {
        let tree = parse("material Child : Base Other\n{\n}").unwrap();
        let root = tree.roots[0];
        let colon = tree.node(root).children[1];
        assert_eq!(tree.node(colon).kind, ConcreteKind::Colon);
        assert_eq!(child_tokens(&tree, colon), vec!["Base", "Other"]);
    }

    #[test]
    fn parse_colon_without_base_fails() {
        let err = parse("material Child :\n{\n}").unwrap_err();
        assert_eq!(err.code, ErrorCode::ObjectNameExpected);
        assert_eq!(err.line, 1);
    }

    #[test]
    fn parse_import() {
        let tree = parse("import * from \"base.material\"\n").unwrap();
        let import = tree.node(tree.roots[0]);
        assert_eq!(import.kind, ConcreteKind::Import);
        assert_eq!(child_tokens(&tree, tree.roots[0]), vec!["*", "base.material"]);
    }

    #[test]
    fn parse_import_without_from_fails() {
        let err = parse("import Base base.material\n").unwrap_err();
        assert_eq!(err.code, ErrorCode::UnexpectedToken);
        assert!(err.message.contains("'from'"));
    }

    #[test]
    fn parse_set() {
        let tree = parse("set $tint \"1 0 0\"\n").unwrap();
        let set = tree.roots[0];
        assert_eq!(tree.node(set).kind, ConcreteKind::VariableAssign);
        assert_eq!(child_tokens(&tree, set), vec!["$tint", "1 0 0"]);
    }

    #[test]
    fn parse_set_without_value_fails() {
        let err = parse("set $tint\n").unwrap_err();
        assert_eq!(err.code, ErrorCode::StringExpected);
    }

    #[test]
    fn parse_unbalanced_close() {
        let err = parse("material A\n{\n}\n}\n").unwrap_err();
        assert_eq!(err.code, ErrorCode::UnbalancedBraces);
        assert_eq!(err.line, 4);
    }

    #[test]
    fn parse_unbalanced_open() {
        let err = parse("material A\n{\n  technique\n  {\n}\n").unwrap_err();
        assert_eq!(err.code, ErrorCode::UnbalancedBraces);
    }

    #[test]
    fn parse_unknown_token_fails() {
        let err = parse("material A\n{\n  source \"open\n}\n").unwrap_err();
        assert_eq!(err.code, ErrorCode::UnexpectedToken);
        assert_eq!(err.file, "test.material");
    }

    #[test]
    fn parse_variable_in_property() {
        let tree = parse("ambient $tint\n").unwrap();
        let var = tree.children(tree.roots[0]).next().unwrap();
        assert_eq!(var.kind, ConcreteKind::Variable);
        assert_eq!(var.token, "$tint");
    }

    #[test]
    fn parse_empty_source() {
        let tree = parse("\n\n// nothing\n").unwrap();
        assert!(tree.roots.is_empty());
    }
}
