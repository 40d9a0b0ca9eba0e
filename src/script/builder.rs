//! Turns a concrete tree into an [`Ast`] and resolves imports, inheritance
//! and variables.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::debug;

use super::ast::{
    AbstractNode, Ast, AtomNode, ImportNode, NodeId, NodeKind, ObjectNode, PropertyNode,
    VariableNode,
};
use super::error::{Diagnostic, ErrorCode};
use super::lexer::Lexer;
use super::parser::{ConcreteKind, ConcreteTree, Parser};
use super::token::TokenKind;
use crate::opcode::Opcode;

/// Objects whose first value is not a name when nested in a given parent.
fn is_name_excluded(cls: &str, parent_cls: Option<&str>) -> bool {
    matches!((cls, parent_cls), ("texture_source", Some("texture_unit")))
}

#[derive(Debug, Default)]
pub struct AstBuilder {
    import_paths: Vec<PathBuf>,
    /// Files currently being built, for cycle detection.
    loading: HashSet<PathBuf>,
    /// Finished import files, each built at most once.
    cache: HashMap<PathBuf, Arc<Ast>>,
    /// Objects made available by `import`, by name.
    imported: HashMap<String, Ast>,
    diagnostics: Vec<Diagnostic>,
}

impl AstBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_import_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.import_paths = paths;
        self
    }

    pub fn build(&mut self, tree: &ConcreteTree) -> (Ast, Vec<Diagnostic>) {
        self.imported.clear();
        let mut ast = Ast::default();
        for &root in &tree.roots {
            if let Some(id) = self.convert(tree, root, None, &mut ast) {
                ast.roots.push(id);
            }
        }

        self.process_imports(&ast);
        self.process_names(&mut ast);
        self.process_inheritance(&mut ast);
        self.process_variables(&mut ast);

        (ast, std::mem::take(&mut self.diagnostics))
    }

    // --- Concrete tree conversion ---

    fn convert(
        &mut self,
        tree: &ConcreteTree,
        id: NodeId,
        parent: Option<NodeId>,
        ast: &mut Ast,
    ) -> Option<NodeId> {
        let cnode = tree.node(id);
        let kind = match cnode.kind {
            ConcreteKind::Import => {
                let mut parts = tree.children(id).map(|n| n.token.clone());
                NodeKind::Import(ImportNode {
                    target: parts.next().unwrap_or_default(),
                    source: parts.next().unwrap_or_default(),
                })
            }
            ConcreteKind::VariableAssign => {
                let mut parts = tree.children(id).map(|n| n.token.clone());
                let name = parts.next().unwrap_or_default();
                NodeKind::VariableSet(VariableNode {
                    name: name.trim_start_matches('$').to_string(),
                    value: parts.next().unwrap_or_default(),
                })
            }
            ConcreteKind::Word | ConcreteKind::Quote => {
                let is_object = tree
                    .children(id)
                    .any(|n| n.kind == ConcreteKind::LBrace);
                if is_object {
                    return self.convert_object(tree, id, parent, ast);
                }
                return Some(self.convert_property(tree, id, parent, ast));
            }
            _ => return None,
        };

        Some(ast.push(AbstractNode {
            file: Arc::clone(&cnode.file),
            line: cnode.line,
            parent,
            kind,
        }))
    }

    fn convert_object(
        &mut self,
        tree: &ConcreteTree,
        id: NodeId,
        parent: Option<NodeId>,
        ast: &mut Ast,
    ) -> Option<NodeId> {
        let cnode = tree.node(id);
        let mut words: Vec<NodeId> = Vec::new();
        let mut bases = Vec::new();
        let mut block = None;
        for &child in &cnode.children {
            let c = tree.node(child);
            match c.kind {
                ConcreteKind::Word | ConcreteKind::Quote | ConcreteKind::Variable => {
                    words.push(child)
                }
                ConcreteKind::Colon => bases.extend(tree.children(child).map(|n| n.token.clone())),
                ConcreteKind::LBrace => block = Some(child),
                _ => {}
            }
        }

        let mut words = words.into_iter();
        let is_abstract = cnode.token == "abstract";
        let cls = if is_abstract {
            match words.next() {
                Some(w) => tree.node(w).token.clone(),
                None => {
                    self.diagnostics.push(Diagnostic::new(
                        ErrorCode::ObjectNameExpected,
                        &*cnode.file,
                        cnode.line,
                        "expected an object type after 'abstract'",
                    ));
                    return None;
                }
            }
        } else {
            cnode.token.clone()
        };

        let parent_cls = parent.and_then(|p| ast.object(p)).map(|o| o.cls.as_str());
        let (name, name_is_variable) = if is_name_excluded(&cls, parent_cls) {
            (String::new(), false)
        } else {
            match words.next().map(|w| tree.node(w)) {
                Some(w) if w.kind == ConcreteKind::Variable => {
                    (w.token.trim_start_matches('$').to_string(), true)
                }
                Some(w) => (w.token.clone(), false),
                None => (String::new(), false),
            }
        };

        let obj_id = ast.push(AbstractNode {
            file: Arc::clone(&cnode.file),
            line: cnode.line,
            parent,
            kind: NodeKind::Object(ObjectNode {
                name,
                name_is_variable,
                id: Opcode::lookup(&cls).unwrap_or(Opcode::Unspecified),
                cls,
                is_abstract,
                bases,
                values: Vec::new(),
                children: Vec::new(),
            }),
        });

        let values: Vec<NodeId> = words.map(|w| push_atom(tree, w, obj_id, ast)).collect();

        let mut children = Vec::new();
        if let Some(block) = block {
            for &child in &tree.node(block).children {
                if let Some(c) = self.convert(tree, child, Some(obj_id), ast) {
                    children.push(c);
                }
            }
        }

        if let Some(obj) = ast.object_mut(obj_id) {
            obj.values = values;
            obj.children = children;
        }
        Some(obj_id)
    }

    fn convert_property(
        &mut self,
        tree: &ConcreteTree,
        id: NodeId,
        parent: Option<NodeId>,
        ast: &mut Ast,
    ) -> NodeId {
        let cnode = tree.node(id);
        let prop_id = ast.push(AbstractNode {
            file: Arc::clone(&cnode.file),
            line: cnode.line,
            parent,
            kind: NodeKind::Property(PropertyNode {
                id: Opcode::lookup(&cnode.token).unwrap_or(Opcode::Unspecified),
                name: cnode.token.clone(),
                values: Vec::new(),
            }),
        });
        let values: Vec<NodeId> = cnode
            .children
            .iter()
            .filter(|&&c| {
                matches!(
                    tree.node(c).kind,
                    ConcreteKind::Word | ConcreteKind::Quote | ConcreteKind::Variable
                )
            })
            .map(|&c| push_atom(tree, c, prop_id, ast))
            .collect();
        if let NodeKind::Property(prop) = &mut ast.node_mut(prop_id).kind {
            prop.values = values;
        }
        prop_id
    }

    // --- Imports ---

    fn process_imports(&mut self, ast: &Ast) {
        for &root in &ast.roots {
            let node = ast.node(root);
            let NodeKind::Import(import) = &node.kind else {
                continue;
            };
            let Some(path) = self.resolve_import(&node.file, &import.source) else {
                self.diagnostics.push(Diagnostic::new(
                    ErrorCode::ImportFailed,
                    &*node.file,
                    node.line,
                    format!("cannot find '{}'", import.source),
                ));
                continue;
            };
            let Some(imported) = self.load_import(&path, &node.file, node.line) else {
                continue;
            };

            let mut found = false;
            for obj in imported.objects() {
                let Some(o) = imported.object(obj) else { continue };
                if import.target == "*" || o.name == import.target {
                    found = true;
                    self.imported.insert(o.name.clone(), imported.extract(obj));
                }
            }
            if !found && import.target != "*" {
                self.diagnostics.push(Diagnostic::new(
                    ErrorCode::ImportFailed,
                    &*node.file,
                    node.line,
                    format!("'{}' has no object named '{}'", import.source, import.target),
                ));
            }
        }
    }

    fn resolve_import(&self, from: &str, source: &str) -> Option<PathBuf> {
        let base = Path::new(from).parent().unwrap_or(Path::new(""));
        std::iter::once(base.join(source))
            .chain(self.import_paths.iter().map(|dir| dir.join(source)))
            .find(|p| p.is_file())
            .map(|p| std::fs::canonicalize(&p).unwrap_or(p))
    }

    fn load_import(&mut self, path: &Path, from: &str, line: u32) -> Option<Arc<Ast>> {
        if let Some(ast) = self.cache.get(path) {
            return Some(Arc::clone(ast));
        }
        if self.loading.contains(path) {
            debug!("skipping cyclic import of {}", path.display());
            return None;
        }

        let source = match std::fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) => {
                self.diagnostics.push(Diagnostic::new(
                    ErrorCode::ImportFailed,
                    from,
                    line,
                    format!("cannot read {}: {e}", path.display()),
                ));
                return None;
            }
        };

        let file = path.display().to_string();
        let tokens = Lexer::new(&source, &file).tokenize();
        let tree = match Parser::new(tokens).parse() {
            Ok(tree) => tree,
            Err(diag) => {
                self.diagnostics.push(diag);
                return None;
            }
        };

        let mut nested = AstBuilder {
            import_paths: self.import_paths.clone(),
            loading: std::mem::take(&mut self.loading),
            cache: std::mem::take(&mut self.cache),
            ..AstBuilder::default()
        };
        nested.loading.insert(path.to_path_buf());
        let (ast, diagnostics) = nested.build(&tree);
        nested.loading.remove(path);
        self.loading = nested.loading;
        self.cache = nested.cache;
        self.diagnostics.extend(diagnostics);

        debug!("imported {}", path.display());
        let ast = Arc::new(ast);
        self.cache.insert(path.to_path_buf(), Arc::clone(&ast));
        Some(ast)
    }

    // --- Object names ---

    /// Resolves object names given as `$var`. Objects whose name variable is
    /// undefined are dropped. Runs before inheritance so bases can be named
    /// through variables.
    fn process_names(&mut self, ast: &mut Ast) {
        let roots = ast.roots.clone();
        ast.roots = roots
            .into_iter()
            .filter(|&id| self.resolve_name(ast, id))
            .collect();
    }

    fn resolve_name(&mut self, ast: &mut Ast, id: NodeId) -> bool {
        let Some(obj) = ast.object(id) else {
            return true;
        };
        let children = obj.children.clone();
        if obj.name_is_variable {
            let var = obj.name.clone();
            let Some(value) = lookup_variable(ast, id, &var) else {
                let node = ast.node(id);
                self.diagnostics.push(Diagnostic::new(
                    ErrorCode::UndefinedVariable,
                    &*node.file,
                    node.line,
                    format!("undefined variable ${var} in object name"),
                ));
                return false;
            };
            let file = Arc::clone(&ast.node(id).file);
            let name = Lexer::new(&value, &file)
                .tokenize()
                .into_iter()
                .find_map(|t| match t.kind {
                    TokenKind::Word => Some(t.lexeme),
                    TokenKind::Quote => Some(t.text().to_string()),
                    _ => None,
                })
                .unwrap_or_default();
            if let Some(obj) = ast.object_mut(id) {
                obj.name = name;
                obj.name_is_variable = false;
            }
        }

        let kept: Vec<NodeId> = children
            .into_iter()
            .filter(|&c| self.resolve_name(ast, c))
            .collect();
        if let Some(obj) = ast.object_mut(id) {
            obj.children = kept;
        }
        true
    }

    // --- Inheritance ---

    fn process_inheritance(&mut self, ast: &mut Ast) {
        let roots = ast.roots.clone();
        for (index, &root) in roots.iter().enumerate() {
            self.inherit(ast, root, &roots[..index]);
        }
    }

    /// Prepends the children of every base to the object's own children,
    /// then recurses into the object's original children. `earlier` holds
    /// the top-level nodes declared before the enclosing top-level object.
    fn inherit(&mut self, ast: &mut Ast, id: NodeId, earlier: &[NodeId]) {
        let Some(obj) = ast.object(id) else { return };
        let bases = obj.bases.clone();
        let own_children = obj.children.clone();

        let mut inherited = Vec::new();
        for base in &bases {
            let local = earlier
                .iter()
                .rev()
                .copied()
                .find(|&r| ast.object(r).is_some_and(|o| &o.name == base));
            let source = match local {
                Some(r) => ast.extract(r),
                None => match self.imported.get(base) {
                    Some(imported) => imported.clone(),
                    None => {
                        let node = ast.node(id);
                        self.diagnostics.push(Diagnostic::new(
                            ErrorCode::ReferenceToNonexistentObject,
                            &*node.file,
                            node.line,
                            format!("base object '{base}' is not defined"),
                        ));
                        continue;
                    }
                },
            };
            let Some(root) = source.roots.first().and_then(|&r| source.object(r)) else {
                continue;
            };
            for &child in &root.children {
                let sub = source.extract(child);
                inherited.push(ast.graft(&sub, Some(id)));
            }
        }

        if !inherited.is_empty() {
            if let Some(obj) = ast.object_mut(id) {
                inherited.extend_from_slice(&own_children);
                obj.children = inherited;
            }
        }

        for child in own_children {
            self.inherit(ast, child, earlier);
        }
    }

    // --- Variables ---

    fn process_variables(&mut self, ast: &mut Ast) {
        let roots = ast.roots.clone();
        let mut kept = Vec::with_capacity(roots.len());
        for root in roots {
            if self.substitute(ast, root) {
                kept.push(root);
            }
        }
        ast.roots = kept;
    }

    /// Replaces variable references below `id`. Returns false when `id` is a
    /// property that referenced an undefined variable and must be dropped.
    fn substitute(&mut self, ast: &mut Ast, id: NodeId) -> bool {
        match &ast.node(id).kind {
            NodeKind::Property(prop) => {
                let values = prop.values.clone();
                match self.expand(ast, id, &values) {
                    Some(values) => {
                        if let NodeKind::Property(prop) = &mut ast.node_mut(id).kind {
                            prop.values = values;
                        }
                        true
                    }
                    None => false,
                }
            }
            NodeKind::Object(obj) => {
                let values = obj.values.clone();
                let children = obj.children.clone();
                if let Some(values) = self.expand(ast, id, &values) {
                    if let Some(obj) = ast.object_mut(id) {
                        obj.values = values;
                    }
                }
                let kept: Vec<NodeId> = children
                    .into_iter()
                    .filter(|&c| self.substitute(ast, c))
                    .collect();
                if let Some(obj) = ast.object_mut(id) {
                    obj.children = kept;
                }
                true
            }
            _ => true,
        }
    }

    fn expand(&mut self, ast: &mut Ast, owner: NodeId, values: &[NodeId]) -> Option<Vec<NodeId>> {
        if !values
            .iter()
            .any(|&v| matches!(ast.node(v).kind, NodeKind::VariableGet(_)))
        {
            return Some(values.to_vec());
        }

        let mut out = Vec::with_capacity(values.len());
        for &v in values {
            let node = ast.node(v).clone();
            let NodeKind::VariableGet(name) = &node.kind else {
                out.push(v);
                continue;
            };
            let Some(value) = lookup_variable(ast, owner, name) else {
                self.diagnostics.push(Diagnostic::new(
                    ErrorCode::UndefinedVariable,
                    &*node.file,
                    node.line,
                    format!("undefined variable ${name}"),
                ));
                return None;
            };
            for token in Lexer::new(&value, &node.file).tokenize() {
                let atom = match token.kind {
                    TokenKind::Word => AtomNode::new(token.lexeme.as_str()),
                    TokenKind::Quote => AtomNode {
                        id: Opcode::Unspecified,
                        value: token.text().to_string(),
                    },
                    _ => continue,
                };
                out.push(ast.push(AbstractNode {
                    file: Arc::clone(&node.file),
                    line: node.line,
                    parent: Some(owner),
                    kind: NodeKind::Atom(atom),
                }));
            }
        }
        Some(out)
    }
}

fn push_atom(tree: &ConcreteTree, id: NodeId, parent: NodeId, ast: &mut Ast) -> NodeId {
    let c = tree.node(id);
    let kind = match c.kind {
        ConcreteKind::Variable => NodeKind::VariableGet(c.token.trim_start_matches('$').to_string()),
        ConcreteKind::Quote => NodeKind::Atom(AtomNode {
            id: Opcode::Unspecified,
            value: c.token.clone(),
        }),
        _ => NodeKind::Atom(AtomNode::new(c.token.as_str())),
    };
    ast.push(AbstractNode {
        file: Arc::clone(&c.file),
        line: c.line,
        parent: Some(parent),
        kind,
    })
}

/// Searches the scopes enclosing `owner` outward, ending at file scope.
fn lookup_variable(ast: &Ast, owner: NodeId, name: &str) -> Option<String> {
    let find_in = |ids: &[NodeId]| {
        ids.iter().rev().find_map(|&c| match &ast.node(c).kind {
            NodeKind::VariableSet(var) if var.name == name => Some(var.value.clone()),
            _ => None,
        })
    };

    let mut scope = ast.node(owner).parent;
    while let Some(s) = scope {
        if let Some(value) = ast.object(s).and_then(|obj| find_in(&obj.children)) {
            return Some(value);
        }
        scope = ast.node(s).parent;
    }
    find_in(&ast.roots)
}
