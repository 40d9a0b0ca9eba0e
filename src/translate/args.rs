//! Typed access to a property's argument atoms.

use glam::Vec4;

use crate::opcode::Opcode;
use crate::script::ast::{Ast, AtomNode, NodeId};
use crate::script::{Diagnostic, ErrorCode};

pub struct Args<'a> {
    pub op: Opcode,
    pub name: &'a str,
    file: &'a str,
    line: u32,
    atoms: Vec<&'a AtomNode>,
}

impl<'a> Args<'a> {
    /// Arguments of a property node. Returns `None` for other node kinds.
    pub fn new(ast: &'a Ast, id: NodeId) -> Option<Self> {
        let prop = ast.property(id)?;
        let node = ast.node(id);
        Some(Self {
            op: prop.id,
            name: &prop.name,
            file: &node.file,
            line: node.line,
            atoms: prop.values.iter().filter_map(|&v| ast.atom(v)).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn error(&self, code: ErrorCode, message: impl std::fmt::Display) -> Diagnostic {
        Diagnostic::new(code, self.file, self.line, format!("{}: {message}", self.name))
    }

    /// The property is not understood by the enclosing object.
    pub fn unexpected(&self, object: &str) -> Diagnostic {
        self.error(
            ErrorCode::UnexpectedToken,
            format!("not a valid property of {object}"),
        )
    }

    /// Checks `min <= len <= max` and returns the argument count.
    pub fn arity(&self, min: usize, max: usize) -> Result<usize, Diagnostic> {
        let n = self.len();
        if n < min {
            let expected = if min == max {
                format!("{min}")
            } else {
                format!("at least {min}")
            };
            return Err(self.error(
                ErrorCode::InvalidParameters,
                format!("expected {expected} arguments, received {n}"),
            ));
        }
        if n > max {
            let expected = if min == max {
                format!("{max}")
            } else {
                format!("{min} to {max}")
            };
            return Err(self.error(
                ErrorCode::FewerParametersExpected,
                format!("expected {expected} arguments, received {n}"),
            ));
        }
        Ok(n)
    }

    /// Checks that the argument count is one of `allowed`.
    pub fn arity_in(&self, allowed: &[usize]) -> Result<usize, Diagnostic> {
        let n = self.len();
        if allowed.contains(&n) {
            return Ok(n);
        }
        let list: Vec<String> = allowed.iter().map(|a| a.to_string()).collect();
        let code = if allowed.iter().all(|&a| a < n) {
            ErrorCode::FewerParametersExpected
        } else {
            ErrorCode::InvalidParameters
        };
        Err(self.error(
            code,
            format!("expected {} arguments, received {n}", list.join(" or ")),
        ))
    }

    pub fn exactly(&self, n: usize) -> Result<(), Diagnostic> {
        self.arity(n, n).map(|_| ())
    }

    fn atom(&self, i: usize) -> Result<&'a AtomNode, Diagnostic> {
        self.atoms.get(i).copied().ok_or_else(|| {
            self.error(
                ErrorCode::InvalidParameters,
                format!("missing argument {}", i + 1),
            )
        })
    }

    pub fn text(&self, i: usize) -> Result<&'a str, Diagnostic> {
        Ok(&self.atom(i)?.value)
    }

    /// Keyword opcode of argument `i`, `Unspecified` for names and numbers.
    pub fn opcode(&self, i: usize) -> Result<Opcode, Diagnostic> {
        Ok(self.atom(i)?.id)
    }

    pub fn string(&self, i: usize) -> Result<&'a str, Diagnostic> {
        let atom = self.atom(i)?;
        if atom.value.len() > crate::wire::MAX_STRING_LEN {
            return Err(self.error(
                ErrorCode::StringExpected,
                format!("argument {} is longer than {} bytes", i + 1, crate::wire::MAX_STRING_LEN),
            ));
        }
        Ok(&atom.value)
    }

    pub fn is_number(&self, i: usize) -> bool {
        self.atoms
            .get(i)
            .is_some_and(|a| a.value.parse::<f32>().is_ok())
    }

    pub fn f32(&self, i: usize) -> Result<f32, Diagnostic> {
        let atom = self.atom(i)?;
        atom.value.parse::<f32>().map_err(|_| {
            self.error(
                ErrorCode::NumberExpected,
                format!("expected a number, received '{}'", atom.value),
            )
        })
    }

    pub fn u32(&self, i: usize) -> Result<u32, Diagnostic> {
        let atom = self.atom(i)?;
        atom.value.parse::<u32>().map_err(|_| {
            self.error(
                ErrorCode::NumberExpected,
                format!("expected an unsigned integer, received '{}'", atom.value),
            )
        })
    }

    pub fn i32(&self, i: usize) -> Result<i32, Diagnostic> {
        let atom = self.atom(i)?;
        atom.value.parse::<i32>().map_err(|_| {
            self.error(
                ErrorCode::NumberExpected,
                format!("expected an integer, received '{}'", atom.value),
            )
        })
    }

    pub fn bool(&self, i: usize) -> Result<bool, Diagnostic> {
        match self.atom(i)?.id {
            Opcode::On => Ok(true),
            Opcode::Off => Ok(false),
            _ => Err(self.error(
                ErrorCode::InvalidParameters,
                format!("expected on or off, received '{}'", self.atoms[i].value),
            )),
        }
    }

    /// Argument `i` must be one of the given keywords.
    pub fn one_of(&self, i: usize, allowed: &[Opcode]) -> Result<Opcode, Diagnostic> {
        let atom = self.atom(i)?;
        if allowed.contains(&atom.id) {
            return Ok(atom.id);
        }
        let names: Vec<String> = allowed.iter().map(|op| op.name()).collect();
        Err(self.error(
            ErrorCode::InvalidParameters,
            format!("expected one of {}, received '{}'", names.join("|"), atom.value),
        ))
    }

    /// Reads a colour from `count` (3 or 4) numbers starting at `start`.
    /// Alpha defaults to 1.
    pub fn colour(&self, start: usize, count: usize) -> Result<Vec4, Diagnostic> {
        let r = self.f32(start)?;
        let g = self.f32(start + 1)?;
        let b = self.f32(start + 2)?;
        let a = if count >= 4 { self.f32(start + 3)? } else { 1.0 };
        Ok(Vec4::new(r, g, b, a))
    }
}
