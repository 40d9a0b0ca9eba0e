//! AST → binary translators, one per object kind.
//!
//! Every object is buffered in an [`ObjectWriter`] so its child count and
//! body length are known before the header is written. A property or nested
//! object that fails validation contributes nothing to the output; the
//! failure is recorded as a diagnostic and translation carries on with the
//! next sibling.

mod args;
mod gpu_program;
mod material;
mod pass;
mod sampler;
mod technique;
mod texture_unit;

pub use args::Args;
pub use gpu_program::{
    ConstantBufferRefTranslator, ConstantBufferTranslator, GpuProgramRefTranslator,
    GpuProgramTranslator, ShaderRefTranslator, ShaderTranslator, SHADER_STAGES,
};
pub use material::MaterialTranslator;
pub use pass::PassTranslator;
pub use sampler::SamplerTranslator;
pub use technique::TechniqueTranslator;
pub use texture_unit::TextureUnitTranslator;

use log::{debug, warn};

use crate::opcode::Opcode;
use crate::script::ast::{Ast, NodeId, NodeKind};
use crate::script::{Diagnostic, ErrorCode};
use crate::wire::{WireWriter, MAX_STRING_LEN};

/// Shared state for one translation run.
pub struct TranslateContext<'a> {
    pub ast: &'a Ast,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> TranslateContext<'a> {
    pub fn new(ast: &'a Ast) -> Self {
        Self {
            ast,
            diagnostics: Vec::new(),
        }
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        warn!("{diagnostic}");
        self.diagnostics.push(diagnostic);
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

/// Buffered children of an object under construction.
#[derive(Debug, Default)]
pub struct ObjectWriter {
    children: WireWriter,
    count: u16,
}

impl ObjectWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> u16 {
        self.count
    }

    /// True once the child count field can take no more entries.
    pub fn is_full(&self) -> bool {
        self.count == u16::MAX
    }

    /// Callers check [`is_full`](Self::is_full) first.
    pub fn property(&mut self, op: Opcode, payload: &[u8]) {
        debug_assert!(!self.is_full());
        self.children.write_property(op, payload);
        self.count += 1;
    }

    /// Callers check [`is_full`](Self::is_full) first.
    pub fn object(&mut self, op: Opcode, name: &str, child: ObjectWriter) {
        debug_assert!(!self.is_full());
        self.children
            .write_object(op, name, child.count, child.children.as_bytes());
        self.count += 1;
    }

    /// Writes the finished object, header first.
    pub fn finish(self, op: Opcode, name: &str, out: &mut WireWriter) {
        out.write_object(op, name, self.count, self.children.as_bytes());
    }
}

pub trait Translator {
    /// Kind name used in diagnostics.
    fn kind(&self) -> &'static str;

    fn requires_name(&self) -> bool {
        false
    }

    /// Object kinds that may be nested inside this one.
    fn child_kinds(&self) -> &'static [Opcode] {
        &[]
    }

    /// Encodes one property's payload.
    fn property(&self, args: &Args<'_>, out: &mut WireWriter) -> Result<(), Diagnostic>;

    fn translate(
        &self,
        cx: &mut TranslateContext<'_>,
        obj: NodeId,
        out: &mut ObjectWriter,
    ) -> Result<(), Diagnostic> {
        let ast = cx.ast;
        let node = ast.node(obj);
        let Some(object) = ast.object(obj) else {
            return Ok(());
        };

        if self.requires_name() && object.name.is_empty() {
            return Err(Diagnostic::new(
                ErrorCode::ObjectNameExpected,
                &*node.file,
                node.line,
                format!("{} requires a name", object.cls),
            ));
        }

        if object.name.len() > MAX_STRING_LEN {
            return Err(Diagnostic::new(
                ErrorCode::InvalidParameters,
                &*node.file,
                node.line,
                format!(
                    "{} name is {} bytes, the limit is {MAX_STRING_LEN}",
                    object.cls,
                    object.name.len()
                ),
            ));
        }

        for &child in &object.children {
            let child_node = ast.node(child);
            let is_entry = match &child_node.kind {
                NodeKind::Object(inner) => !inner.is_abstract,
                NodeKind::Property(_) => true,
                _ => false,
            };
            if is_entry && out.is_full() {
                cx.report(Diagnostic::new(
                    ErrorCode::InvalidParameters,
                    &*child_node.file,
                    child_node.line,
                    format!(
                        "{} '{}' cannot hold more than {} children; the rest are dropped",
                        object.cls,
                        object.name,
                        u16::MAX
                    ),
                ));
                break;
            }
            match &child_node.kind {
                NodeKind::Object(inner) => {
                    if inner.is_abstract {
                        continue;
                    }
                    if self.child_kinds().contains(&inner.id) {
                        translate_nested(cx, child, out);
                    } else {
                        cx.report(Diagnostic::new(
                            ErrorCode::UnexpectedToken,
                            &*child_node.file,
                            child_node.line,
                            format!("{} is not allowed inside {}", inner.cls, self.kind()),
                        ));
                    }
                }
                NodeKind::Property(prop) => {
                    let Some(args) = Args::new(ast, child) else {
                        continue;
                    };
                    let mut payload = WireWriter::new();
                    match self.property(&args, &mut payload) {
                        Ok(()) => out.property(prop.id, payload.as_bytes()),
                        Err(d) => cx.report(d),
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// Translator for any object kind, wherever it appears.
pub fn translator_for(op: Opcode) -> Option<&'static dyn Translator> {
    match op {
        Opcode::Material => Some(&MaterialTranslator),
        Opcode::Technique => Some(&TechniqueTranslator),
        Opcode::Pass => Some(&PassTranslator),
        Opcode::TextureUnit => Some(&TextureUnitTranslator),
        Opcode::Sampler => Some(&SamplerTranslator),
        Opcode::GpuProgram => Some(&GpuProgramTranslator),
        Opcode::GpuProgramRef => Some(&GpuProgramRefTranslator),
        Opcode::GpuCbuffer => Some(&ConstantBufferTranslator),
        Opcode::GpuCbufferRef => Some(&ConstantBufferRefTranslator),
        Opcode::VertexProgram
        | Opcode::FragmentProgram
        | Opcode::GeometryProgram
        | Opcode::TessellationHullProgram
        | Opcode::TessellationDomainProgram
        | Opcode::ComputeProgram => Some(&ShaderTranslator),
        Opcode::VertexProgramRef
        | Opcode::FragmentProgramRef
        | Opcode::GeometryProgramRef
        | Opcode::TessellationHullProgramRef
        | Opcode::TessellationDomainProgramRef
        | Opcode::ComputeProgramRef
        | Opcode::ShadowCasterVertexProgramRef
        | Opcode::ShadowCasterFragmentProgramRef
        | Opcode::ShadowReceiverVertexProgramRef
        | Opcode::ShadowReceiverFragmentProgramRef => Some(&ShaderRefTranslator),
        _ => None,
    }
}

/// Translates one top-level object and appends it to `out`. Returns false
/// when the object produced nothing.
pub fn translate_top_level(cx: &mut TranslateContext<'_>, id: NodeId, out: &mut WireWriter) -> bool {
    let ast = cx.ast;
    let node = ast.node(id);
    let Some(object) = ast.object(id) else {
        return false;
    };
    if object.is_abstract {
        debug!("skipping abstract {} {}", object.cls, object.name);
        return false;
    }

    let translator = translator_for(object.id).filter(|_| object.id.is_top_level());
    let Some(translator) = translator else {
        cx.report(Diagnostic::new(
            ErrorCode::UnknownObject,
            &*node.file,
            node.line,
            format!("'{}' cannot be compiled as a top-level object", object.cls),
        ));
        return false;
    };

    let mut body = ObjectWriter::new();
    match translator.translate(cx, id, &mut body) {
        Ok(()) => {
            debug!("translated {} {} ({} children)", object.cls, object.name, body.count());
            body.finish(object.id, &object.name, out);
            true
        }
        Err(d) => {
            cx.report(d);
            false
        }
    }
}

fn translate_nested(cx: &mut TranslateContext<'_>, id: NodeId, parent: &mut ObjectWriter) {
    let ast = cx.ast;
    let Some(object) = ast.object(id) else { return };
    let Some(translator) = translator_for(object.id) else {
        let node = ast.node(id);
        cx.report(Diagnostic::new(
            ErrorCode::UnknownObject,
            &*node.file,
            node.line,
            format!("unknown object type '{}'", object.cls),
        ));
        return;
    };

    let mut body = ObjectWriter::new();
    match translator.translate(cx, id, &mut body) {
        Ok(()) => parent.object(object.id, &object.name, body),
        Err(d) => cx.report(d),
    }
}
