use serde::Serialize;
use thiserror::Error;

opcode_enum! {
    ShaderKind("shader kind") {
        Vertex => VertexProgram,
        Fragment => FragmentProgram,
        Geometry => GeometryProgram,
        TessellationHull => TessellationHullProgram,
        TessellationDomain => TessellationDomainProgram,
        Compute => ComputeProgram,
    }
}

impl ShaderKind {
    /// The stage name a shader of this kind must declare.
    pub fn stage(self) -> &'static str {
        match self {
            ShaderKind::Vertex => "vs",
            ShaderKind::Fragment => "ps",
            ShaderKind::Geometry => "gs",
            ShaderKind::TessellationHull => "hs",
            ShaderKind::TessellationDomain => "ds",
            ShaderKind::Compute => "cs",
        }
    }
}

opcode_enum! {
    /// Per-stage program references inside a pass.
    ShaderRefKind("program reference") {
        Vertex => VertexProgramRef,
        Fragment => FragmentProgramRef,
        Geometry => GeometryProgramRef,
        TessellationHull => TessellationHullProgramRef,
        TessellationDomain => TessellationDomainProgramRef,
        Compute => ComputeProgramRef,
        ShadowCasterVertex => ShadowCasterVertexProgramRef,
        ShadowCasterFragment => ShadowCasterFragmentProgramRef,
        ShadowReceiverVertex => ShadowReceiverVertexProgramRef,
        ShadowReceiverFragment => ShadowReceiverFragmentProgramRef,
    }
}

/// Element type of a constant buffer field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum BuiltinType {
    None = 0,
    Real = 1,
    Int = 2,
}

impl BuiltinType {
    pub fn from_u8(value: u8) -> Option<BuiltinType> {
        match value {
            0 => Some(BuiltinType::None),
            1 => Some(BuiltinType::Real),
            2 => Some(BuiltinType::Int),
            _ => None,
        }
    }

    /// Bytes per element.
    pub fn size(self) -> usize {
        match self {
            BuiltinType::None => 0,
            BuiltinType::Real | BuiltinType::Int => 4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Shader {
    pub kind: ShaderKind,
    pub name: String,
    pub source: String,
    pub target: String,
    pub entry_point: String,
    pub stage: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GpuProgram {
    pub name: String,
    pub shaders: Vec<Shader>,
}

impl GpuProgram {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            shaders: Vec::new(),
        }
    }

    pub fn shader(&self, kind: ShaderKind) -> Option<&Shader> {
        self.shaders.iter().find(|s| s.kind == kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKey {
    Index(u32),
    Name(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamValue {
    Real(Vec<f32>),
    Int(Vec<i32>),
    /// Supplied by the engine each frame.
    Auto {
        constant: String,
        code: u16,
        extra_type: BuiltinType,
        extras: Vec<f32>,
    },
}

/// One shader parameter, sized in 4-byte slots.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstantParam {
    pub key: ParamKey,
    pub element_type: BuiltinType,
    pub slots: u8,
    pub value: ParamValue,
}

impl ConstantParam {
    /// Initial buffer contents for this field. Auto constants start zeroed.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![0u8; self.slots as usize * 4];
        match &self.value {
            ParamValue::Real(values) => {
                for (chunk, v) in bytes.chunks_exact_mut(4).zip(values) {
                    chunk.copy_from_slice(&v.to_le_bytes());
                }
            }
            ParamValue::Int(values) => {
                for (chunk, v) in bytes.chunks_exact_mut(4).zip(values) {
                    chunk.copy_from_slice(&v.to_le_bytes());
                }
            }
            ParamValue::Auto { .. } => {}
        }
        bytes
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstantBufferError {
    #[error("declarations cannot be added after data is bound")]
    DeclarationAfterBind,
    #[error("declared size of {bytes} bytes is not a multiple of 16")]
    Misaligned { bytes: usize },
    #[error("declared size is {expected} bytes but {actual} bytes were bound")]
    SizeMismatch { expected: usize, actual: usize },
}

/// A block of shader constants: field declarations first, then one binding
/// of the backing data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GpuConstBuffer {
    pub name: String,
    pub shared_params_ref: Option<String>,
    pub params: Vec<ConstantParam>,
    declarations: Vec<(BuiltinType, u32)>,
    data: Option<Vec<u8>>,
}

impl GpuConstBuffer {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            shared_params_ref: None,
            params: Vec::new(),
            declarations: Vec::new(),
            data: None,
        }
    }

    pub fn add_declaration(&mut self, ty: BuiltinType, count: u32) -> Result<(), ConstantBufferError> {
        if self.data.is_some() {
            return Err(ConstantBufferError::DeclarationAfterBind);
        }
        self.declarations.push((ty, count));
        Ok(())
    }

    pub fn declarations(&self) -> &[(BuiltinType, u32)] {
        &self.declarations
    }

    /// Sum of every declared field, four bytes per element.
    pub fn declared_size(&self) -> usize {
        self.declarations.iter().map(|&(_, n)| n as usize * 4).sum()
    }

    pub fn bind_data(&mut self, data: Vec<u8>) -> Result<(), ConstantBufferError> {
        let expected = self.declared_size();
        if expected % 16 != 0 {
            return Err(ConstantBufferError::Misaligned { bytes: expected });
        }
        if expected != data.len() {
            return Err(ConstantBufferError::SizeMismatch {
                expected,
                actual: data.len(),
            });
        }
        self.data = Some(data);
        Ok(())
    }

    pub fn is_bound(&self) -> bool {
        self.data.is_some()
    }

    pub fn data(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }

    pub fn buffer_size(&self) -> usize {
        match &self.data {
            Some(data) => data.len(),
            None => self.declared_size(),
        }
    }

    pub fn param(&self, key: &ParamKey) -> Option<&ConstantParam> {
        self.params.iter().find(|p| &p.key == key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConstantBufferRef {
    pub name: String,
    pub slot: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GpuProgramRef {
    pub name: String,
    pub cbuffer_refs: Vec<ConstantBufferRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShaderRef {
    pub kind: ShaderRefKind,
    pub name: String,
    pub params: Vec<ConstantParam>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aligned_fields_bind() {
        let mut cb = GpuConstBuffer::new("cb");
        cb.add_declaration(BuiltinType::Real, 8).unwrap();
        cb.add_declaration(BuiltinType::Real, 8).unwrap();
        assert_eq!(cb.declared_size(), 64);
        cb.bind_data(vec![0; 64]).unwrap();
        assert_eq!(cb.buffer_size(), 64);
    }

    #[test]
    fn misaligned_fields_fail() {
        let mut cb = GpuConstBuffer::new("cb");
        cb.add_declaration(BuiltinType::Real, 8).unwrap();
        cb.add_declaration(BuiltinType::Real, 9).unwrap();
        assert_eq!(
            cb.bind_data(vec![0; 68]),
            Err(ConstantBufferError::Misaligned { bytes: 68 })
        );
        assert!(!cb.is_bound());
        assert_eq!(cb.buffer_size(), 68);
    }

    #[test]
    fn data_length_must_match() {
        let mut cb = GpuConstBuffer::new("cb");
        cb.add_declaration(BuiltinType::Int, 4).unwrap();
        assert_eq!(
            cb.bind_data(vec![0; 32]),
            Err(ConstantBufferError::SizeMismatch {
                expected: 16,
                actual: 32
            })
        );
    }

    #[test]
    fn no_declarations_after_bind() {
        let mut cb = GpuConstBuffer::new("cb");
        cb.add_declaration(BuiltinType::Real, 4).unwrap();
        cb.bind_data(vec![0; 16]).unwrap();
        assert_eq!(
            cb.add_declaration(BuiltinType::Real, 4),
            Err(ConstantBufferError::DeclarationAfterBind)
        );
    }

    #[test]
    fn param_bytes_are_zero_filled() {
        let param = ConstantParam {
            key: ParamKey::Name("tint".into()),
            element_type: BuiltinType::Real,
            slots: 4,
            value: ParamValue::Real(vec![1.0, 0.5]),
        };
        let bytes = param.to_bytes();
        assert_eq!(bytes.len(), 16);
        assert_eq!(&bytes[0..4], &1.0f32.to_le_bytes());
        assert_eq!(&bytes[8..16], &[0; 8]);
    }

    #[test]
    fn shader_stage_names() {
        assert_eq!(ShaderKind::Fragment.stage(), "ps");
        assert_eq!(ShaderKind::Compute.stage(), "cs");
    }
}
