//! WGSL program validation.
//!
//! A program is a vertex source and a fragment source. Each is parsed and
//! validated on its own ("compile"), then the pair is checked for matching
//! entry points and stage interface locations ("link").

use core::fmt;

use thiserror::Error;
use wgpu::naga;

use crate::scene::NodeKind;

/// Vertex entry point every vertex source must define.
pub const VERTEX_ENTRY: &str = "vs_main";

/// Fragment entry point every fragment source must define.
pub const FRAGMENT_ENTRY: &str = "fs_main";

/// Shader stage of a program source.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        })
    }
}

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("{kind} program: {stage} shader failed to compile:\n{diagnostic}")]
    Parse {
        kind: NodeKind,
        stage: ShaderStage,
        diagnostic: String,
    },

    #[error("{kind} program: {stage} shader failed validation:\n{diagnostic}")]
    Validation {
        kind: NodeKind,
        stage: ShaderStage,
        diagnostic: String,
    },

    #[error("{kind} program failed to link: {reason}")]
    Link { kind: NodeKind, reason: String },
}

impl ShaderError {
    pub fn kind(&self) -> NodeKind {
        match self {
            ShaderError::Parse { kind, .. }
            | ShaderError::Validation { kind, .. }
            | ShaderError::Link { kind, .. } => *kind,
        }
    }
}

/// Compiles both sources and links them.
pub fn validate_program(
    kind: NodeKind,
    vertex_source: &str,
    fragment_source: &str,
) -> Result<(), ShaderError> {
    let vertex = compile(kind, ShaderStage::Vertex, vertex_source)?;
    let fragment = compile(kind, ShaderStage::Fragment, fragment_source)?;
    link(kind, &vertex, &fragment)
}

fn compile(kind: NodeKind, stage: ShaderStage, source: &str) -> Result<naga::Module, ShaderError> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| ShaderError::Parse {
        kind,
        stage,
        diagnostic: e.emit_to_string(source),
    })?;

    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::default(),
    )
    .validate(&module)
    .map_err(|e| ShaderError::Validation {
        kind,
        stage,
        diagnostic: e.to_string(),
    })?;

    Ok(module)
}

fn link(kind: NodeKind, vertex: &naga::Module, fragment: &naga::Module) -> Result<(), ShaderError> {
    let vs = find_entry(vertex, naga::ShaderStage::Vertex, VERTEX_ENTRY).ok_or_else(|| {
        ShaderError::Link {
            kind,
            reason: format!("vertex shader has no @vertex fn {VERTEX_ENTRY}"),
        }
    })?;
    let fs = find_entry(fragment, naga::ShaderStage::Fragment, FRAGMENT_ENTRY).ok_or_else(|| {
        ShaderError::Link {
            kind,
            reason: format!("fragment shader has no @fragment fn {FRAGMENT_ENTRY}"),
        }
    })?;

    let mut outputs = Vec::new();
    if let Some(result) = &vs.function.result {
        collect_locations(vertex, result.ty, result.binding.as_ref(), &mut outputs);
    }

    let mut inputs = Vec::new();
    for arg in &fs.function.arguments {
        collect_locations(fragment, arg.ty, arg.binding.as_ref(), &mut inputs);
    }

    if let Some(missing) = inputs.iter().find(|loc| !outputs.contains(loc)) {
        return Err(ShaderError::Link {
            kind,
            reason: format!("fragment input @location({missing}) is not written by the vertex shader"),
        });
    }

    Ok(())
}

fn find_entry<'m>(
    module: &'m naga::Module,
    stage: naga::ShaderStage,
    name: &str,
) -> Option<&'m naga::EntryPoint> {
    module
        .entry_points
        .iter()
        .find(|ep| ep.stage == stage && ep.name == name)
}

/// `@location` indices carried by a value, looking through one struct level.
fn collect_locations(
    module: &naga::Module,
    ty: naga::Handle<naga::Type>,
    binding: Option<&naga::Binding>,
    out: &mut Vec<u32>,
) {
    match binding {
        Some(naga::Binding::Location { location, .. }) => out.push(*location),
        Some(naga::Binding::BuiltIn(_)) => {}
        None => {
            if let naga::TypeInner::Struct { members, .. } = &module.types[ty].inner {
                for member in members {
                    if let Some(naga::Binding::Location { location, .. }) = &member.binding {
                        out.push(*location);
                    }
                }
            }
        }
    }
}
