use thiserror::Error;

use crate::scene::{NodeKind, Scene};

use super::backend::{FrameStatus, RenderBackend};
use super::program::{ProgramDescriptor, ProgramProxy};
use super::shader::ShaderError;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to build program #{index} ({kind})")]
    Program {
        index: usize,
        kind: NodeKind,
        #[source]
        source: ShaderError,
    },
}

/// Ordered program proxies, built once.
///
/// Each frame clears the target to the scene color, then runs every proxy in
/// registration order. No sorting, culling or batching happens here.
#[derive(Debug, Default)]
pub struct Renderer {
    proxies: Vec<ProgramProxy>,
}

impl Renderer {
    /// Builds every program, or none.
    ///
    /// On the first failure the error is logged, the programs built so far
    /// are released and the renderer comes back empty: it still clears and
    /// finishes frames but draws nothing.
    pub fn new<B: RenderBackend + ?Sized>(
        backend: &mut B,
        descriptors: Vec<ProgramDescriptor>,
    ) -> Self {
        match Self::try_new(backend, descriptors) {
            Ok(renderer) => renderer,
            Err(RenderError::Program { index, kind, source }) => {
                log::error!("failed to build program #{index} ({kind}), rendering nothing: {source}");
                Self::default()
            }
        }
    }

    /// Like [`Renderer::new`], but hands the failure back to the caller.
    pub fn try_new<B: RenderBackend + ?Sized>(
        backend: &mut B,
        descriptors: Vec<ProgramDescriptor>,
    ) -> Result<Self, RenderError> {
        let mut proxies: Vec<ProgramProxy> = Vec::with_capacity(descriptors.len());

        for (index, d) in descriptors.into_iter().enumerate() {
            let kind = d.kind();
            match backend.create_program(kind, &d.vertex_source, &d.fragment_source) {
                Ok(program) => {
                    log::debug!("built {kind} program {program:?}");
                    proxies.push(ProgramProxy::new(program, d.strategy));
                }
                Err(source) => {
                    for mut proxy in proxies {
                        proxy.release(backend);
                    }
                    return Err(RenderError::Program {
                        index,
                        kind,
                        source,
                    });
                }
            }
        }

        Ok(Self { proxies })
    }

    pub fn proxies(&self) -> &[ProgramProxy] {
        &self.proxies
    }

    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }

    /// Draws one frame of `scene`.
    pub fn render<B: RenderBackend + ?Sized>(&mut self, backend: &mut B, scene: &Scene) -> FrameStatus {
        let viewport = backend.surface_size();
        backend.clear(scene.color(), viewport);

        for proxy in &mut self.proxies {
            backend.use_program(proxy.program());
            proxy.render(backend, scene);
        }

        backend.finish_frame()
    }

    /// Releases every program and the resources its strategy holds.
    pub fn release<B: RenderBackend + ?Sized>(&mut self, backend: &mut B) {
        for mut proxy in self.proxies.drain(..) {
            proxy.release(backend);
        }
    }
}
