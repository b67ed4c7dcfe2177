use std::borrow::Cow;
use std::collections::HashMap;
use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};
use image::RgbaImage;
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;

use crate::assets::ImageHandle;
use crate::coords::{ColorRgba, Matrix3x3, Viewport};
use crate::device::{Gpu, SurfaceErrorAction};
use crate::render::shader::{self, ShaderError, FRAGMENT_ENTRY, VERTEX_ENTRY};
use crate::scene::NodeKind;

use super::{BufferId, FrameStatus, ProgramId, RenderBackend, TextureId, Uniform, VertexStream};

// ── uniforms ──────────────────────────────────────────────────────────────

/// Per-draw uniform block, matching `DrawUniforms` in the bundled shaders.
///
/// `mat3x3<f32>` columns are padded to 16 bytes in uniform memory.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct DrawUniforms {
    projection: [[f32; 4]; 3],
    camera: [[f32; 4]; 3],
    transform: [[f32; 4]; 3],
    color: [f32; 4],
}

impl Default for DrawUniforms {
    fn default() -> Self {
        let identity = Matrix3x3::IDENTITY.to_padded_columns();
        Self {
            projection: identity,
            camera: identity,
            transform: identity,
            color: ColorRgba::white().to_array(),
        }
    }
}

fn uniform_binding_size() -> NonZeroU64 {
    NonZeroU64::new(std::mem::size_of::<DrawUniforms>() as u64)
        .expect("DrawUniforms has non-zero size by construction")
}

fn straight_alpha_blend() -> wgpu::BlendState {
    wgpu::BlendState::ALPHA_BLENDING
}

// ── vertex streams ────────────────────────────────────────────────────────

const POSITION_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];
const TEX_COORD_ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![1 => Float32x2];

fn stream_layout(attributes: &'static [wgpu::VertexAttribute]) -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: (2 * std::mem::size_of::<f32>()) as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes,
    }
}

// ── recorded frame ────────────────────────────────────────────────────────

#[derive(Debug, Default, Copy, Clone)]
struct BoundState {
    program: Option<ProgramId>,
    position: Option<BufferId>,
    tex_coord: Option<BufferId>,
    texture: Option<TextureId>,
    uniforms: DrawUniforms,
}

#[derive(Debug, Copy, Clone)]
struct RecordedDraw {
    program: ProgramId,
    position: BufferId,
    tex_coord: Option<BufferId>,
    texture: Option<TextureId>,
    uniform_offset: u32,
    vertex_count: u32,
}

struct ProgramEntry {
    kind: NodeKind,
    pipeline: wgpu::RenderPipeline,
}

struct TextureEntry {
    _texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
}

/// [`RenderBackend`] drawing into a window surface through wgpu.
///
/// Calls between `clear` and `finish_frame` are recorded; `finish_frame`
/// uploads every draw's uniforms into one dynamic-offset buffer and encodes a
/// single render pass that clears to the scene color and replays the draws.
///
/// Bind groups used by programs:
/// - group 0, binding 0: `DrawUniforms` (vertex + fragment)
/// - group 1, binding 0/1: image texture + sampler (texture programs only)
pub struct WgpuBackend {
    gpu: Gpu,
    next_id: u32,

    uniform_layout: wgpu::BindGroupLayout,
    texture_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    fallback_texture: TextureEntry,

    programs: HashMap<ProgramId, ProgramEntry>,
    buffers: HashMap<BufferId, wgpu::Buffer>,
    textures: HashMap<TextureId, TextureEntry>,

    uniform_stride: usize,
    uniform_ubo: Option<wgpu::Buffer>,
    uniform_bind_group: Option<wgpu::BindGroup>,
    uniform_capacity: usize,

    clear_color: ColorRgba,
    viewport: Viewport,
    bound: BoundState,
    uniform_data: Vec<u8>,
    draws: Vec<RecordedDraw>,
}

impl WgpuBackend {
    pub fn new(gpu: Gpu) -> Self {
        let device = gpu.device();

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("quadra uniforms bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: Some(uniform_binding_size()),
                },
                count: None,
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("quadra texture bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("quadra image sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        let white = RgbaImage::from_pixel(1, 1, image::Rgba([255; 4]));
        let fallback_texture = upload_texture(&gpu, &texture_layout, &sampler, "fallback", &white);

        let alignment = device.limits().min_uniform_buffer_offset_alignment as usize;
        let uniform_stride = std::mem::size_of::<DrawUniforms>().next_multiple_of(alignment.max(1));

        let viewport = physical_viewport(gpu.size());

        Self {
            gpu,
            next_id: 1,
            uniform_layout,
            texture_layout,
            sampler,
            fallback_texture,
            programs: HashMap::new(),
            buffers: HashMap::new(),
            textures: HashMap::new(),
            uniform_stride,
            uniform_ubo: None,
            uniform_bind_group: None,
            uniform_capacity: 0,
            clear_color: ColorRgba::black(),
            viewport,
            bound: BoundState::default(),
            uniform_data: Vec::new(),
            draws: Vec::new(),
        }
    }

    pub fn gpu(&self) -> &Gpu {
        &self.gpu
    }

    /// Forwards a window resize to the surface.
    pub fn resize(&mut self, size: PhysicalSize<u32>) {
        self.gpu.resize(size);
    }

    fn alloc(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn build_pipeline(
        &self,
        kind: NodeKind,
        vertex_source: &str,
        fragment_source: &str,
    ) -> wgpu::RenderPipeline {
        let device = self.gpu.device();
        let label = kind.name();

        let vs = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(vertex_source)),
        });
        let fs = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(fragment_source)),
        });

        let (bind_group_layouts, buffers): (Vec<&wgpu::BindGroupLayout>, Vec<_>) = match kind {
            NodeKind::Color => (
                vec![&self.uniform_layout],
                vec![stream_layout(&POSITION_ATTRS)],
            ),
            NodeKind::Texture => (
                vec![&self.uniform_layout, &self.texture_layout],
                vec![stream_layout(&POSITION_ATTRS), stream_layout(&TEX_COORD_ATTRS)],
            ),
        };

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(label),
            bind_group_layouts: &bind_group_layouts,
            immediate_size: 0,
        });

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &vs,
                entry_point: Some(VERTEX_ENTRY),
                compilation_options: Default::default(),
                buffers: &buffers,
            },
            fragment: Some(wgpu::FragmentState {
                module: &fs,
                entry_point: Some(FRAGMENT_ENTRY),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.gpu.surface_format(),
                    blend: Some(straight_alpha_blend()),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        })
    }

    fn ensure_uniform_capacity(&mut self, required_draws: usize) {
        if required_draws <= self.uniform_capacity && self.uniform_bind_group.is_some() {
            return;
        }

        let new_cap = required_draws.next_power_of_two().max(64);
        let device = self.gpu.device();

        let ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("quadra draw uniforms"),
            size: (new_cap * self.uniform_stride) as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("quadra draw uniforms bind group"),
            layout: &self.uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &ubo,
                    offset: 0,
                    size: Some(uniform_binding_size()),
                }),
            }],
        });

        log::debug!("draw uniform capacity grown to {new_cap}");
        self.uniform_ubo = Some(ubo);
        self.uniform_bind_group = Some(bind_group);
        self.uniform_capacity = new_cap;
    }

    fn encode_frame(&mut self) -> FrameStatus {
        let mut frame = match self.gpu.begin_frame() {
            Ok(frame) => frame,
            Err(err) => {
                return match self.gpu.handle_surface_error(err) {
                    SurfaceErrorAction::Fatal => FrameStatus::Fatal,
                    SurfaceErrorAction::Reconfigured | SurfaceErrorAction::SkipFrame => {
                        FrameStatus::Skipped
                    }
                };
            }
        };

        {
            let mut rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("quadra scene pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: self.clear_color.r as f64,
                            g: self.clear_color.g as f64,
                            b: self.clear_color.b as f64,
                            a: self.clear_color.a as f64,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });

            let surface = physical_viewport(self.gpu.size());
            let w = self.viewport.width.min(surface.width);
            let h = self.viewport.height.min(surface.height);
            if w > 0.0 && h > 0.0 {
                rpass.set_viewport(0.0, 0.0, w, h, 0.0, 1.0);
            }

            if let Some(uniforms) = self.uniform_bind_group.as_ref() {
                for draw in &self.draws {
                    let Some(program) = self.programs.get(&draw.program) else { continue };
                    let Some(position) = self.buffers.get(&draw.position) else { continue };

                    rpass.set_pipeline(&program.pipeline);
                    rpass.set_bind_group(0, uniforms, &[draw.uniform_offset]);
                    rpass.set_vertex_buffer(0, position.slice(..));

                    if program.kind == NodeKind::Texture {
                        let Some(uv) = draw.tex_coord.and_then(|id| self.buffers.get(&id)) else {
                            continue;
                        };
                        let texture = draw
                            .texture
                            .and_then(|id| self.textures.get(&id))
                            .unwrap_or(&self.fallback_texture);

                        rpass.set_vertex_buffer(1, uv.slice(..));
                        rpass.set_bind_group(1, &texture.bind_group, &[]);
                    }

                    rpass.draw(0..draw.vertex_count, 0..1);
                }
            }
        }

        self.gpu.submit(frame);
        FrameStatus::Presented
    }
}

impl RenderBackend for WgpuBackend {
    fn surface_size(&self) -> Viewport {
        physical_viewport(self.gpu.size())
    }

    fn create_program(
        &mut self,
        kind: NodeKind,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<ProgramId, ShaderError> {
        shader::validate_program(kind, vertex_source, fragment_source)?;

        let pipeline = self.build_pipeline(kind, vertex_source, fragment_source);
        let id = ProgramId(self.alloc());
        self.programs.insert(id, ProgramEntry { kind, pipeline });
        Ok(id)
    }

    fn release_program(&mut self, program: ProgramId) {
        self.programs.remove(&program);
    }

    fn create_buffer(&mut self, data: &[f32]) -> BufferId {
        let buffer = self
            .gpu
            .device()
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("quadra vertex stream"),
                contents: bytemuck::cast_slice(data),
                usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            });

        let id = BufferId(self.alloc());
        self.buffers.insert(id, buffer);
        id
    }

    fn write_buffer(&mut self, buffer: BufferId, data: &[f32]) {
        match self.buffers.get(&buffer) {
            Some(b) => self.gpu.queue().write_buffer(b, 0, bytemuck::cast_slice(data)),
            None => log::warn!("write to unknown buffer {buffer:?}"),
        }
    }

    fn release_buffer(&mut self, buffer: BufferId) {
        self.buffers.remove(&buffer);
    }

    fn create_texture(&mut self, image: &ImageHandle) -> TextureId {
        let max = self.gpu.device().limits().max_texture_dimension_2d;
        let pixels = fit_texture(image.pixels(), max);
        if matches!(pixels, Cow::Owned(_)) {
            log::warn!(
                "image {} ({}x{}) resized to {}x{} for upload",
                image.name(),
                image.width(),
                image.height(),
                pixels.width(),
                pixels.height()
            );
        }

        let entry = upload_texture(&self.gpu, &self.texture_layout, &self.sampler, image.name(), &pixels);
        let id = TextureId(self.alloc());
        self.textures.insert(id, entry);
        id
    }

    fn release_texture(&mut self, texture: TextureId) {
        self.textures.remove(&texture);
    }

    fn clear(&mut self, color: ColorRgba, viewport: Viewport) {
        self.clear_color = color;
        self.viewport = viewport;
        self.draws.clear();
        self.uniform_data.clear();
    }

    fn use_program(&mut self, program: ProgramId) {
        self.bound.program = Some(program);
    }

    fn set_uniform(&mut self, uniform: Uniform) {
        let u = &mut self.bound.uniforms;
        match uniform {
            Uniform::Projection(m) => u.projection = m.to_padded_columns(),
            Uniform::Camera(m) => u.camera = m.to_padded_columns(),
            Uniform::Transform(m) => u.transform = m.to_padded_columns(),
            Uniform::Color(c) => u.color = c.to_array(),
        }
    }

    fn bind_vertex_buffer(&mut self, stream: VertexStream, buffer: BufferId) {
        match stream {
            VertexStream::Position => self.bound.position = Some(buffer),
            VertexStream::TexCoord => self.bound.tex_coord = Some(buffer),
        }
    }

    fn bind_texture(&mut self, texture: TextureId) {
        self.bound.texture = Some(texture);
    }

    fn draw_triangles(&mut self, vertex_count: u32) {
        let (Some(program), Some(position)) = (self.bound.program, self.bound.position) else {
            log::warn!("draw without program or position stream; skipped");
            return;
        };

        let offset = self.uniform_data.len();
        self.uniform_data
            .extend_from_slice(bytemuck::bytes_of(&self.bound.uniforms));
        self.uniform_data.resize(offset + self.uniform_stride, 0);

        self.draws.push(RecordedDraw {
            program,
            position,
            tex_coord: self.bound.tex_coord,
            texture: self.bound.texture,
            uniform_offset: offset as u32,
            vertex_count,
        });
    }

    fn finish_frame(&mut self) -> FrameStatus {
        self.ensure_uniform_capacity(self.draws.len());
        if let Some(ubo) = self.uniform_ubo.as_ref() {
            if !self.uniform_data.is_empty() {
                self.gpu.queue().write_buffer(ubo, 0, &self.uniform_data);
            }
        }

        let status = self.encode_frame();
        self.draws.clear();
        self.uniform_data.clear();
        status
    }
}

fn physical_viewport(size: PhysicalSize<u32>) -> Viewport {
    Viewport::new(size.width as f32, size.height as f32)
}

/// Returns an image the device can hold: empty images become one white
/// pixel and oversized ones are scaled down to fit `max` on both sides.
fn fit_texture(pixels: &RgbaImage, max: u32) -> Cow<'_, RgbaImage> {
    let (w, h) = pixels.dimensions();
    if w == 0 || h == 0 {
        return Cow::Owned(RgbaImage::from_pixel(1, 1, image::Rgba([255; 4])));
    }
    if w <= max && h <= max {
        return Cow::Borrowed(pixels);
    }

    let scale = max as f32 / w.max(h) as f32;
    let nw = ((w as f32 * scale) as u32).clamp(1, max);
    let nh = ((h as f32 * scale) as u32).clamp(1, max);
    Cow::Owned(image::imageops::resize(
        pixels,
        nw,
        nh,
        image::imageops::FilterType::Triangle,
    ))
}

fn upload_texture(
    gpu: &Gpu,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    label: &str,
    pixels: &RgbaImage,
) -> TextureEntry {
    let texture = gpu.device().create_texture_with_data(
        gpu.queue(),
        &wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: pixels.width(),
                height: pixels.height(),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        },
        wgpu::util::TextureDataOrder::LayerMajor,
        pixels.as_raw(),
    );

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let bind_group = gpu.device().create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    });

    TextureEntry {
        _texture: texture,
        bind_group,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_block_matches_wgsl_layout() {
        // 3 × mat3x3<f32> (48 bytes each) + vec4<f32>
        assert_eq!(std::mem::size_of::<DrawUniforms>(), 160);
    }

    #[test]
    fn default_uniforms_are_identity() {
        let u = DrawUniforms::default();
        assert_eq!(u.transform, Matrix3x3::IDENTITY.to_padded_columns());
        assert_eq!(u.color, [1.0; 4]);
    }

    #[test]
    fn small_images_upload_as_is() {
        let img = RgbaImage::new(4, 2);
        assert!(matches!(fit_texture(&img, 8192), Cow::Borrowed(_)));
    }

    #[test]
    fn oversized_images_keep_aspect() {
        let img = RgbaImage::new(400, 100);
        let fitted = fit_texture(&img, 200);
        assert_eq!(fitted.dimensions(), (200, 50));
    }

    #[test]
    fn empty_images_become_one_pixel() {
        let img = RgbaImage::new(0, 0);
        assert_eq!(fit_texture(&img, 8192).dimensions(), (1, 1));
    }
}
