//! wgpu backend
//!
//! Translates the bind-style [`Backend`] calls into wgpu command recording.
//! Draws are queued per frame and recorded into one render pass per target;
//! the queue is flushed whenever the render target changes, before a buffer
//! is overwritten, before a buffer or texture is destroyed and at the end of
//! the frame. Each draw snapshots the
//! program's uniform block into its own buffer, so uniforms set between draws
//! behave as they would with immediate-mode state.

mod pipeline;
mod texture;

use std::cell::RefCell;
use std::collections::HashSet;

use cgmath::Matrix4;
use slotmap::{new_key_type, SlotMap};
use wgpu::util::DeviceExt;

use crate::error::{GfxError, Result};
use crate::gfx::resources::layout::VertexBufferLayout;
use crate::gfx::resources::texture::SamplerState;
use crate::gfx::shader::{ShaderSources, UniformLocation, UniformValue};

use super::{
    validate_draw, AttachedVertexBuffer, Backend, BackendKind, BindState, BindingSlot,
    BufferTarget, BufferUsage, ClearState, FrameStats, GpuHandle, TextureDescriptor, TextureKind,
    VertexArrayState,
};
use pipeline::{GpuProgram, PipelineCache, PipelineKey};
use texture::GpuTexture;

/// Maps OpenGL clip-space depth (-1..1) to wgpu's (0..1).
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

new_key_type! {
    struct ObjectKey;
}

struct GpuBuffer {
    buffer: wgpu::Buffer,
    target: BufferTarget,
    usage: BufferUsage,
    size: u64,
}

struct GpuFramebuffer {
    color: Option<GpuHandle>,
    depth: Option<GpuHandle>,
}

enum GpuObject {
    Buffer(GpuBuffer),
    VertexArray(VertexArrayState),
    Texture(GpuTexture),
    Program(GpuProgram),
    Framebuffer(GpuFramebuffer),
}

impl GpuObject {
    fn type_name(&self) -> &'static str {
        match self {
            GpuObject::Buffer(_) => "buffer",
            GpuObject::VertexArray(_) => "vertex array",
            GpuObject::Texture(_) => "texture",
            GpuObject::Program(_) => "program",
            GpuObject::Framebuffer(_) => "framebuffer",
        }
    }
}

type Objects = SlotMap<ObjectKey, GpuObject>;

fn lookup(objects: &Objects, handle: GpuHandle) -> Option<&GpuObject> {
    handle.to_key::<ObjectKey>().and_then(|key| objects.get(key))
}

fn lookup_mut(objects: &mut Objects, handle: GpuHandle) -> Option<&mut GpuObject> {
    handle.to_key::<ObjectKey>().and_then(|key| objects.get_mut(key))
}

fn buffer_of(objects: &Objects, handle: GpuHandle) -> Option<&GpuBuffer> {
    match lookup(objects, handle) {
        Some(GpuObject::Buffer(buffer)) => Some(buffer),
        _ => None,
    }
}

fn texture_of(objects: &Objects, handle: GpuHandle) -> Option<&GpuTexture> {
    match lookup(objects, handle) {
        Some(GpuObject::Texture(texture)) => Some(texture),
        _ => None,
    }
}

fn align4(size: u64) -> u64 {
    let align = wgpu::COPY_BUFFER_ALIGNMENT;
    size.div_ceil(align) * align
}

/// A draw with every resource it needs resolved and owned.
struct PendingDraw {
    pipeline: wgpu::RenderPipeline,
    uniforms: wgpu::BindGroup,
    textures: wgpu::BindGroup,
    vertex_buffers: Vec<wgpu::Buffer>,
    index_buffer: wgpu::Buffer,
    count: u32,
}

struct Frame {
    surface_texture: Option<wgpu::SurfaceTexture>,
    view: wgpu::TextureView,
    clear: ClearState,
    /// Targets already cleared this frame (NONE is the surface).
    cleared: HashSet<GpuHandle>,
    pending: Vec<PendingDraw>,
    pending_target: GpuHandle,
}

struct WgpuState {
    objects: Objects,
    bind: BindState,
    pipelines: PipelineCache,
    frame: Option<Frame>,
    stats: FrameStats,
    surface_depth: wgpu::TextureView,
    /// Color target standing in for the surface when there is no window.
    offscreen: Option<wgpu::TextureView>,
}

impl WgpuState {
    fn check_bindable(&self, handle: GpuHandle, expected: &'static str) -> bool {
        if handle.is_none() {
            return true;
        }
        match lookup(&self.objects, handle).map(GpuObject::type_name) {
            Some(found) if found == expected => true,
            Some(found) => {
                log::warn!("{} {} bound as {}; ignored", found, handle, expected);
                false
            }
            None => {
                log::warn!("stale {} handle {}; ignored", expected, handle);
                false
            }
        }
    }

    fn destroy(&mut self, handle: GpuHandle, expected: &'static str) -> Option<GpuObject> {
        let key = handle.to_key::<ObjectKey>()?;
        if self.objects.get(key).map(GpuObject::type_name) != Some(expected) {
            log::warn!("destroying unknown {} {}", expected, handle);
            return None;
        }
        self.bind.forget(handle);
        self.objects.remove(key)
    }
}

/// Backend rendering through wgpu onto a window surface or an offscreen
/// color target.
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface: Option<wgpu::Surface<'static>>,
    config: RefCell<wgpu::SurfaceConfiguration>,
    fallback_2d: GpuTexture,
    fallback_cube: GpuTexture,
    state: RefCell<WgpuState>,
}

impl WgpuBackend {
    /// Creates a backend presenting to the given window.
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
        vsync: bool,
    ) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window)
            .map_err(|err| GfxError::creation("surface", err.to_string()))?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .map_err(|err| GfxError::creation("adapter", err.to_string()))?;
        let (device, queue) = Self::request_device(&adapter).await?;

        let capabilities = surface.get_capabilities(&adapter);
        let format = capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| capabilities.formats.first().copied())
            .ok_or_else(|| GfxError::creation("surface", "adapter reports no surface formats"))?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: if vsync {
                wgpu::PresentMode::AutoVsync
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            alpha_mode: capabilities
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        log::info!(
            "wgpu backend on {} ({:?}, {:?})",
            adapter.get_info().name,
            adapter.get_info().backend,
            format
        );

        Self::assemble(device, queue, Some(surface), config)
    }

    /// Creates a backend rendering into an offscreen texture.
    pub async fn offscreen(width: u32, height: u32) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|err| GfxError::creation("adapter", err.to_string()))?;
        let (device, queue) = Self::request_device(&adapter).await?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: wgpu::TextureFormat::Rgba8Unorm,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: wgpu::CompositeAlphaMode::Auto,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        Self::assemble(device, queue, None, config)
    }

    async fn request_device(adapter: &wgpu::Adapter) -> Result<(wgpu::Device, wgpu::Queue)> {
        // Border clamping is optional; samplers fall back to edge clamping.
        let required_features =
            adapter.features() & wgpu::Features::ADDRESS_MODE_CLAMP_TO_BORDER;

        adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("loco device"),
                required_features,
                required_limits: wgpu::Limits {
                    max_texture_dimension_2d: 4096,
                    ..wgpu::Limits::downlevel_defaults()
                },
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(|err| GfxError::creation("device", err.to_string()))
    }

    fn assemble(
        device: wgpu::Device,
        queue: wgpu::Queue,
        surface: Option<wgpu::Surface<'static>>,
        config: wgpu::SurfaceConfiguration,
    ) -> Result<Self> {
        let fallback_2d = GpuTexture::fallback(&device, &queue, TextureKind::Texture2D)
            .map_err(|reason| GfxError::creation("texture", reason))?;
        let fallback_cube = GpuTexture::fallback(&device, &queue, TextureKind::Cube)
            .map_err(|reason| GfxError::creation("texture", reason))?;
        let surface_depth = GpuTexture::create_depth(&device, config.width, config.height);
        let offscreen = surface
            .is_none()
            .then(|| Self::create_offscreen(&device, &config));

        Ok(Self {
            device,
            queue,
            surface,
            config: RefCell::new(config),
            fallback_2d,
            fallback_cube,
            state: RefCell::new(WgpuState {
                objects: SlotMap::with_key(),
                bind: BindState::default(),
                pipelines: PipelineCache::default(),
                frame: None,
                stats: FrameStats::default(),
                surface_depth,
                offscreen,
            }),
        })
    }

    fn create_offscreen(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
    ) -> wgpu::TextureView {
        device
            .create_texture(&wgpu::TextureDescriptor {
                label: Some("offscreen color"),
                size: wgpu::Extent3d {
                    width: config.width,
                    height: config.height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: config.format,
                usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
                view_formats: &[],
            })
            .create_view(&wgpu::TextureViewDescriptor::default())
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.borrow().format
    }

    /// Number of render pipelines built so far.
    pub fn pipeline_count(&self) -> usize {
        self.state.borrow().pipelines.len()
    }

    fn acquire(&self, surface: &wgpu::Surface<'static>) -> Result<wgpu::SurfaceTexture> {
        match surface.get_current_texture() {
            Ok(frame) => Ok(frame),
            Err(wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Lost) => {
                log::debug!("surface outdated; reconfiguring");
                surface.configure(&self.device, &self.config.borrow());
                surface
                    .get_current_texture()
                    .map_err(|err| GfxError::surface(err.to_string()))
            }
            Err(err) => Err(GfxError::surface(err.to_string())),
        }
    }

    /// Color and depth formats of the given target (NONE is the surface).
    fn target_formats(
        &self,
        state: &WgpuState,
        target: GpuHandle,
    ) -> Result<(Option<wgpu::TextureFormat>, Option<wgpu::TextureFormat>)> {
        if target.is_none() {
            return Ok((
                Some(self.config.borrow().format),
                Some(GpuTexture::DEPTH_FORMAT),
            ));
        }
        match lookup(&state.objects, target) {
            Some(GpuObject::Framebuffer(fb)) => {
                let format = |handle: Option<GpuHandle>| {
                    handle
                        .and_then(|h| texture_of(&state.objects, h))
                        .map(|t| t.format)
                };
                Ok((format(fb.color), format(fb.depth)))
            }
            _ => Err(GfxError::draw(format!("framebuffer {} no longer exists", target))),
        }
    }

    /// Submits the frame's queued draws, if any.
    fn flush_pending(&self, state: &mut WgpuState) {
        if state.frame.as_ref().is_some_and(|f| !f.pending.is_empty()) {
            if let Err(err) = self.flush(state) {
                log::warn!("{}", err);
            }
        }
    }

    /// Records queued draws (or a pending clear) into a render pass.
    fn flush(&self, state: &mut WgpuState) -> Result<()> {
        let Some(frame) = state.frame.as_mut() else {
            return Ok(());
        };
        let target = frame.pending_target;
        let needs_clear = !frame.cleared.contains(&target);
        if frame.pending.is_empty() && !needs_clear {
            return Ok(());
        }
        let draws = std::mem::take(&mut frame.pending);
        frame.cleared.insert(target);
        let clear = frame.clear;

        let (color_view, depth_view) = if target.is_none() {
            (Some(frame.view.clone()), Some(state.surface_depth.clone()))
        } else {
            match lookup(&state.objects, target) {
                Some(GpuObject::Framebuffer(fb)) => {
                    let view = |handle: Option<GpuHandle>| {
                        handle
                            .and_then(|h| texture_of(&state.objects, h))
                            .map(|t| t.view.clone())
                    };
                    (view(fb.color), view(fb.depth))
                }
                _ => {
                    log::warn!("dropping {} draws for destroyed framebuffer {}", draws.len(), target);
                    return Ok(());
                }
            }
        };

        let color_load = if needs_clear {
            wgpu::LoadOp::Clear(wgpu::Color {
                r: clear.color[0] as f64,
                g: clear.color[1] as f64,
                b: clear.color[2] as f64,
                a: clear.color[3] as f64,
            })
        } else {
            wgpu::LoadOp::Load
        };
        let depth_load = if needs_clear {
            wgpu::LoadOp::Clear(clear.depth)
        } else {
            wgpu::LoadOp::Load
        };

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("loco frame encoder"),
            });
        {
            let color_attachments = [color_view.as_ref().map(|view| {
                wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: color_load,
                        store: wgpu::StoreOp::Store,
                    },
                }
            })];
            let depth_stencil_attachment =
                depth_view
                    .as_ref()
                    .map(|view| wgpu::RenderPassDepthStencilAttachment {
                        view,
                        depth_ops: Some(wgpu::Operations {
                            load: depth_load,
                            store: wgpu::StoreOp::Store,
                        }),
                        stencil_ops: None,
                    });

            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("loco render pass"),
                color_attachments: &color_attachments,
                depth_stencil_attachment,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            for draw in &draws {
                render_pass.set_pipeline(&draw.pipeline);
                render_pass.set_bind_group(0, &draw.uniforms, &[]);
                render_pass.set_bind_group(1, &draw.textures, &[]);
                for (slot, buffer) in draw.vertex_buffers.iter().enumerate() {
                    render_pass.set_vertex_buffer(slot as u32, buffer.slice(..));
                }
                render_pass.set_index_buffer(draw.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                render_pass.draw_indexed(0..draw.count, 0, 0..1);
            }
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        Ok(())
    }

    /// Resolves the current bind state into an owned draw.
    fn prepare_draw(&self, state: &mut WgpuState, count: u32) -> Result<PendingDraw> {
        let program_handle = state.bind.program;
        let program = match lookup(&state.objects, program_handle) {
            Some(GpuObject::Program(program)) => Some(program),
            _ => None,
        };
        let vertex_array = match lookup(&state.objects, state.bind.vertex_array) {
            Some(GpuObject::VertexArray(va)) => Some(va),
            _ => None,
        };
        validate_draw(
            state.frame.is_some(),
            program.map(|p| &p.layout),
            vertex_array,
            count,
        )?;
        let (Some(program), Some(vertex_array)) = (program, vertex_array) else {
            return Err(GfxError::draw("incomplete bind state"));
        };

        let (color, depth) = self.target_formats(state, state.bind.framebuffer)?;
        let key = PipelineKey {
            program: program_handle,
            buffers: vertex_array
                .vertex_buffers
                .iter()
                .map(|attached| (attached.base_slot, attached.layout.clone()))
                .collect(),
            color,
            depth,
        };
        let pipeline = state
            .pipelines
            .get_or_create(&self.device, &key, program)
            .map_err(GfxError::draw)?;

        let uniform_buffer = (!program.block.is_empty()).then(|| {
            self.device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("uniform snapshot"),
                    contents: &program.block,
                    usage: wgpu::BufferUsages::UNIFORM,
                })
        });
        let uniform_entries: Vec<wgpu::BindGroupEntry> = uniform_buffer
            .iter()
            .map(|buffer| wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            })
            .collect();
        let uniforms = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("uniforms"),
            layout: &program.uniform_layout,
            entries: &uniform_entries,
        });

        let mut texture_entries = Vec::with_capacity(program.layout.textures.len() * 2);
        for slot in &program.layout.textures {
            let bound = state
                .bind
                .textures
                .get(&slot.unit)
                .filter(|(kind, _)| *kind == slot.kind)
                .and_then(|(_, handle)| texture_of(&state.objects, *handle))
                .filter(|texture| texture.is_filterable());
            let texture = bound.unwrap_or(match slot.kind {
                TextureKind::Texture2D => &self.fallback_2d,
                TextureKind::Cube => &self.fallback_cube,
            });
            texture_entries.push(wgpu::BindGroupEntry {
                binding: slot.binding,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            });
            texture_entries.push(wgpu::BindGroupEntry {
                binding: slot.binding + 1,
                resource: wgpu::BindingResource::Sampler(&texture.sampler),
            });
        }
        let textures = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("textures"),
            layout: &program.texture_layout,
            entries: &texture_entries,
        });

        let mut vertex_buffers = Vec::with_capacity(vertex_array.vertex_buffers.len());
        for attached in &vertex_array.vertex_buffers {
            let buffer = buffer_of(&state.objects, attached.buffer)
                .ok_or_else(|| GfxError::draw(format!("vertex buffer {} was destroyed", attached.buffer)))?;
            vertex_buffers.push(buffer.buffer.clone());
        }
        let index_buffer = vertex_array
            .index_buffer
            .and_then(|(handle, _)| buffer_of(&state.objects, handle))
            .map(|buffer| buffer.buffer.clone())
            .ok_or_else(|| GfxError::draw("index buffer was destroyed"))?;

        Ok(PendingDraw {
            pipeline,
            uniforms,
            textures,
            vertex_buffers,
            index_buffer,
            count,
        })
    }
}

impl Backend for WgpuBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Wgpu
    }

    fn clip_correction(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX
    }

    fn create_buffer(
        &self,
        target: BufferTarget,
        usage: BufferUsage,
        size: u64,
        data: Option<&[u8]>,
    ) -> Result<GpuHandle> {
        if let Some(data) = data {
            if data.len() as u64 > size {
                return Err(GfxError::creation(
                    "buffer",
                    format!("{} bytes of data for a {} byte buffer", data.len(), size),
                ));
            }
        }

        let gpu_usage = match target {
            BufferTarget::Vertex => wgpu::BufferUsages::VERTEX,
            BufferTarget::Index => wgpu::BufferUsages::INDEX,
        } | wgpu::BufferUsages::COPY_DST
            | wgpu::BufferUsages::COPY_SRC;

        let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(match target {
                BufferTarget::Vertex => "vertex buffer",
                BufferTarget::Index => "index buffer",
            }),
            size: align4(size.max(1)),
            usage: gpu_usage,
            mapped_at_creation: false,
        });
        if let Some(data) = data.filter(|d| !d.is_empty()) {
            let mut padded = data.to_vec();
            padded.resize(align4(data.len() as u64) as usize, 0);
            self.queue.write_buffer(&buffer, 0, &padded);
        }

        let mut state = self.state.borrow_mut();
        let key = state.objects.insert(GpuObject::Buffer(GpuBuffer {
            buffer,
            target,
            usage,
            size,
        }));
        Ok(GpuHandle::from_key(key))
    }

    fn update_buffer(&self, buffer: GpuHandle, offset: u64, data: &[u8]) {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        let Some(gpu) = buffer_of(&state.objects, buffer) else {
            log::warn!("update of stale buffer {}; ignored", buffer);
            return;
        };
        if gpu.usage != BufferUsage::Dynamic {
            log::warn!("update of static buffer {}; ignored", buffer);
            return;
        }
        if offset % wgpu::COPY_BUFFER_ALIGNMENT != 0
            || data.len() as u64 % wgpu::COPY_BUFFER_ALIGNMENT != 0
        {
            log::warn!(
                "buffer update at {} of {} bytes is not 4-byte aligned; ignored",
                offset,
                data.len()
            );
            return;
        }
        let target = gpu.buffer.clone();

        // Queued draws must observe the old contents.
        self.flush_pending(state);
        self.queue.write_buffer(&target, offset, data);
        state.stats.buffer_updates += 1;
    }

    fn read_buffer(&self, buffer: GpuHandle) -> Option<Vec<u8>> {
        let (source, size) = {
            let state = self.state.borrow();
            let gpu = buffer_of(&state.objects, buffer)?;
            (gpu.buffer.clone(), gpu.size)
        };
        let padded = align4(size.max(1));

        let staging_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("staging_buffer"),
            size: padded,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("copy_encoder"),
            });
        encoder.copy_buffer_to_buffer(&source, 0, &staging_buffer, 0, padded);
        self.queue.submit(std::iter::once(encoder.finish()));

        let slice = staging_buffer.slice(..);
        let (tx, rx) = futures::channel::oneshot::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });

        let _ = self.device.poll(wgpu::MaintainBase::Wait);

        match futures::executor::block_on(rx) {
            Ok(Ok(())) => {
                let mapped = slice.get_mapped_range();
                let mut bytes = mapped.to_vec();
                drop(mapped);
                staging_buffer.unmap();
                bytes.truncate(size as usize);
                Some(bytes)
            }
            _ => {
                log::warn!("failed to read back buffer {}", buffer);
                None
            }
        }
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: GpuHandle) {
        let mut state = self.state.borrow_mut();
        if !state.check_bindable(buffer, "buffer") {
            return;
        }
        if let Some(gpu) = buffer_of(&state.objects, buffer) {
            if gpu.target != target {
                log::warn!("{:?} buffer {} bound as {:?}; ignored", gpu.target, buffer, target);
                return;
            }
        }
        state.bind.buffers.insert(target, buffer);
    }

    fn destroy_buffer(&self, buffer: GpuHandle) {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        // Queued draws may still read from it.
        self.flush_pending(state);
        if let Some(GpuObject::Buffer(gpu)) = state.destroy(buffer, "buffer") {
            gpu.buffer.destroy();
        }
    }

    fn create_vertex_array(&self) -> Result<GpuHandle> {
        let mut state = self.state.borrow_mut();
        let key = state
            .objects
            .insert(GpuObject::VertexArray(VertexArrayState::default()));
        Ok(GpuHandle::from_key(key))
    }

    fn attach_vertex_buffer(
        &self,
        vertex_array: GpuHandle,
        buffer: GpuHandle,
        base_slot: u32,
        layout: &VertexBufferLayout,
    ) {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        if buffer_of(&state.objects, buffer).is_none() {
            log::warn!("attaching stale buffer {}; ignored", buffer);
            return;
        }
        match lookup_mut(&mut state.objects, vertex_array) {
            Some(GpuObject::VertexArray(va)) => va.vertex_buffers.push(AttachedVertexBuffer {
                buffer,
                base_slot,
                layout: layout.clone(),
            }),
            _ => log::warn!("attaching to stale vertex array {}; ignored", vertex_array),
        }
    }

    fn attach_index_buffer(&self, vertex_array: GpuHandle, buffer: GpuHandle, count: u32) {
        let mut state = self.state.borrow_mut();
        match lookup_mut(&mut state.objects, vertex_array) {
            Some(GpuObject::VertexArray(va)) => va.index_buffer = Some((buffer, count)),
            _ => log::warn!("attaching to stale vertex array {}; ignored", vertex_array),
        }
    }

    fn bind_vertex_array(&self, vertex_array: GpuHandle) {
        let mut state = self.state.borrow_mut();
        if state.check_bindable(vertex_array, "vertex array") {
            state.bind.vertex_array = vertex_array;
        }
    }

    fn destroy_vertex_array(&self, vertex_array: GpuHandle) {
        self.state
            .borrow_mut()
            .destroy(vertex_array, "vertex array");
    }

    fn create_texture(
        &self,
        desc: &TextureDescriptor,
        layers: &[&[u8]],
        sampler: &SamplerState,
    ) -> Result<GpuHandle> {
        if desc.width == 0 || desc.height == 0 {
            return Err(GfxError::creation(
                "texture",
                format!("invalid size {}x{}", desc.width, desc.height),
            ));
        }
        if !layers.is_empty() && layers.len() != desc.kind.layer_count() {
            return Err(GfxError::creation(
                "texture",
                format!("{:?} needs {} layers", desc.kind, desc.kind.layer_count()),
            ));
        }
        let texture = GpuTexture::create(&self.device, &self.queue, "texture", desc, layers, sampler)
            .map_err(|reason| GfxError::creation("texture", reason))?;

        let mut state = self.state.borrow_mut();
        let key = state.objects.insert(GpuObject::Texture(texture));
        Ok(GpuHandle::from_key(key))
    }

    fn set_sampler(&self, texture: GpuHandle, sampler: &SamplerState) {
        let mut state = self.state.borrow_mut();
        match lookup_mut(&mut state.objects, texture) {
            Some(GpuObject::Texture(gpu)) => {
                gpu.sampler = GpuTexture::create_sampler(&self.device, "texture", sampler);
            }
            _ => log::warn!("sampler change on stale texture {}; ignored", texture),
        }
    }

    fn bind_texture(&self, unit: u32, kind: TextureKind, texture: GpuHandle) {
        let mut state = self.state.borrow_mut();
        if !state.check_bindable(texture, "texture") {
            return;
        }
        if let Some(gpu) = texture_of(&state.objects, texture) {
            if gpu.desc.kind != kind {
                log::warn!("{:?} texture {} bound as {:?}; ignored", gpu.desc.kind, texture, kind);
                return;
            }
        }
        state.bind.bind_texture(unit, kind, texture);
        if !texture.is_none() {
            state.stats.texture_binds += 1;
        }
    }

    fn destroy_texture(&self, texture: GpuHandle) {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        self.flush_pending(state);
        if let Some(GpuObject::Texture(gpu)) = state.destroy(texture, "texture") {
            gpu.texture.destroy();
        }
    }

    fn create_program(
        &self,
        label: &str,
        sources: &ShaderSources,
    ) -> std::result::Result<GpuHandle, String> {
        let program = GpuProgram::create(&self.device, label, sources)?;
        let mut state = self.state.borrow_mut();
        let key = state.objects.insert(GpuObject::Program(program));
        Ok(GpuHandle::from_key(key))
    }

    fn uniform_location(&self, program: GpuHandle, name: &str) -> Option<UniformLocation> {
        match lookup(&self.state.borrow().objects, program) {
            Some(GpuObject::Program(gpu)) => gpu.layout.find(name),
            _ => None,
        }
    }

    fn set_uniform(&self, program: GpuHandle, location: UniformLocation, value: UniformValue) {
        let mut state = self.state.borrow_mut();
        match lookup_mut(&mut state.objects, program) {
            Some(GpuObject::Program(gpu)) => {
                if !gpu.layout.apply(&mut gpu.block, location, value) {
                    log::warn!(
                        "{:?} does not match uniform {:?} of program '{}'; ignored",
                        value,
                        location,
                        gpu.label
                    );
                }
            }
            _ => log::warn!("uniform write to stale program {}; ignored", program),
        }
    }

    fn bind_program(&self, program: GpuHandle) {
        let mut state = self.state.borrow_mut();
        if state.check_bindable(program, "program") {
            state.bind.program = program;
            if !program.is_none() {
                state.stats.program_binds += 1;
            }
        }
    }

    fn destroy_program(&self, program: GpuHandle) {
        let mut state = self.state.borrow_mut();
        if state.destroy(program, "program").is_some() {
            state.pipelines.evict_program(program);
        }
    }

    fn create_framebuffer(
        &self,
        color: Option<GpuHandle>,
        depth: Option<GpuHandle>,
    ) -> Result<GpuHandle> {
        let mut state = self.state.borrow_mut();
        for attachment in color.iter().chain(depth.iter()) {
            match texture_of(&state.objects, *attachment) {
                Some(texture) if texture.desc.render_target => {}
                _ => {
                    return Err(GfxError::creation(
                        "framebuffer",
                        format!("attachment {} is not a render-target texture", attachment),
                    ))
                }
            }
        }
        let key = state
            .objects
            .insert(GpuObject::Framebuffer(GpuFramebuffer { color, depth }));
        Ok(GpuHandle::from_key(key))
    }

    fn bind_framebuffer(&self, framebuffer: GpuHandle) {
        let mut state = self.state.borrow_mut();
        if state.check_bindable(framebuffer, "framebuffer") {
            state.bind.framebuffer = framebuffer;
        }
    }

    fn destroy_framebuffer(&self, framebuffer: GpuHandle) {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        if state
            .frame
            .as_ref()
            .is_some_and(|f| f.pending_target == framebuffer && !f.pending.is_empty())
        {
            if let Err(err) = self.flush(state) {
                log::warn!("{}", err);
            }
        }
        state.destroy(framebuffer, "framebuffer");
    }

    fn begin_frame(&self, clear: ClearState) -> Result<()> {
        let (surface_texture, view) = match &self.surface {
            Some(surface) => {
                let frame = self.acquire(surface)?;
                let view = frame
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());
                (Some(frame), view)
            }
            None => {
                let state = self.state.borrow();
                let view = state
                    .offscreen
                    .clone()
                    .ok_or_else(|| GfxError::surface("no render target available"))?;
                (None, view)
            }
        };

        let mut state = self.state.borrow_mut();
        state.stats = FrameStats::default();
        state.frame = Some(Frame {
            surface_texture,
            view,
            clear,
            cleared: HashSet::new(),
            pending: Vec::new(),
            pending_target: GpuHandle::NONE,
        });
        Ok(())
    }

    fn end_frame(&self) -> Result<()> {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        let flushed = self.flush(state);

        // A frame with no draws to the surface still clears it.
        if let Some(frame) = state.frame.as_mut() {
            frame.pending_target = GpuHandle::NONE;
        }
        let cleared = self.flush(state);

        if let Some(frame) = state.frame.take() {
            if let Some(surface_texture) = frame.surface_texture {
                surface_texture.present();
            }
        }
        flushed.and(cleared)
    }

    fn resize(&self, width: u32, height: u32) {
        let (width, height) = (width.max(1), height.max(1));
        {
            let mut config = self.config.borrow_mut();
            if (config.width, config.height) == (width, height) {
                return;
            }
            config.width = width;
            config.height = height;
            if let Some(surface) = &self.surface {
                surface.configure(&self.device, &config);
            }
        }

        let config = self.config.borrow();
        let mut state = self.state.borrow_mut();
        state.surface_depth = GpuTexture::create_depth(&self.device, width, height);
        if state.offscreen.is_some() {
            state.offscreen = Some(Self::create_offscreen(&self.device, &config));
        }
        log::debug!("surface resized to {}x{}", width, height);
    }

    fn draw_indexed(&self, count: u32) -> Result<()> {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        let draw = self.prepare_draw(state, count)?;

        let target = state.bind.framebuffer;
        let must_flush = state
            .frame
            .as_ref()
            .is_some_and(|f| f.pending_target != target && !f.pending.is_empty());
        if must_flush {
            self.flush(state)?;
        }

        if let Some(frame) = state.frame.as_mut() {
            frame.pending_target = target;
            frame.pending.push(draw);
        }
        state.stats.draw_calls += 1;
        state.stats.indices += count as u64;
        Ok(())
    }

    fn current_binding(&self, slot: BindingSlot) -> GpuHandle {
        self.state.borrow().bind.get(slot)
    }

    fn stats(&self) -> FrameStats {
        self.state.borrow().stats
    }
}
