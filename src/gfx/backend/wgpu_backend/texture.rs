//! wgpu texture, view and sampler creation

use crate::gfx::backend::{TextureDescriptor, TextureKind};
use crate::gfx::resources::texture::{SamplerState, TextureFilter, TextureWrap};
use crate::gfx::resources::texture_data::{expand_rgb, TextureFormat};

/// GPU texture with its default view and sampler.
pub(super) struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
    pub format: wgpu::TextureFormat,
    pub desc: TextureDescriptor,
}

impl GpuTexture {
    /// Depth format used for the surface and for framebuffer depth attachments.
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    pub fn gpu_format(format: TextureFormat) -> wgpu::TextureFormat {
        match format {
            // RGB has no 24-bit wgpu format; pixels are expanded on upload.
            TextureFormat::Rgb | TextureFormat::Rgba => wgpu::TextureFormat::Rgba8Unorm,
            TextureFormat::Depth => Self::DEPTH_FORMAT,
            TextureFormat::Stencil => wgpu::TextureFormat::Stencil8,
            TextureFormat::Depth24Stencil8 => wgpu::TextureFormat::Depth24PlusStencil8,
        }
    }

    pub fn create(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        label: &str,
        desc: &TextureDescriptor,
        layers: &[&[u8]],
        sampler: &SamplerState,
    ) -> Result<Self, String> {
        let format = Self::gpu_format(desc.format);
        if !layers.is_empty() && !desc.format.is_color() {
            return Err(format!("cannot upload pixel data to a {} texture", desc.format));
        }

        let size = wgpu::Extent3d {
            width: desc.width,
            height: desc.height,
            depth_or_array_layers: desc.kind.layer_count() as u32,
        };

        let mut usage = wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST;
        if desc.render_target {
            usage |= wgpu::TextureUsages::RENDER_ATTACHMENT;
        }

        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        });

        for (layer, pixels) in layers.iter().enumerate() {
            let rgba = match desc.format {
                TextureFormat::Rgb => expand_rgb(pixels),
                _ => pixels.to_vec(),
            };
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d {
                        x: 0,
                        y: 0,
                        z: layer as u32,
                    },
                    aspect: wgpu::TextureAspect::All,
                },
                &rgba,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * desc.width),
                    rows_per_image: Some(desc.height),
                },
                wgpu::Extent3d {
                    width: desc.width,
                    height: desc.height,
                    depth_or_array_layers: 1,
                },
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(label),
            dimension: Some(match desc.kind {
                TextureKind::Texture2D => wgpu::TextureViewDimension::D2,
                TextureKind::Cube => wgpu::TextureViewDimension::Cube,
            }),
            ..Default::default()
        });
        let sampler = Self::create_sampler(device, label, sampler);

        Ok(Self {
            texture,
            view,
            sampler,
            format,
            desc: *desc,
        })
    }

    /// 1x1 opaque white texture bound to units the program samples but
    /// nothing is bound to.
    pub fn fallback(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        kind: TextureKind,
    ) -> Result<Self, String> {
        let desc = TextureDescriptor {
            kind,
            width: 1,
            height: 1,
            format: TextureFormat::Rgba,
            render_target: false,
        };
        let white = [255u8; 4];
        let layers: Vec<&[u8]> = (0..kind.layer_count()).map(|_| &white[..]).collect();
        Self::create(device, queue, "fallback", &desc, &layers, &SamplerState::default())
    }

    /// Depth attachment used when rendering to the window surface.
    pub fn create_depth(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("surface depth"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        texture.create_view(&wgpu::TextureViewDescriptor::default())
    }

    pub fn create_sampler(device: &wgpu::Device, label: &str, state: &SamplerState) -> wgpu::Sampler {
        let border_supported = device
            .features()
            .contains(wgpu::Features::ADDRESS_MODE_CLAMP_TO_BORDER);
        let address = |wrap: TextureWrap| match wrap {
            TextureWrap::Repeat => wgpu::AddressMode::Repeat,
            TextureWrap::RepeatMirror => wgpu::AddressMode::MirrorRepeat,
            TextureWrap::ClampToEdge => wgpu::AddressMode::ClampToEdge,
            TextureWrap::ClampToBorder if border_supported => wgpu::AddressMode::ClampToBorder,
            TextureWrap::ClampToBorder => wgpu::AddressMode::ClampToEdge,
        };
        let filter = |filter: TextureFilter| match filter {
            TextureFilter::Nearest => wgpu::FilterMode::Nearest,
            TextureFilter::Linear => wgpu::FilterMode::Linear,
        };

        let uses_border = [state.wrap_u, state.wrap_v, state.wrap_w]
            .contains(&TextureWrap::ClampToBorder);
        let border_color = (uses_border && border_supported).then(|| border_color(state.border_color));

        device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&format!("{} sampler", label)),
            address_mode_u: address(state.wrap_u),
            address_mode_v: address(state.wrap_v),
            address_mode_w: address(state.wrap_w),
            mag_filter: filter(state.mag_filter),
            min_filter: filter(state.min_filter),
            mipmap_filter: wgpu::FilterMode::Nearest,
            border_color,
            ..Default::default()
        })
    }

    /// Whether the texture can be sampled through a filtering sampler.
    pub fn is_filterable(&self) -> bool {
        self.desc.format.is_color()
    }
}

/// wgpu only offers a few fixed border colours; pick the closest.
fn border_color(rgba: [f32; 4]) -> wgpu::SamplerBorderColor {
    let luminance = 0.2126 * rgba[0] + 0.7152 * rgba[1] + 0.0722 * rgba[2];
    if rgba[3] < 0.5 {
        wgpu::SamplerBorderColor::TransparentBlack
    } else if luminance >= 0.5 {
        wgpu::SamplerBorderColor::OpaqueWhite
    } else {
        wgpu::SamplerBorderColor::OpaqueBlack
    }
}
