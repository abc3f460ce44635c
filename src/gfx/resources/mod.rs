//! GPU resource wrappers
//!
//! Each wrapper owns exactly one backend object and releases it on drop.
//! Wrappers are not `Clone`; share them through `Rc`.

pub mod buffer;
pub mod frame_buffer;
pub mod layout;
pub mod texture;
pub mod texture_data;
pub mod vertex_array;

pub use buffer::{IndexBuffer, VertexBuffer};
pub use frame_buffer::{FrameBuffer, FrameBufferConfig};
pub use layout::{BufferElement, ElementType, VertexBufferLayout};
pub use texture::{SamplerState, Texture, TextureCube, TextureFilter, TextureWrap};
pub use texture_data::{TextureData, TextureFormat};
pub use vertex_array::VertexArray;
