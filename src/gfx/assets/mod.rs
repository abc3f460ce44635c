//! Resource managers
//!
//! Name-keyed caches with load-or-reuse semantics. Each manager is an
//! ordinary value owned by the application; nothing here is global, so
//! tests build independent managers over their own headless context.
//!
//! A failed load is cached as well: the manager hands back an invalid
//! resource, records a [`Diagnostic`](crate::error::Diagnostic), and does
//! not retry the decode on the next request for the same name.

pub mod shader_manager;
pub mod texture_manager;

pub use shader_manager::ShaderManager;
pub use texture_manager::TextureManager;

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::PathBuf;

    /// Fresh scratch directory under the system temp dir.
    pub fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "loco-{}-{}-{}",
            tag,
            std::process::id(),
            rand::random::<u32>()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    /// Writes a solid RGBA PNG of the given size.
    pub fn write_png(path: &std::path::Path, width: u32, height: u32, rgba: [u8; 4]) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        image::RgbaImage::from_pixel(width, height, image::Rgba(rgba))
            .save(path)
            .unwrap();
    }
}
