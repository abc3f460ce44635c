use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::error::Diagnostic;
use crate::gfx::context::GraphicsContext;
use crate::gfx::resources::texture::CUBE_FACES;
use crate::gfx::resources::{SamplerState, Texture, TextureCube, TextureData};

const DEFAULT_TEXTURE: &str = "<default white>";
const CUBE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Cache of decoded images, 2D textures and cube maps.
///
/// Relative names resolve against the images directory unless they already
/// point at an existing file.
pub struct TextureManager {
    ctx: GraphicsContext,
    images_dir: PathBuf,
    data: HashMap<String, Rc<TextureData>>,
    textures: HashMap<String, Rc<Texture>>,
    cubes: HashMap<String, Rc<TextureCube>>,
    diagnostics: Vec<Diagnostic>,
}

impl TextureManager {
    pub fn new(ctx: &GraphicsContext, images_dir: impl Into<PathBuf>) -> Self {
        let images_dir = images_dir.into();
        log::debug!("texture manager rooted at {}", images_dir.display());
        Self {
            ctx: ctx.clone(),
            images_dir,
            data: HashMap::new(),
            textures: HashMap::new(),
            cubes: HashMap::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn images_dir(&self) -> &Path {
        &self.images_dir
    }

    pub fn resolve(&self, name: &str) -> PathBuf {
        let path = Path::new(name);
        if path.is_absolute() || path.exists() {
            path.to_path_buf()
        } else {
            self.images_dir.join(path)
        }
    }

    /// Decoded pixels for `name`. A failed decode caches an empty value.
    pub fn get_cached_texture_data(&mut self, name: &str) -> Rc<TextureData> {
        let path = self.resolve(name);
        self.decode(name, &path)
    }

    /// The texture for `name` with default sampling, loaded on first use.
    pub fn get_cached_texture(&mut self, name: &str) -> Rc<Texture> {
        if let Some(texture) = self.textures.get(name) {
            return Rc::clone(texture);
        }
        let path = self.resolve(name);
        self.load_texture(name, path, SamplerState::default())
    }

    /// Loads `path` under the logical `name`. A hit returns the cached
    /// texture and ignores `path` and `sampler`; pixels already cached under
    /// `name` are uploaded without reading `path`.
    pub fn load_texture(
        &mut self,
        name: &str,
        path: impl AsRef<Path>,
        sampler: SamplerState,
    ) -> Rc<Texture> {
        if let Some(texture) = self.textures.get(name) {
            return Rc::clone(texture);
        }

        let data = self.decode(name, path.as_ref());
        let texture = if data.is_valid() {
            match Texture::from_data(&self.ctx, name, &data, sampler) {
                Ok(texture) => texture,
                Err(err) => {
                    self.report(name, err.to_string());
                    Texture::invalid(name)
                }
            }
        } else {
            Texture::invalid(name)
        };
        let texture = Rc::new(texture);
        self.textures.insert(name.to_string(), Rc::clone(&texture));
        log::debug!("cached texture '{}' (valid: {})", name, texture.is_valid());
        texture
    }

    /// Cube map from `{images_dir}/{name}/{face}.png` (or `.jpg`) with faces
    /// named as in [`CUBE_FACES`].
    pub fn get_cached_texture_cube(&mut self, name: &str) -> Rc<TextureCube> {
        if let Some(cube) = self.cubes.get(name) {
            return Rc::clone(cube);
        }
        let dir = self.resolve(name);
        let paths = CUBE_FACES.map(|face| {
            CUBE_EXTENSIONS
                .iter()
                .map(|ext| dir.join(format!("{}.{}", face, ext)))
                .find(|path| path.exists())
                .unwrap_or_else(|| dir.join(format!("{}.png", face)))
        });
        self.load_texture_cube(name, paths)
    }

    /// Loads six face images in [`CUBE_FACES`] order under `name`.
    pub fn load_texture_cube<P: AsRef<Path>>(&mut self, name: &str, paths: [P; 6]) -> Rc<TextureCube> {
        if let Some(cube) = self.cubes.get(name) {
            return Rc::clone(cube);
        }

        let mut faces = Vec::with_capacity(6);
        for path in &paths {
            match TextureData::from_file(path.as_ref()) {
                Ok(data) => faces.push(data),
                Err(err) => {
                    self.report(name, err.to_string());
                    faces.push(TextureData::empty());
                }
            }
        }

        let cube = if faces.iter().all(TextureData::is_valid) {
            let refs = [&faces[0], &faces[1], &faces[2], &faces[3], &faces[4], &faces[5]];
            match TextureCube::from_faces(&self.ctx, name, refs, SamplerState::clamped()) {
                Ok(cube) => cube,
                Err(err) => {
                    self.report(name, err.to_string());
                    TextureCube::invalid(name)
                }
            }
        } else {
            TextureCube::invalid(name)
        };

        let cube = Rc::new(cube);
        self.cubes.insert(name.to_string(), Rc::clone(&cube));
        cube
    }

    /// Pixels for `name`, decoded from `path` only when nothing is cached
    /// under that name yet.
    fn decode(&mut self, name: &str, path: &Path) -> Rc<TextureData> {
        if let Some(data) = self.data.get(name) {
            return Rc::clone(data);
        }

        let data = match TextureData::from_file(path) {
            Ok(data) => data,
            Err(err) => {
                self.report(name, err.to_string());
                let mut empty = TextureData::empty();
                empty.path = Some(path.to_path_buf());
                empty
            }
        };
        let data = Rc::new(data);
        self.data.insert(name.to_string(), Rc::clone(&data));
        data
    }

    /// A 1x1 white texture, used where a material has no map.
    pub fn default_texture(&mut self) -> Rc<Texture> {
        if let Some(texture) = self.textures.get(DEFAULT_TEXTURE) {
            return Rc::clone(texture);
        }
        let texture = match Texture::solid_color(&self.ctx, DEFAULT_TEXTURE, [255; 4]) {
            Ok(texture) => texture,
            Err(err) => {
                self.report(DEFAULT_TEXTURE, err.to_string());
                Texture::invalid(DEFAULT_TEXTURE)
            }
        };
        let texture = Rc::new(texture);
        self.textures.insert(DEFAULT_TEXTURE.to_string(), Rc::clone(&texture));
        texture
    }

    pub fn contains(&self, name: &str) -> bool {
        self.textures.contains_key(name) || self.cubes.contains_key(name)
    }

    /// Number of cached textures and cube maps.
    pub fn len(&self) -> usize {
        self.textures.len() + self.cubes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops the manager's references. Textures still held elsewhere stay
    /// alive until their last owner lets go.
    pub fn clear(&mut self) {
        log::debug!(
            "clearing texture cache ({} textures, {} cube maps, {} images)",
            self.textures.len(),
            self.cubes.len(),
            self.data.len()
        );
        self.data.clear();
        self.textures.clear();
        self.cubes.clear();
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    fn report(&mut self, name: &str, message: String) {
        log::warn!("texture '{}': {}", name, message);
        self.diagnostics
            .push(Diagnostic::new(format!("texture:{}", name), message));
    }
}

impl std::fmt::Debug for TextureManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextureManager")
            .field("images_dir", &self.images_dir)
            .field("textures", &self.textures.len())
            .field("cubes", &self.cubes.len())
            .field("diagnostics", &self.diagnostics.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::assets::test_support::{scratch_dir, write_png};

    #[test]
    fn test_same_name_returns_same_instance() {
        let dir = scratch_dir("textures");
        write_png(&dir.join("brick.png"), 4, 4, [200, 80, 40, 255]);

        let ctx = GraphicsContext::headless();
        let mut manager = TextureManager::new(&ctx, &dir);
        let first = manager.get_cached_texture("brick.png");
        let second = manager.get_cached_texture("brick.png");
        assert!(first.is_valid());
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!((first.width(), first.height()), (4, 4));
        assert!(manager.diagnostics().is_empty());
    }

    #[test]
    fn test_missing_file_yields_invalid_texture_and_diagnostic() {
        let ctx = GraphicsContext::headless();
        let mut manager = TextureManager::new(&ctx, "/definitely/not/here");
        let texture = manager.get_cached_texture("missing.png");
        assert!(!texture.is_valid());
        assert_eq!(manager.diagnostics().len(), 1);
        assert_eq!(manager.diagnostics()[0].source, "texture:missing.png");

        // The failure is cached, not retried.
        let again = manager.get_cached_texture("missing.png");
        assert!(Rc::ptr_eq(&texture, &again));
        assert_eq!(manager.take_diagnostics().len(), 1);
        assert!(manager.diagnostics().is_empty());
    }

    #[test]
    fn test_texture_data_cache() {
        let dir = scratch_dir("texture-data");
        write_png(&dir.join("pixel.png"), 2, 1, [1, 2, 3, 4]);

        let ctx = GraphicsContext::headless();
        let mut manager = TextureManager::new(&ctx, &dir);
        let data = manager.get_cached_texture_data("pixel.png");
        assert!(data.is_valid());
        assert_eq!(&data.data[..4], &[1, 2, 3, 4]);
        assert!(Rc::ptr_eq(&data, &manager.get_cached_texture_data("pixel.png")));

        let missing = manager.get_cached_texture_data("nope.png");
        assert!(!missing.is_valid());
        assert_eq!(manager.diagnostics().len(), 1);
    }

    #[test]
    fn test_texture_reuses_cached_pixels() {
        let dir = scratch_dir("texture-reuse");
        let path = dir.join("reuse.png");
        write_png(&path, 3, 2, [10, 20, 30, 255]);

        let ctx = GraphicsContext::headless();
        let mut manager = TextureManager::new(&ctx, &dir);
        let data = manager.get_cached_texture_data("reuse.png");
        assert!(data.is_valid());

        // Only the cached pixels can satisfy the texture now.
        std::fs::remove_file(&path).unwrap();
        let texture = manager.get_cached_texture("reuse.png");
        assert!(texture.is_valid());
        assert_eq!((texture.width(), texture.height()), (3, 2));
        assert!(manager.diagnostics().is_empty());
        assert!(Rc::ptr_eq(&data, &manager.get_cached_texture_data("reuse.png")));
    }

    #[test]
    fn test_cube_map_from_face_directory() {
        let dir = scratch_dir("cube");
        for face in CUBE_FACES {
            write_png(&dir.join("sky").join(format!("{}.png", face)), 2, 2, [0, 0, 255, 255]);
        }

        let ctx = GraphicsContext::headless();
        let mut manager = TextureManager::new(&ctx, &dir);
        let cube = manager.get_cached_texture_cube("sky");
        assert!(cube.is_valid());
        assert_eq!(cube.width(), 2);
        assert!(Rc::ptr_eq(&cube, &manager.get_cached_texture_cube("sky")));
    }

    #[test]
    fn test_cube_map_with_mismatched_faces_is_invalid() {
        let dir = scratch_dir("cube-bad");
        let paths = CUBE_FACES.map(|face| dir.join(format!("{}.png", face)));
        for (i, path) in paths.iter().enumerate() {
            let size = if i == 3 { 4 } else { 2 };
            write_png(path, size, size, [255; 4]);
        }

        let ctx = GraphicsContext::headless();
        let mut manager = TextureManager::new(&ctx, &dir);
        let cube = manager.load_texture_cube("bad", paths);
        assert!(!cube.is_valid());
        assert_eq!(manager.diagnostics().len(), 1);
    }

    #[test]
    fn test_default_texture_is_shared() {
        let ctx = GraphicsContext::headless();
        let mut manager = TextureManager::new(&ctx, ".");
        let white = manager.default_texture();
        assert!(white.is_valid());
        assert!(Rc::ptr_eq(&white, &manager.default_texture()));
        manager.clear();
        assert!(manager.is_empty());
        assert!(white.is_valid());
    }
}
