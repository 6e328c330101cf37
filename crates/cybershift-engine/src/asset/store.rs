use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Decoded RGBA8 image, tightly packed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl ImageData {
    pub fn decode(bytes: &[u8]) -> Result<Self, image::ImageError> {
        let rgba = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(Self { width, height, rgba: rgba.into_raw() })
    }

    pub fn aspect(&self) -> f32 {
        if self.height == 0 { 1.0 } else { self.width as f32 / self.height as f32 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetError {
    NotFound(PathBuf),
    Io { path: PathBuf, message: String },
    Decode { path: PathBuf, message: String },
}

impl fmt::Display for AssetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetError::NotFound(path) => write!(f, "asset not found: {}", path.display()),
            AssetError::Io { path, message } => write!(f, "failed to read {}: {message}", path.display()),
            AssetError::Decode { path, message } => write!(f, "failed to decode {}: {message}", path.display()),
        }
    }
}

impl std::error::Error for AssetError {}

/// Loads images by site URL (`/textures/lookbook/x.png`) relative to an asset root.
///
/// Each URL is read at most once; failures are cached and logged once.
#[derive(Debug)]
pub struct AssetStore {
    root: PathBuf,
    cache: HashMap<String, Result<Rc<ImageData>, AssetError>>,
}

impl AssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), cache: HashMap::new() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem path for a site URL. Leading slashes and `..` segments are dropped.
    pub fn resolve(&self, url: &str) -> PathBuf {
        url.split('/')
            .filter(|seg| !seg.is_empty() && *seg != "." && *seg != "..")
            .fold(self.root.clone(), |path, seg| path.join(seg))
    }

    pub fn load(&mut self, url: &str) -> Result<Rc<ImageData>, AssetError> {
        if let Some(cached) = self.cache.get(url) {
            return cached.clone();
        }

        let result = read_image(&self.resolve(url)).map(Rc::new);
        match &result {
            Ok(img) => log::debug!("asset {url} loaded ({}x{})", img.width, img.height),
            Err(e) => log::warn!("{e}; using placeholder"),
        }
        self.cache.insert(url.to_string(), result.clone());
        result
    }

    /// The image, or `None` when the caller should draw a placeholder.
    pub fn image(&mut self, url: &str) -> Option<Rc<ImageData>> {
        self.load(url).ok()
    }
}

fn read_image(path: &Path) -> Result<ImageData, AssetError> {
    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => AssetError::NotFound(path.to_path_buf()),
        _ => AssetError::Io { path: path.to_path_buf(), message: e.to_string() },
    })?;
    ImageData::decode(&bytes).map_err(|e| AssetError::Decode { path: path.to_path_buf(), message: e.to_string() })
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("cybershift-assets-{name}-{}", std::process::id()));
        std::fs::create_dir_all(dir.join("textures")).unwrap();
        dir
    }

    fn png_bytes() -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(3, 2, image::Rgba([255, 0, 0, 255]));
        let mut out = Vec::new();
        img.write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png).unwrap();
        out
    }

    #[test]
    fn resolve_strips_leading_slash_and_parent_segments() {
        let store = AssetStore::new("/srv/site");
        assert_eq!(store.resolve("/textures/lookbook/a.png"), PathBuf::from("/srv/site/textures/lookbook/a.png"));
        assert_eq!(store.resolve("../../etc/passwd"), PathBuf::from("/srv/site/etc/passwd"));
    }

    #[test]
    fn missing_asset_falls_back_to_placeholder() {
        let dir = scratch_dir("missing");
        let mut store = AssetStore::new(&dir);
        assert!(matches!(store.load("/textures/nope.png"), Err(AssetError::NotFound(_))));
        assert!(store.image("/textures/nope.png").is_none());
    }

    #[test]
    fn decodes_png_and_caches() {
        let dir = scratch_dir("decode");
        std::fs::write(dir.join("textures/red.png"), png_bytes()).unwrap();
        let mut store = AssetStore::new(&dir);

        let a = store.load("/textures/red.png").unwrap();
        assert_eq!((a.width, a.height), (3, 2));
        assert_eq!(&a.rgba[..4], &[255, 0, 0, 255]);

        let b = store.load("/textures/red.png").unwrap();
        assert!(Rc::ptr_eq(&a, &b));
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let dir = scratch_dir("garbage");
        std::fs::write(dir.join("textures/bad.png"), b"not an image").unwrap();
        let mut store = AssetStore::new(&dir);
        assert!(matches!(store.load("/textures/bad.png"), Err(AssetError::Decode { .. })));
    }
}
