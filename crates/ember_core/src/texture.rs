//! Surface color evaluators and image maps.
//!
//! A [`Texture`] turns a hit point into a base color. Image-mapped textures
//! share decoded images through an [`ImageCache`] owned by whoever builds
//! the scene, so one file is decoded once per session.

use ember_math::{Color, Ray, Vec3};
use std::collections::HashMap;
use std::f32::consts::PI;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur when loading image maps.
#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Failed to load image: {0}")]
    LoadError(String),

    #[error("Image {path} has no pixels")]
    Empty { path: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for image operations.
pub type ImageResult<T> = Result<T, ImageError>;

/// Color evaluation at a surface point.
pub trait Texture: Send + Sync {
    fn color(&self, hit: Vec3, ray: &Ray) -> Color;
}

/// A single flat color.
#[derive(Debug, Clone, Copy)]
pub struct ConstantTexture(pub Color);

impl Texture for ConstantTexture {
    fn color(&self, _hit: Vec3, _ray: &Ray) -> Color {
        self.0
    }
}

/// Solid 3D checkerboard.
#[derive(Debug, Clone, Copy)]
pub struct CheckerTexture {
    pub even: Color,
    pub odd: Color,
    pub center: Vec3,
    /// Cells per unit length
    pub scale: f32,
}

impl CheckerTexture {
    pub fn new(even: Color, odd: Color, scale: f32) -> Self {
        Self {
            even,
            odd,
            center: Vec3::ZERO,
            scale,
        }
    }
}

impl Texture for CheckerTexture {
    fn color(&self, hit: Vec3, _ray: &Ray) -> Color {
        let p = ((hit - self.center) * self.scale).floor();
        let parity = (p.x as i64 + p.y as i64 + p.z as i64).rem_euclid(2);
        if parity == 0 {
            self.even
        } else {
            self.odd
        }
    }
}

/// How a hit point is projected into image coordinates.
#[derive(Debug, Clone, Copy)]
pub enum Mapping {
    /// Project onto the plane spanned by two axes; their lengths set the tiling.
    Planar { u_axis: Vec3, v_axis: Vec3 },
    /// Longitude/latitude around the center, +Y up.
    Spherical,
    /// Angle around +Y for u, height along +Y scaled by `v_scale` for v.
    Cylindrical { v_scale: f32 },
}

/// A texture that samples an image.
#[derive(Clone)]
pub struct ImageTexture {
    pub image: Arc<Image>,
    pub mapping: Mapping,
    pub center: Vec3,
}

impl ImageTexture {
    pub fn new(image: Arc<Image>, mapping: Mapping, center: Vec3) -> Self {
        Self {
            image,
            mapping,
            center,
        }
    }

    fn uv(&self, hit: Vec3) -> (f32, f32) {
        let local = hit - self.center;
        match self.mapping {
            Mapping::Planar { u_axis, v_axis } => (local.dot(u_axis), local.dot(v_axis)),
            Mapping::Spherical => {
                let d = local.normalize_or_zero();
                let u = 0.5 + d.z.atan2(d.x) / (2.0 * PI);
                let v = 0.5 + d.y.clamp(-1.0, 1.0).asin() / PI;
                (u, v)
            }
            Mapping::Cylindrical { v_scale } => {
                let u = 0.5 + local.z.atan2(local.x) / (2.0 * PI);
                (u, local.y * v_scale)
            }
        }
    }
}

impl Texture for ImageTexture {
    fn color(&self, hit: Vec3, _ray: &Ray) -> Color {
        let (u, v) = self.uv(hit);
        self.image.sample(u, v)
    }
}

/// A decoded RGB image with values in [0, 1].
#[derive(Debug, Clone)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    pixels: Vec<[f32; 3]>,
    pub path: String,
}

impl Image {
    /// Create an image from raw pixel data (row 0 at the top).
    pub fn new(width: u32, height: u32, pixels: Vec<[f32; 3]>, path: String) -> Self {
        Self {
            width,
            height,
            pixels,
            path,
        }
    }

    /// Create a 1x1 solid color image.
    pub fn solid_color(color: Color) -> Self {
        Self::new(1, 1, vec![color.to_array()], String::from("<solid>"))
    }

    /// Sample with wrapping UV coordinates and bilinear filtering.
    ///
    /// `v = 0` is the bottom row of the image.
    pub fn sample(&self, u: f32, v: f32) -> Color {
        let u = u.rem_euclid(1.0);
        let v = v.rem_euclid(1.0);

        let x = u * (self.width as f32 - 1.0);
        let y = (1.0 - v) * (self.height as f32 - 1.0); // Flip V for image rows

        let x0 = x.floor() as u32;
        let y0 = y.floor() as u32;
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);

        let fx = x.fract();
        let fy = y.fract();

        let p00 = self.get_pixel(x0, y0);
        let p10 = self.get_pixel(x1, y0);
        let p01 = self.get_pixel(x0, y1);
        let p11 = self.get_pixel(x1, y1);

        let top = p00 * (1.0 - fx) + p10 * fx;
        let bottom = p01 * (1.0 - fx) + p11 * fx;
        top * (1.0 - fy) + bottom * fy
    }

    fn get_pixel(&self, x: u32, y: u32) -> Color {
        let idx = (y * self.width + x) as usize;
        self.pixels
            .get(idx)
            .map(|p| Color::from_array(*p))
            .unwrap_or(Color::ZERO)
    }

    /// Approximate memory footprint.
    pub fn size_bytes(&self) -> usize {
        self.pixels.len() * std::mem::size_of::<[f32; 3]>()
    }
}

/// Session-scoped cache of decoded images keyed by path.
pub struct ImageCache {
    images: HashMap<String, Arc<Image>>,

    /// Base directory for resolving relative paths
    base_dir: Option<PathBuf>,
}

impl ImageCache {
    /// Create a new empty cache.
    pub fn new() -> Self {
        Self {
            images: HashMap::new(),
            base_dir: None,
        }
    }

    /// Create a cache that resolves relative paths against `base_dir`.
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            images: HashMap::new(),
            base_dir: Some(base_dir.into()),
        }
    }

    /// Load an image from file, using the cache if available.
    pub fn load(&mut self, path: &str) -> ImageResult<Arc<Image>> {
        if let Some(image) = self.images.get(path) {
            return Ok(image.clone());
        }

        let full_path = self.resolve_path(path);
        let image = Arc::new(load_image_file(&full_path)?);
        self.images.insert(path.to_string(), image.clone());

        log::debug!(
            "Loaded image map: {} ({}x{}, {:.1} KB)",
            path,
            image.width,
            image.height,
            image.size_bytes() as f32 / 1024.0
        );

        Ok(image)
    }

    /// Register an in-memory image under `key`, replacing any previous entry.
    pub fn insert(&mut self, key: impl Into<String>, image: Image) -> Arc<Image> {
        let image = Arc::new(image);
        self.images.insert(key.into(), image.clone());
        image
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    fn resolve_path(&self, path: &str) -> PathBuf {
        let path = Path::new(path);

        if path.is_absolute() {
            path.to_path_buf()
        } else if let Some(base) = &self.base_dir {
            base.join(path)
        } else {
            path.to_path_buf()
        }
    }
}

impl Default for ImageCache {
    fn default() -> Self {
        Self::new()
    }
}

fn load_image_file(path: &Path) -> ImageResult<Image> {
    let img = image::open(path)
        .map_err(|e| ImageError::LoadError(format!("Failed to open {}: {}", path.display(), e)))?;

    let rgb = img.to_rgb8();
    let (width, height) = rgb.dimensions();
    if width == 0 || height == 0 {
        return Err(ImageError::Empty {
            path: path.display().to_string(),
        });
    }

    let pixels = rgb
        .pixels()
        .map(|p| {
            [
                p[0] as f32 / 255.0,
                p[1] as f32 / 255.0,
                p[2] as f32 / 255.0,
            ]
        })
        .collect();

    Ok(Image::new(width, height, pixels, path.to_string_lossy().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ray() -> Ray {
        Ray::new(Vec3::ZERO, Vec3::Z)
    }

    #[test]
    fn test_checker_alternates() {
        let tex = CheckerTexture::new(Color::ONE, Color::ZERO, 1.0);
        assert_eq!(tex.color(Vec3::new(0.5, 0.5, 0.5), &ray()), Color::ONE);
        assert_eq!(tex.color(Vec3::new(1.5, 0.5, 0.5), &ray()), Color::ZERO);
        assert_eq!(tex.color(Vec3::new(-0.5, 0.5, 0.5), &ray()), Color::ZERO);
    }

    #[test]
    fn test_image_bilinear_sample() {
        // 2x1 image: black on the left, white on the right
        let img = Image::new(2, 1, vec![[0.0; 3], [1.0; 3]], "gradient".into());
        assert!((img.sample(0.0, 0.5).x - 0.0).abs() < 1e-6);
        assert!((img.sample(0.5, 0.5).x - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_planar_image_texture() {
        let img = Arc::new(Image::solid_color(Color::new(1.0, 0.5, 0.0)));
        let tex = ImageTexture::new(
            img,
            Mapping::Planar {
                u_axis: Vec3::X,
                v_axis: Vec3::Y,
            },
            Vec3::ZERO,
        );
        let c = tex.color(Vec3::new(3.3, -2.1, 0.0), &ray());
        assert!((c - Color::new(1.0, 0.5, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_image_cache_keyed_by_path() {
        let mut cache = ImageCache::new();
        assert!(cache.is_empty());

        let a = cache.insert("a.png", Image::solid_color(Color::ONE));
        let b = cache.load("a.png").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_image_cache_missing_file() {
        let mut cache = ImageCache::with_base_dir("/nonexistent");
        assert!(matches!(
            cache.load("missing.png"),
            Err(ImageError::LoadError(_))
        ));
    }
}
