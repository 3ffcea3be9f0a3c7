//! Poster and painting generator.
//!
//! Turns every picture in an input directory into the texture files the
//! LethalPosters and LethalPaintings mods load, written below the configured
//! `lpg.output` directory:
//!
//! ```text
//! <lpg.output>/
//!   LethalPosters/posters/<i>.png     atlas of 5 pictures on the poster template
//!   LethalPosters/tips/<i>.png        picture i alone on a 796x1024 canvas
//!   LethalPaintings/paintings/<i>.png picture i framed by the painting template
//! ```
//!
//! Atlas `i` uses pictures `i..i+5`, wrapping around the list, so every
//! picture shows up in five different atlases.
//!
//! Decoding, resizing and encoding are CPU-bound, so each mode runs on its
//! own blocking task and both modes run at the same time.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgba, RgbaImage};
use lpg_core::Settings;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// File name of the poster atlas template inside the template directory.
pub const POSTER_TEMPLATE: &str = "posters_template.png";
/// File name of the painting frame template inside the template directory.
pub const PAINTING_TEMPLATE: &str = "painting_template.png";

const POSTERS_DIR: [&str; 2] = ["LethalPosters", "posters"];
const TIPS_DIR: [&str; 2] = ["LethalPosters", "tips"];
const PAINTINGS_DIR: [&str; 2] = ["LethalPaintings", "paintings"];

/// Pictures per poster atlas.
const ATLAS_SLOTS: usize = 5;

/// `[x, y, width, height]` of each atlas slot on the poster template.
/// A picture is scaled to fit its slot and aligned to the slot's top-right
/// corner.
const POSTER_SLOTS: [[u32; 4]; ATLAS_SLOTS] = [
    [0, 0, 341, 559],
    [346, 0, 284, 559],
    [641, 58, 274, 243],
    [184, 620, 411, 364],
    [632, 320, 372, 672],
];

const TIPS_SIZE: (u32, u32) = (796, 1024);

/// `[x, y, width, height]` of the canvas inside the painting frame.  The
/// picture is cropped to fill it.
const PAINTING_CANVAS: [u32; 4] = [264, 19, 243, 324];

/// Error type for texture generation.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// `lpg.output` is empty, so there is nowhere to write the textures.
    #[error("package output path is not set")]
    OutputPathNotSet,

    #[error("I/O error accessing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A template could not be decoded or a texture could not be encoded.
    #[error("image error for {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// A blocking task panicked or was cancelled.
    #[error("generation task failed: {0}")]
    Join(String),
}

/// Which texture families to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMode {
    /// Poster atlases and tips.
    Posters,
    Paintings,
}

/// Inputs of one generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Directory of source pictures.  Created if missing; files that are not
    /// decodable images are skipped.
    pub input_dir: PathBuf,
    /// Directory holding [`POSTER_TEMPLATE`] and [`PAINTING_TEMPLATE`].
    pub template_dir: PathBuf,
    pub modes: Vec<GenerationMode>,
}

/// What a generation run read and wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationReport {
    /// Number of source pictures decoded.
    pub pictures: usize,
    /// Every texture file written, posters first.
    pub written: Vec<PathBuf>,
}

/// Generates the textures requested by `request` below `lpg.output`.
///
/// # Errors
///
/// [`GenerationError::OutputPathNotSet`] when the package path is not
/// configured; otherwise the first I/O or image error of any mode.
pub async fn generate(
    settings: &Settings,
    request: GenerationRequest,
) -> Result<GenerationReport, GenerationError> {
    if !settings.is_package_path_set() {
        return Err(GenerationError::OutputPathNotSet);
    }
    let output_dir = PathBuf::from(&settings.lpg.output);

    let input_dir = request.input_dir.clone();
    let pictures = join(tokio::task::spawn_blocking(move || read_pictures(&input_dir))).await?;
    let pictures = Arc::new(pictures);
    info!(
        input = %request.input_dir.display(),
        pictures = pictures.len(),
        "generating textures"
    );

    let mut tasks: Vec<JoinHandle<Result<Vec<PathBuf>, GenerationError>>> = Vec::new();
    if request.modes.contains(&GenerationMode::Posters) {
        let (pictures, templates, output) =
            (Arc::clone(&pictures), request.template_dir.clone(), output_dir.clone());
        tasks.push(tokio::task::spawn_blocking(move || {
            generate_posters(&pictures, &templates, &output)
        }));
    }
    if request.modes.contains(&GenerationMode::Paintings) {
        let (pictures, templates, output) =
            (Arc::clone(&pictures), request.template_dir.clone(), output_dir.clone());
        tasks.push(tokio::task::spawn_blocking(move || {
            generate_paintings(&pictures, &templates, &output)
        }));
    }

    let mut report = GenerationReport {
        pictures: pictures.len(),
        written: Vec::new(),
    };
    for task in tasks {
        report.written.extend(join(task).await?);
    }

    info!(files = report.written.len(), "textures generated");
    Ok(report)
}

async fn join<T>(task: JoinHandle<Result<T, GenerationError>>) -> Result<T, GenerationError> {
    task.await
        .map_err(|e| GenerationError::Join(e.to_string()))?
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> GenerationError {
    let path = path.to_path_buf();
    move |source| GenerationError::Io { path, source }
}

fn image_err(path: &Path) -> impl FnOnce(image::ImageError) -> GenerationError {
    let path = path.to_path_buf();
    move |source| GenerationError::Image { path, source }
}

// ── Reading ───────────────────────────────────────────────────────────────────

/// Decodes every image file directly inside `dir`, in file name order.
fn read_pictures(dir: &Path) -> Result<Vec<DynamicImage>, GenerationError> {
    std::fs::create_dir_all(dir).map_err(io_err(dir))?;

    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(io_err(dir))?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    paths.sort();

    Ok(paths
        .iter()
        .filter_map(|path| match image::open(path) {
            Ok(picture) => Some(picture),
            Err(e) => {
                debug!(path = %path.display(), "skipping input: {e}");
                None
            }
        })
        .collect())
}

fn open_template(dir: &Path, name: &str) -> Result<DynamicImage, GenerationError> {
    let path = dir.join(name);
    image::open(&path).map_err(image_err(&path))
}

fn texture_dir(root: &Path, parts: [&str; 2]) -> Result<PathBuf, GenerationError> {
    let dir = parts.iter().fold(root.to_path_buf(), |dir, part| dir.join(part));
    std::fs::create_dir_all(&dir).map_err(io_err(&dir))?;
    Ok(dir)
}

/// Picture `index`, wrapping around the list.
fn nth(pictures: &[DynamicImage], index: usize) -> &DynamicImage {
    &pictures[index % pictures.len()]
}

fn save_png(image: &DynamicImage, path: PathBuf) -> Result<PathBuf, GenerationError> {
    image
        .save_with_format(&path, ImageFormat::Png)
        .map_err(image_err(&path))?;
    Ok(path)
}

// ── Modes ─────────────────────────────────────────────────────────────────────

fn generate_posters(
    pictures: &[DynamicImage],
    template_dir: &Path,
    output: &Path,
) -> Result<Vec<PathBuf>, GenerationError> {
    let template = open_template(template_dir, POSTER_TEMPLATE)?;
    let posters_dir = texture_dir(output, POSTERS_DIR)?;
    let tips_dir = texture_dir(output, TIPS_DIR)?;

    let mut written = Vec::with_capacity(pictures.len() * 2);
    for i in 0..pictures.len() {
        let tag = format!("{i}.png");
        let slots: Vec<&DynamicImage> = (0..ATLAS_SLOTS).map(|j| nth(pictures, i + j)).collect();

        written.push(save_png(&atlas(&template, &slots), posters_dir.join(&tag))?);
        let tip = DynamicImage::ImageRgba8(tips(&pictures[i]));
        written.push(save_png(&tip, tips_dir.join(&tag))?);
    }
    debug!(count = pictures.len(), "posters and tips written");
    Ok(written)
}

fn generate_paintings(
    pictures: &[DynamicImage],
    template_dir: &Path,
    output: &Path,
) -> Result<Vec<PathBuf>, GenerationError> {
    let template = open_template(template_dir, PAINTING_TEMPLATE)?;
    let paintings_dir = texture_dir(output, PAINTINGS_DIR)?;

    pictures
        .iter()
        .enumerate()
        .map(|(i, picture)| {
            save_png(&painting(&template, picture), paintings_dir.join(format!("{i}.png")))
        })
        .collect()
}

// ── Compositing ───────────────────────────────────────────────────────────────

fn atlas(template: &DynamicImage, pictures: &[&DynamicImage]) -> DynamicImage {
    let mut base = template.clone();
    for ([x, y, width, height], picture) in POSTER_SLOTS.iter().zip(pictures) {
        let scaled = picture.resize(*width, *height, FilterType::Lanczos3);
        let left = i64::from(x + width - scaled.width());
        imageops::overlay(&mut base, &scaled, left, i64::from(*y));
    }
    base
}

fn tips(picture: &DynamicImage) -> RgbaImage {
    let (width, height) = TIPS_SIZE;
    let mut base: RgbaImage = ImageBuffer::from_pixel(width, height, Rgba([0, 0, 0, 0]));
    let scaled = picture.resize(width, height, FilterType::Lanczos3).to_rgba8();
    imageops::overlay(&mut base, &scaled, i64::from(width - scaled.width()), 0);
    base
}

fn painting(template: &DynamicImage, picture: &DynamicImage) -> DynamicImage {
    let [x, y, width, height] = PAINTING_CANVAS;
    let mut base = template.clone();
    let filled = picture.resize_to_fill(width, height, FilterType::Lanczos3);
    imageops::overlay(&mut base, &filled, i64::from(x), i64::from(y));
    base
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use image::GenericImageView;
    use uuid::Uuid;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    fn scratch_dir() -> PathBuf {
        std::env::temp_dir().join(format!("lpg_generation_{}", Uuid::new_v4()))
    }

    fn solid(width: u32, height: u32, color: Rgba<u8>) -> RgbaImage {
        ImageBuffer::from_pixel(width, height, color)
    }

    /// Writes templates and two red input pictures plus a non-image file.
    fn seed(root: &Path) -> GenerationRequest {
        let input_dir = root.join("input");
        let template_dir = root.join("templates");
        std::fs::create_dir_all(&input_dir).unwrap();
        std::fs::create_dir_all(&template_dir).unwrap();

        let white = Rgba([255, 255, 255, 255]);
        solid(256, 256, white)
            .save(template_dir.join(POSTER_TEMPLATE))
            .unwrap();
        solid(520, 360, white)
            .save(template_dir.join(PAINTING_TEMPLATE))
            .unwrap();
        solid(16, 16, RED).save(input_dir.join("a.png")).unwrap();
        solid(16, 24, RED).save(input_dir.join("b.png")).unwrap();
        std::fs::write(input_dir.join("notes.txt"), "not a picture").unwrap();

        GenerationRequest {
            input_dir,
            template_dir,
            modes: vec![GenerationMode::Posters, GenerationMode::Paintings],
        }
    }

    fn settings_with_output(output: &Path) -> Settings {
        let mut settings = Settings::default();
        settings.lpg.output = output.to_string_lossy().into_owned();
        settings
    }

    #[tokio::test]
    async fn test_generate_fails_when_output_path_not_set() {
        // Arrange
        let request = GenerationRequest {
            input_dir: scratch_dir(),
            template_dir: scratch_dir(),
            modes: vec![GenerationMode::Posters],
        };

        // Act
        let result = generate(&Settings::default(), request).await;

        // Assert
        assert!(matches!(result, Err(GenerationError::OutputPathNotSet)));
    }

    #[tokio::test]
    async fn test_generate_writes_every_texture_family() {
        // Arrange
        let root = scratch_dir();
        let request = seed(&root);
        let output = root.join("out");

        // Act
        let report = generate(&settings_with_output(&output), request)
            .await
            .expect("generate");

        // Assert
        assert_eq!(report.pictures, 2, "notes.txt must be skipped");
        assert_eq!(report.written.len(), 6);
        for dir in ["LethalPosters/posters", "LethalPosters/tips", "LethalPaintings/paintings"] {
            for tag in ["0.png", "1.png"] {
                assert!(output.join(dir).join(tag).is_file(), "{dir}/{tag}");
            }
        }

        std::fs::remove_dir_all(&root).ok();
    }

    #[tokio::test]
    async fn test_generated_textures_keep_template_geometry() {
        let root = scratch_dir();
        let request = seed(&root);
        let output = root.join("out");

        generate(&settings_with_output(&output), request)
            .await
            .expect("generate");

        let tips = image::open(output.join("LethalPosters/tips/0.png")).unwrap();
        assert_eq!(tips.dimensions(), TIPS_SIZE);
        let painting = image::open(output.join("LethalPaintings/paintings/0.png")).unwrap();
        assert_eq!(painting.dimensions(), (520, 360));
        let canvas = painting.get_pixel(PAINTING_CANVAS[0] + 10, PAINTING_CANVAS[1] + 10);
        assert!(canvas[0] > 200 && canvas[1] < 50, "canvas must show the picture: {canvas:?}");
        let frame = painting.get_pixel(2, 2);
        assert_eq!(frame, Rgba([255, 255, 255, 255]));

        std::fs::remove_dir_all(&root).ok();
    }

    #[tokio::test]
    async fn test_generate_only_requested_modes() {
        let root = scratch_dir();
        let request = GenerationRequest {
            modes: vec![GenerationMode::Paintings],
            ..seed(&root)
        };
        let output = root.join("out");

        let report = generate(&settings_with_output(&output), request)
            .await
            .expect("generate");

        assert_eq!(report.written.len(), 2);
        assert!(!output.join("LethalPosters").exists());

        std::fs::remove_dir_all(&root).ok();
    }

    #[tokio::test]
    async fn test_missing_template_is_image_error() {
        let root = scratch_dir();
        let request = seed(&root);
        std::fs::remove_file(request.template_dir.join(PAINTING_TEMPLATE)).unwrap();

        let result = generate(&settings_with_output(&root.join("out")), request).await;

        match result {
            Err(GenerationError::Image { path, .. }) => {
                assert!(path.ends_with(PAINTING_TEMPLATE))
            }
            other => panic!("expected Image error, got {other:?}"),
        }
        std::fs::remove_dir_all(&root).ok();
    }

    #[tokio::test]
    async fn test_empty_input_creates_directory_and_writes_nothing() {
        let root = scratch_dir();
        let request = GenerationRequest {
            input_dir: root.join("fresh_input"),
            ..seed(&root)
        };

        let report = generate(&settings_with_output(&root.join("out")), request.clone())
            .await
            .expect("generate");

        assert_eq!(report, GenerationReport::default());
        assert!(request.input_dir.is_dir());
        std::fs::remove_dir_all(&root).ok();
    }
}
