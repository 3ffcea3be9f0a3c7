//! Package builder: zips a generated poster folder into the output directory.
//!
//! A package is a plain zip archive named `<name>.zip` written to the
//! directory configured as `lpg.output`.  Every regular file under the source
//! directory is stored under its path relative to that directory, with `/`
//! separators on every platform so the archive unpacks the same everywhere.
//!
//! Compression is blocking I/O, so [`create_package`] moves the work onto
//! tokio's blocking pool and only awaits the result.

use std::fs::File;
use std::path::{Path, PathBuf};

use lpg_core::path::PACKAGE_EXTENSION;
use lpg_core::Settings;
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Error type for package creation.
#[derive(Debug, Error)]
pub enum PackageError {
    /// `lpg.output` is empty, so there is nowhere to write the package.
    #[error("package output path is not set")]
    OutputPathNotSet,

    #[error("invalid package name {0:?}")]
    InvalidName(String),

    /// The source directory does not exist or is not a directory.
    #[error("package source {0} is not a directory")]
    SourceMissing(PathBuf),

    #[error("I/O error accessing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to walk package source: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("failed to write package archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// The blocking task panicked or was cancelled.
    #[error("package task failed: {0}")]
    Join(String),
}

/// Zips every file under `source_dir` into `<lpg.output>/<package_name>.zip`.
///
/// The output directory is created if needed and an existing package with
/// the same name is overwritten.  Returns the path of the written archive.
///
/// # Errors
///
/// [`PackageError::OutputPathNotSet`] when the package path is not
/// configured, [`PackageError::InvalidName`] for an empty name or one
/// containing a path separator, [`PackageError::SourceMissing`] when
/// `source_dir` is not a directory, and the I/O, walk or zip error otherwise.
pub async fn create_package(
    settings: &Settings,
    source_dir: PathBuf,
    package_name: &str,
) -> Result<PathBuf, PackageError> {
    if !settings.is_package_path_set() {
        return Err(PackageError::OutputPathNotSet);
    }
    if package_name.is_empty() || package_name.contains(['/', '\\']) {
        return Err(PackageError::InvalidName(package_name.to_string()));
    }

    let output_dir = PathBuf::from(&settings.lpg.output);
    let target = output_dir.join(format!("{package_name}.{PACKAGE_EXTENSION}"));

    tokio::task::spawn_blocking(move || write_archive(&source_dir, &output_dir, &target))
        .await
        .map_err(|e| PackageError::Join(e.to_string()))?
}

fn write_archive(
    source_dir: &Path,
    output_dir: &Path,
    target: &Path,
) -> Result<PathBuf, PackageError> {
    if !source_dir.is_dir() {
        return Err(PackageError::SourceMissing(source_dir.to_path_buf()));
    }
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| PackageError::Io { path, source }
    };

    std::fs::create_dir_all(output_dir).map_err(io_err(output_dir))?;
    let file = File::create(target).map_err(io_err(target))?;
    // Canonical on both sides; the archive may sit inside the source.
    let source_root = source_dir.canonicalize().map_err(io_err(source_dir))?;
    let archive_path = target.canonicalize().map_err(io_err(target))?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut entries = 0usize;
    for entry in WalkDir::new(&source_root).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type().is_dir() || path == archive_path {
            continue;
        }

        let Ok(relative) = path.strip_prefix(&source_root) else {
            continue;
        };
        let name = relative.to_string_lossy().replace('\\', "/");
        debug!(entry = %name, "adding file to package");

        zip.start_file(name, options)?;
        let mut input = File::open(path).map_err(io_err(path))?;
        std::io::copy(&mut input, &mut zip).map_err(io_err(path))?;
        entries += 1;
    }

    zip.finish()?;
    info!(package = %target.display(), entries, "package created");
    Ok(target.to_path_buf())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
