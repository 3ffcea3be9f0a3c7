//! Path string decomposition and file-dialog filter sets.
//!
//! The UI hands the backend raw path strings coming out of native file
//! pickers.  [`PathResolver::resolve`] turns such a string into a
//! [`PathData`] descriptor so callers can ask "which directory is this in?"
//! or "is this a package archive?" without touching the file system.
//!
//! # Absence is meaningful
//!
//! When the last path segment has no `.` in it, `file`, `name` and
//! `extension` are all `None` and `uri` is the raw path unchanged.  They are
//! never empty strings standing in for "missing": [`is_package`] and
//! [`classify`] branch on `None` versus `Some`.
//!
//! # Multi-dot file names
//!
//! Only the text after the **last** `.` is the extension; everything before
//! it is the name.  `archive.tar.gz` resolves to name `archive.tar` and
//! extension `gz`.
//!
//! ```rust
//! use lpg_core::path::PathResolver;
//!
//! let resolver = PathResolver::new('/');
//! let data = resolver.resolve("/home/me/packs/archive.tar.gz");
//! assert_eq!(data.uri, "/home/me/packs");
//! assert_eq!(data.name.as_deref(), Some("archive.tar"));
//! assert_eq!(data.extension.as_deref(), Some("gz"));
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Separator between a file's base name and its extension.
pub const EXTENSION_SEPARATOR: char = '.';

/// Extension of package archives produced and consumed by the app.
pub const PACKAGE_EXTENSION: &str = "zip";

const PICTURE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];
const PACKAGE_EXTENSIONS: &[&str] = &[PACKAGE_EXTENSION];

// ── PathData ──────────────────────────────────────────────────────────────────

/// Read-only decomposition of a single raw path string.
///
/// Created per call, owned by the caller, never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathData {
    /// The raw path exactly as given.
    pub path: String,
    /// Parent directory of the file, or the raw path when there is no file
    /// component.
    pub uri: String,
    /// Last path segment (`poster.png`), present only when it has an extension.
    pub file: Option<String>,
    /// File name without its final extension (`poster`).
    pub name: Option<String>,
    /// Final extension without the dot (`png`).
    pub extension: Option<String>,
}

impl PathData {
    fn without_file(raw: &str) -> Self {
        Self {
            path: raw.to_string(),
            uri: raw.to_string(),
            file: None,
            name: None,
            extension: None,
        }
    }

    /// Returns `true` when the path ends in an extension-bearing file name.
    pub fn has_file(&self) -> bool {
        self.file.is_some()
    }
}

// ── PathResolver ──────────────────────────────────────────────────────────────

/// Stateless path splitter bound to one directory separator.
///
/// [`PathResolver::native`] uses the separator of the platform the binary was
/// compiled for; [`PathResolver::new`] pins it, which keeps tests
/// deterministic across platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathResolver {
    separator: char,
}

impl Default for PathResolver {
    fn default() -> Self {
        Self::native()
    }
}

impl PathResolver {
    /// Creates a resolver that splits on `separator`.
    pub const fn new(separator: char) -> Self {
        Self { separator }
    }

    /// Creates a resolver using the platform's main path separator.
    pub const fn native() -> Self {
        Self::new(std::path::MAIN_SEPARATOR)
    }

    /// The directory separator this resolver splits and joins on.
    pub fn separator(&self) -> char {
        self.separator
    }

    /// Decomposes `raw` into a [`PathData`].
    ///
    /// Never fails: input without an extension-bearing last segment degrades
    /// to the "no file" shape.
    pub fn resolve(&self, raw: &str) -> PathData {
        let (dir, file) = match raw.rsplit_once(self.separator) {
            Some((dir, file)) => (dir, file),
            None => ("", raw),
        };

        let Some((name, extension)) = file.rsplit_once(EXTENSION_SEPARATOR) else {
            return PathData::without_file(raw);
        };

        PathData {
            path: raw.to_string(),
            uri: dir.to_string(),
            file: Some(file.to_string()),
            name: Some(name.to_string()),
            extension: Some(extension.to_string()),
        }
    }

    /// Joins the present, non-empty `parts` with the separator.
    ///
    /// Skipped parts never leave a doubled separator behind, and zero usable
    /// parts yield an empty string.
    pub fn join<'a, I, S>(&self, parts: I) -> String
    where
        I: IntoIterator<Item = S>,
        S: Into<Option<&'a str>>,
    {
        let mut buf = [0u8; 4];
        let separator: &str = self.separator.encode_utf8(&mut buf);

        parts
            .into_iter()
            .filter_map(Into::into)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(separator)
    }
}

/// Resolves `raw` with the platform separator.  See [`PathResolver::resolve`].
pub fn resolve(raw: &str) -> PathData {
    PathResolver::native().resolve(raw)
}

/// Joins `parts` with the platform separator.  See [`PathResolver::join`].
pub fn join<'a, I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: Into<Option<&'a str>>,
{
    PathResolver::native().join(parts)
}

// ── Filter sets ───────────────────────────────────────────────────────────────

/// Categories of files the native file dialogs filter on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FilterType {
    Package,
    Pictures,
}

impl FilterType {
    /// Every category, in display order.
    pub const ALL: [FilterType; 2] = [FilterType::Package, FilterType::Pictures];

    /// Display name shown in the dialog's filter drop-down.
    pub fn name(self) -> &'static str {
        match self {
            FilterType::Package => "Package",
            FilterType::Pictures => "Pictures",
        }
    }

    /// Extensions (without dots) accepted by this category.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            FilterType::Package => PACKAGE_EXTENSIONS,
            FilterType::Pictures => PICTURE_EXTENSIONS,
        }
    }
}

/// One native file-dialog filter entry: `{ "name": ..., "extensions": [...] }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogFilter {
    pub name: String,
    pub extensions: Vec<String>,
}

impl From<FilterType> for DialogFilter {
    fn from(filter: FilterType) -> Self {
        Self {
            name: filter.name().to_string(),
            extensions: filter.extensions().iter().map(|e| e.to_string()).collect(),
        }
    }
}

/// The category → dialog filters mapping handed verbatim to the file picker.
pub fn dialog_filters() -> BTreeMap<FilterType, Vec<DialogFilter>> {
    FilterType::ALL
        .into_iter()
        .map(|filter| (filter, vec![DialogFilter::from(filter)]))
        .collect()
}

/// Returns `true` iff `data` has an extension accepted by `filter`.
///
/// Extension matching is exact (case-sensitive), so `POSTER.PNG` is not a
/// picture.
pub fn classify(data: &PathData, filter: FilterType) -> bool {
    data.extension
        .as_deref()
        .is_some_and(|ext| filter.extensions().contains(&ext))
}

/// Returns `true` iff `data` points at a package archive (`.zip`).
pub fn is_package(data: &PathData) -> bool {
    classify(data, FilterType::Package)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const UNIX: PathResolver = PathResolver::new('/');
    const WINDOWS: PathResolver = PathResolver::new('\\');

    // ── resolve ───────────────────────────────────────────────────────────────

    #[test]
    fn test_resolve_splits_directory_name_and_extension() {
        // Arrange / Act
        let data = UNIX.resolve("/opt/lpg/input/poster.png");

        // Assert
        assert_eq!(data.path, "/opt/lpg/input/poster.png");
        assert_eq!(data.uri, "/opt/lpg/input");
        assert_eq!(data.file.as_deref(), Some("poster.png"));
        assert_eq!(data.name.as_deref(), Some("poster"));
        assert_eq!(data.extension.as_deref(), Some("png"));
    }

    #[test]
    fn test_resolve_directory_without_extension_leaves_file_parts_absent() {
        let data = UNIX.resolve("/opt/lpg/plugins");

        assert_eq!(data.uri, "/opt/lpg/plugins");
        assert_eq!(data.path, "/opt/lpg/plugins");
        assert!(data.file.is_none());
        assert!(data.name.is_none());
        assert!(data.extension.is_none());
        assert!(!data.has_file());
    }

    #[test]
    fn test_resolve_trailing_separator_has_no_file() {
        let data = UNIX.resolve("/opt/lpg/");

        assert_eq!(data.uri, "/opt/lpg/");
        assert!(data.file.is_none());
    }

    #[test]
    fn test_resolve_dot_in_directory_only_has_no_file() {
        // The dot lives in a parent segment, not the last one.
        let data = UNIX.resolve("/home/me/.config/lpg");

        assert_eq!(data.uri, "/home/me/.config/lpg");
        assert!(data.extension.is_none());
    }

    #[test]
    fn test_resolve_bare_file_name_has_empty_uri() {
        let data = UNIX.resolve("pack.zip");

        assert_eq!(data.uri, "");
        assert_eq!(data.name.as_deref(), Some("pack"));
        assert_eq!(data.extension.as_deref(), Some("zip"));
    }

    #[test]
    fn test_resolve_multi_dot_name_keeps_everything_before_last_dot() {
        // Two historical variants disagreed here ("archive.tar" vs "tar");
        // the canonical rule keeps every segment but the last.
        let data = UNIX.resolve("/packs/archive.tar.gz");

        assert_eq!(data.name.as_deref(), Some("archive.tar"));
        assert_eq!(data.extension.as_deref(), Some("gz"));
    }

    #[test]
    fn test_resolve_hidden_file_has_empty_name() {
        let data = UNIX.resolve("/home/me/.lpgrc");

        assert_eq!(data.name.as_deref(), Some(""));
        assert_eq!(data.extension.as_deref(), Some("lpgrc"));
    }

    #[test]
    fn test_resolve_uses_configured_separator() {
        let data = WINDOWS.resolve(r"C:\Users\me\Posters\cat.jpg");

        assert_eq!(data.uri, r"C:\Users\me\Posters");
        assert_eq!(data.name.as_deref(), Some("cat"));
        assert_eq!(data.extension.as_deref(), Some("jpg"));
    }

    #[test]
    fn test_resolve_empty_string_degrades_to_no_file() {
        let data = UNIX.resolve("");

        assert_eq!(data.uri, "");
        assert!(data.file.is_none());
    }

    // ── join ──────────────────────────────────────────────────────────────────

    #[test]
    fn test_join_skips_absent_and_empty_parts() {
        assert_eq!(UNIX.join([Some("a"), None, Some(""), Some("b")]), "a/b");
    }

    #[test]
    fn test_join_with_absent_part_equals_join_without_it() {
        assert_eq!(UNIX.join([Some("a"), None, Some("b")]), UNIX.join(["a", "b"]));
    }

    #[test]
    fn test_join_of_nothing_usable_is_empty() {
        assert_eq!(UNIX.join([None::<&str>, Some(""), None]), "");
        assert_eq!(UNIX.join(Vec::<&str>::new()), "");
    }

    #[test]
    fn test_join_reassembles_resolved_path() {
        let data = UNIX.resolve("/packs/lethal.zip");
        let file = data.file.as_deref();

        assert_eq!(UNIX.join([Some(data.uri.as_str()), file]), data.path);
    }

    // ── filters ───────────────────────────────────────────────────────────────

    #[test]
    fn test_is_package_requires_zip_extension() {
        assert!(is_package(&UNIX.resolve("/out/pack.zip")));
        assert!(!is_package(&UNIX.resolve("/out/pack.rar")));
        assert!(!is_package(&UNIX.resolve("/out/pack")));
    }

    #[test]
    fn test_classify_pictures_accepts_every_picture_extension() {
        for ext in ["png", "jpg", "jpeg"] {
            let data = UNIX.resolve(&format!("/in/poster.{ext}"));
            assert!(classify(&data, FilterType::Pictures), "{ext} must be a picture");
        }
        assert!(!classify(&UNIX.resolve("/in/poster.gif"), FilterType::Pictures));
    }

    #[test]
    fn test_classify_is_case_sensitive() {
        assert!(!classify(&UNIX.resolve("/in/POSTER.PNG"), FilterType::Pictures));
    }

    #[test]
    fn test_dialog_filters_serializes_as_native_dialog_configuration() {
        // Arrange / Act
        let json = serde_json::to_value(dialog_filters()).expect("serialize filters");

        // Assert
        assert_eq!(
            json,
            serde_json::json!({
                "Package": [{ "name": "Package", "extensions": ["zip"] }],
                "Pictures": [{ "name": "Pictures", "extensions": ["png", "jpg", "jpeg"] }],
            })
        );
    }
}
