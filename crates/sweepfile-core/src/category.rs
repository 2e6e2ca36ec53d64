//! Content categories and the extension classifier.

use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Content category assigned to every scanned file.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Image,
    Video,
    Audio,
    Document,
    /// Android application packages.
    Apk,
    Archive,
    /// Anything under a downloads directory that no extension claimed.
    Download,
    Other,
}

impl Category {
    /// Plural label suitable for headings.
    pub fn label(self) -> &'static str {
        match self {
            Self::Image => "Images",
            Self::Video => "Videos",
            Self::Audio => "Audio",
            Self::Document => "Documents",
            Self::Apk => "APKs",
            Self::Archive => "Archives",
            Self::Download => "Downloads",
            Self::Other => "Other",
        }
    }
}

const GROUPS: &[(Category, &[&str])] = &[
    (
        Category::Image,
        &[
            "jpg", "jpeg", "png", "gif", "bmp", "webp", "heic", "heif", "tiff", "svg", "raw",
            "cr2", "nef",
        ],
    ),
    (
        Category::Video,
        &[
            "mp4", "mkv", "avi", "mov", "wmv", "flv", "webm", "m4v", "3gp", "ts", "mpeg", "mpg",
        ],
    ),
    (
        Category::Audio,
        &[
            "mp3", "aac", "flac", "wav", "ogg", "m4a", "wma", "opus", "aiff", "mid",
        ],
    ),
    (
        Category::Document,
        &[
            "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "txt", "csv", "odt", "ods", "odp",
            "epub", "mobi", "rtf", "md",
        ],
    ),
    (Category::Apk, &["apk", "xapk", "apks"]),
    (
        Category::Archive,
        &["zip", "rar", "7z", "tar", "gz", "bz2", "xz", "cab", "iso", "tgz"],
    ),
];

/// Flat extension → category table, built on first use and read-only after.
static EXTENSION_TABLE: LazyLock<HashMap<&'static str, Category>> = LazyLock::new(|| {
    GROUPS
        .iter()
        .flat_map(|(category, exts)| exts.iter().map(move |ext| (*ext, *category)))
        .collect()
});

/// Directory names that mark a file as downloaded content.
const DOWNLOAD_DIRS: &[&str] = &["download", "downloads"];

/// Classify a path by its lowercased extension, falling back to the
/// downloads-directory check and then [`Category::Other`].
pub fn classify(path: &Path) -> Category {
    let by_extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(|ext| EXTENSION_TABLE.get(ext.to_ascii_lowercase().as_str()).copied());

    if let Some(category) = by_extension {
        return category;
    }

    if is_under_downloads(path) {
        Category::Download
    } else {
        Category::Other
    }
}

fn is_under_downloads(path: &Path) -> bool {
    path.parent().is_some_and(|parent| {
        parent.components().any(|c| {
            c.as_os_str()
                .to_str()
                .is_some_and(|name| DOWNLOAD_DIRS.iter().any(|d| name.eq_ignore_ascii_case(d)))
        })
    })
}
