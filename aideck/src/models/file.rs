use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DateRange, GroupCount};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FileCategory {
    Image,
    Document,
    Audio,
    Video,
    Archive,
    Code,
    Data,
    #[default]
    Other,
}

const DOCUMENT_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/rtf",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.openxmlformats-officedocument.presentationml.presentation",
    "application/vnd.ms-powerpoint",
    "application/vnd.oasis.opendocument.text",
    "text/plain",
    "text/markdown",
    "text/rtf",
];

const ARCHIVE_TYPES: &[&str] = &[
    "application/zip",
    "application/x-zip-compressed",
    "application/x-tar",
    "application/gzip",
    "application/x-gzip",
    "application/x-7z-compressed",
    "application/x-rar-compressed",
    "application/vnd.rar",
];

const DATA_TYPES: &[&str] = &[
    "application/json",
    "application/xml",
    "application/x-yaml",
    "application/yaml",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/vnd.oasis.opendocument.spreadsheet",
    "text/csv",
    "text/xml",
    "text/yaml",
];

const CODE_TYPES: &[&str] = &[
    "application/javascript",
    "application/typescript",
    "application/x-sh",
    "application/x-python",
    "text/javascript",
    "text/html",
    "text/css",
];

impl FileCategory {
    /// Derive a category from a mime type. Matching ignores case and any
    /// `; parameter` suffix; unrecognized types map to `Other`.
    pub fn from_mime_type(mime_type: &str) -> Self {
        let essence = mime_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        if essence.starts_with("image/") {
            Self::Image
        } else if essence.starts_with("audio/") {
            Self::Audio
        } else if essence.starts_with("video/") {
            Self::Video
        } else if DOCUMENT_TYPES.contains(&essence.as_str()) {
            Self::Document
        } else if ARCHIVE_TYPES.contains(&essence.as_str()) {
            Self::Archive
        } else if DATA_TYPES.contains(&essence.as_str()) {
            Self::Data
        } else if CODE_TYPES.contains(&essence.as_str()) || essence.starts_with("text/x-") {
            Self::Code
        } else {
            Self::Other
        }
    }
}

impl std::fmt::Display for FileCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Image => write!(f, "image"),
            Self::Document => write!(f, "document"),
            Self::Audio => write!(f, "audio"),
            Self::Video => write!(f, "video"),
            Self::Archive => write!(f, "archive"),
            Self::Code => write!(f, "code"),
            Self::Data => write!(f, "data"),
            Self::Other => write!(f, "other"),
        }
    }
}

impl std::str::FromStr for FileCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "image" => Ok(Self::Image),
            "document" => Ok(Self::Document),
            "audio" => Ok(Self::Audio),
            "video" => Ok(Self::Video),
            "archive" => Ok(Self::Archive),
            "code" => Ok(Self::Code),
            "data" => Ok(Self::Data),
            "other" => Ok(Self::Other),
            _ => Err(format!("Unknown file category: {s}")),
        }
    }
}

/// Does `mime_type` match an allow-list entry such as `image/png` or `image/*`?
pub fn mime_type_allowed(mime_type: &str, allowed: &[String]) -> bool {
    if allowed.is_empty() {
        return true;
    }
    let essence = mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    allowed.iter().any(|entry| {
        let entry = entry.to_ascii_lowercase();
        match entry.strip_suffix("/*") {
            Some(top) => essence
                .split_once('/')
                .is_some_and(|(essence_top, _)| essence_top == top),
            None => entry == essence,
        }
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: String,
    pub user_id: String,
    pub filename: String,
    pub mime_type: String,
    pub size: i64,
    pub storage_path: String,
    pub category: FileCategory,
    pub is_public: bool,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FileRecord {
    /// New record whose category is derived from `mime_type`.
    pub fn new(
        id: String,
        user_id: String,
        filename: String,
        mime_type: String,
        size: i64,
        storage_path: String,
    ) -> Self {
        let now = super::utc_now();
        let category = FileCategory::from_mime_type(&mime_type);
        Self {
            id,
            user_id,
            filename,
            mime_type,
            size,
            storage_path,
            category,
            is_public: false,
            description: None,
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ListFilesFilter {
    pub category: Option<FileCategory>,
    /// Matches mime types starting with this prefix, e.g. `image/`.
    pub mime_type_prefix: Option<String>,
    pub is_public: Option<bool>,
    pub search: Option<String>,
    pub min_size: Option<i64>,
    pub max_size: Option<i64>,
    pub created: DateRange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileCategoryStat {
    pub category: String,
    pub count: u64,
    pub total_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileStats {
    pub total: u64,
    pub total_bytes: u64,
    pub public_count: u64,
    pub by_category: Vec<FileCategoryStat>,
}

impl FileStats {
    pub fn category_counts(&self) -> Vec<GroupCount> {
        self.by_category
            .iter()
            .map(|stat| GroupCount {
                key: stat.category.clone(),
                count: stat.count,
            })
            .collect()
    }
}
