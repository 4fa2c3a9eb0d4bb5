use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

/// Post category
///
/// Serialized in snake_case. The Chinese labels used by the original client
/// are accepted on input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    #[serde(alias = "学习资料")]
    StudyMaterial,
    #[serde(alias = "经验分享")]
    Experience,
    #[serde(alias = "问题讨论")]
    Discussion,
    #[serde(alias = "资源推荐")]
    Resource,
    #[default]
    #[serde(alias = "其他")]
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::StudyMaterial => "study_material",
            Category::Experience => "experience",
            Category::Discussion => "discussion",
            Category::Resource => "resource",
            Category::Other => "other",
        }
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "study_material" | "学习资料" => Ok(Category::StudyMaterial),
            "experience" | "经验分享" => Ok(Category::Experience),
            "discussion" | "问题讨论" => Ok(Category::Discussion),
            "resource" | "资源推荐" => Ok(Category::Resource),
            "other" | "其他" => Ok(Category::Other),
            other => Err(format!("unknown category '{}'", other)),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Post record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub content: String,
    pub category: Category,
    pub tags: Vec<String>,
    pub views: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row shape of the `posts` table; category is stored as text
#[derive(Debug, FromRow)]
pub struct PostRow {
    pub id: Uuid,
    pub author_id: Uuid,
    pub title: String,
    pub content: String,
    pub category: String,
    pub tags: Vec<String>,
    pub views: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        let category = row.category.parse().unwrap_or_else(|_| {
            tracing::warn!(post_id = %row.id, category = %row.category, "unknown stored category");
            Category::Other
        });

        Self {
            id: row.id,
            author_id: row.author_id,
            title: row.title,
            content: row.content,
            category,
            tags: row.tags,
            views: row.views,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Attachment metadata
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PostFile {
    pub id: Uuid,
    pub post_id: Uuid,
    pub filename: String,
    pub original_name: String,
    pub mimetype: String,
    pub size: i64,
    /// Location on disk; never sent to clients
    #[serde(skip_serializing, default)]
    pub path: String,
    pub upload_date: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: Uuid,
    pub title: String,
    pub content: String,
    pub category: Category,
    pub tags: Vec<String>,
}

/// Attachment already written to the upload directory, awaiting its record
#[derive(Debug, Clone)]
pub struct NewPostFile {
    pub filename: String,
    pub original_name: String,
    pub mimetype: String,
    pub size: i64,
    pub path: String,
}

/// Fields to overwrite on update; `None` keeps the stored value
#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<Category>,
    pub tags: Option<Vec<String>>,
}

impl PostChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.category.is_none()
            && self.tags.is_none()
    }
}

/// Listing query: newest first, one page at a time
#[derive(Debug, Clone)]
pub struct PostFilter {
    pub category: Option<Category>,
    /// Case-insensitive substring over title and content
    pub search: Option<String>,
    /// Exact tag membership
    pub tag: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for PostFilter {
    fn default() -> Self {
        Self {
            category: None,
            search: None,
            tag: None,
            limit: 10,
            offset: 0,
        }
    }
}

/// Split a comma-separated tag string, trimming and dropping empties
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}
