use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Priority hint for articles carrying an image
pub const PRIORITY_WITH_IMAGE: i32 = 1;
/// Priority hint for articles without one
pub const PRIORITY_WITHOUT_IMAGE: i32 = 0;

/// The canonical, tenant-scoped article record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: Uuid,
    pub tenant_id: String,
    pub title: String,
    pub slug: String,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub image_url: Option<String>,
    pub author: Option<String>,
    pub source_name: String,
    pub source_id: String,
    pub url: String,
    pub country: String,
    pub category: String,
    pub published_at: DateTime<Utc>,
    pub priority: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data required to store an article; identity within a tenant is
/// title-or-url, enforced by the upsert
#[derive(Debug, Clone, PartialEq)]
pub struct NewArticle {
    pub tenant_id: String,
    pub title: String,
    pub slug: String,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub image_url: Option<String>,
    pub author: Option<String>,
    pub source_name: String,
    pub source_id: String,
    pub url: String,
    pub country: String,
    pub category: String,
    pub published_at: DateTime<Utc>,
    pub priority: i32,
}

/// A tenant-scoped taxonomy entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub tenant_id: String,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
}

impl Article {
    pub fn has_image(&self) -> bool {
        self.image_url.is_some()
    }
}
