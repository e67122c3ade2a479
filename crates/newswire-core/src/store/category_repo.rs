use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::Database;
use crate::article::Category;
use crate::normalize::slugify;
use crate::{Error, Result};

/// Default topic list seeded for every tenant before its first ingest
pub const DEFAULT_TOPICS: &[&str] = &[
    "General",
    "Business",
    "Technology",
    "Sports",
    "Health",
    "Science",
    "Entertainment",
];

/// Repository for the tenant-scoped category taxonomy
pub struct CategoryRepository<'a> {
    db: &'a Database,
}

#[derive(FromRow)]
struct CategoryRow {
    id: String,
    tenant_id: String,
    name: String,
    slug: String,
    created_at: DateTime<Utc>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Category {
            id: Uuid::parse_str(&row.id).unwrap_or_default(),
            tenant_id: row.tenant_id,
            name: row.name,
            slug: row.slug,
            created_at: row.created_at,
        }
    }
}

impl<'a> CategoryRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Look up a category by `(tenant_id, slug)`, creating it if absent.
    /// Safe to call repeatedly; the slug is derived from the name.
    pub async fn find_or_create(&self, tenant_id: &str, name: &str) -> Result<Category> {
        let slug = slugify(name);

        sqlx::query(
            r#"
            INSERT OR IGNORE INTO categories (id, tenant_id, name, slug, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(tenant_id)
        .bind(name)
        .bind(&slug)
        .bind(Utc::now())
        .execute(self.db.pool())
        .await?;

        self.find_by_slug(tenant_id, &slug)
            .await?
            .ok_or_else(|| Error::CategoryNotFound(slug))
    }

    /// Find a category by its tenant-scoped slug
    pub async fn find_by_slug(&self, tenant_id: &str, slug: &str) -> Result<Option<Category>> {
        let row: Option<CategoryRow> = sqlx::query_as(
            r#"
            SELECT id, tenant_id, name, slug, created_at
            FROM categories
            WHERE tenant_id = ? AND slug = ?
            "#,
        )
        .bind(tenant_id)
        .bind(slug)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(Category::from))
    }

    /// List a tenant's categories ordered by name
    pub async fn list(&self, tenant_id: &str) -> Result<Vec<Category>> {
        let rows: Vec<CategoryRow> = sqlx::query_as(
            r#"
            SELECT id, tenant_id, name, slug, created_at
            FROM categories
            WHERE tenant_id = ?
            ORDER BY name ASC
            "#,
        )
        .bind(tenant_id)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.into_iter().map(Category::from).collect())
    }

    /// Ensure the fixed default topics exist for a tenant. Idempotent.
    pub async fn seed_defaults(&self, tenant_id: &str) -> Result<()> {
        for name in DEFAULT_TOPICS {
            self.find_or_create(tenant_id, name).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_find_or_create_never_duplicates() {
        let db = Database::new_in_memory().await.unwrap();
        let repo = CategoryRepository::new(&db);

        let first = repo.find_or_create("t1", "Technology").await.unwrap();
        let second = repo.find_or_create("t1", "Technology").await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.slug, "technology");
        assert_eq!(repo.list("t1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_categories_are_tenant_scoped() {
        let db = Database::new_in_memory().await.unwrap();
        let repo = CategoryRepository::new(&db);

        let a = repo.find_or_create("t1", "Sports").await.unwrap();
        let b = repo.find_or_create("t2", "Sports").await.unwrap();

        assert_ne!(a.id, b.id);
        assert_eq!(repo.list("t1").await.unwrap().len(), 1);
        assert_eq!(repo.list("t2").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_seed_defaults_idempotent() {
        let db = Database::new_in_memory().await.unwrap();
        let repo = CategoryRepository::new(&db);

        repo.seed_defaults("t1").await.unwrap();
        repo.seed_defaults("t1").await.unwrap();

        let categories = repo.list("t1").await.unwrap();
        assert_eq!(categories.len(), DEFAULT_TOPICS.len());
        assert!(categories.iter().any(|c| c.slug == "general"));
    }
}
