use chrono::{DateTime, Utc};
use sqlx::{FromRow, Sqlite, Transaction};
use uuid::Uuid;

use super::Database;
use crate::article::{Article, NewArticle};
use crate::Result;

/// What the upsert did with one article
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// Read-path filter for the storefront collaborator
#[derive(Debug, Clone, Default)]
pub struct ArticleFilter {
    pub country: Option<String>,
    pub category: Option<String>,
    pub source_id: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Repository for article persistence and dedup
pub struct ArticleRepository<'a> {
    db: &'a Database,
}

#[derive(FromRow)]
struct ArticleRow {
    id: String,
    tenant_id: String,
    title: String,
    slug: String,
    content: Option<String>,
    excerpt: Option<String>,
    image_url: Option<String>,
    author: Option<String>,
    source_name: String,
    source_id: String,
    url: String,
    country: String,
    category: String,
    published_at: DateTime<Utc>,
    priority: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ArticleRow> for Article {
    fn from(row: ArticleRow) -> Self {
        Article {
            id: Uuid::parse_str(&row.id).unwrap_or_default(),
            tenant_id: row.tenant_id,
            title: row.title,
            slug: row.slug,
            content: row.content,
            excerpt: row.excerpt,
            image_url: row.image_url,
            author: row.author,
            source_name: row.source_name,
            source_id: row.source_id,
            url: row.url,
            country: row.country,
            category: row.category,
            published_at: row.published_at,
            priority: row.priority,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT id, tenant_id, title, slug, content, excerpt, image_url, author,
           source_name, source_id, url, country, category, published_at,
           priority, created_at, updated_at
    FROM articles
"#;

impl<'a> ArticleRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Store one article idempotently.
    ///
    /// Identity within a tenant is title-or-url: an existing row matching
    /// either key is overwritten in place, otherwise a new row is
    /// inserted. Re-running the same input changes nothing but
    /// `updated_at`.
    pub async fn upsert(&self, article: &NewArticle) -> Result<UpsertOutcome> {
        let mut tx = self.db.pool().begin().await?;
        let outcome = Self::upsert_in(&mut tx, article).await?;
        tx.commit().await?;
        Ok(outcome)
    }

    /// Store a fetch unit's articles as one grouped operation.
    ///
    /// Semantics are identical to upserting one at a time; the
    /// transaction only bounds round-trips.
    pub async fn upsert_batch(&self, articles: &[NewArticle]) -> Result<(u32, u32)> {
        let mut inserted = 0;
        let mut updated = 0;

        let mut tx = self.db.pool().begin().await?;
        for article in articles {
            match Self::upsert_in(&mut tx, article).await? {
                UpsertOutcome::Inserted => inserted += 1,
                UpsertOutcome::Updated => updated += 1,
            }
        }
        tx.commit().await?;

        Ok((inserted, updated))
    }

    async fn upsert_in(
        tx: &mut Transaction<'_, Sqlite>,
        article: &NewArticle,
    ) -> Result<UpsertOutcome> {
        let existing: Option<(String,)> = sqlx::query_as(
            r#"
            SELECT id FROM articles
            WHERE tenant_id = ? AND (title = ? OR url = ?)
            LIMIT 1
            "#,
        )
        .bind(&article.tenant_id)
        .bind(&article.title)
        .bind(&article.url)
        .fetch_optional(&mut **tx)
        .await?;

        let now = Utc::now();

        match existing {
            Some((id,)) => {
                sqlx::query(
                    r#"
                    UPDATE articles
                    SET title = ?,
                        slug = ?,
                        content = ?,
                        excerpt = ?,
                        image_url = ?,
                        author = ?,
                        source_name = ?,
                        source_id = ?,
                        url = ?,
                        country = ?,
                        category = ?,
                        published_at = ?,
                        priority = ?,
                        updated_at = ?
                    WHERE id = ?
                    "#,
                )
                .bind(&article.title)
                .bind(&article.slug)
                .bind(&article.content)
                .bind(&article.excerpt)
                .bind(&article.image_url)
                .bind(&article.author)
                .bind(&article.source_name)
                .bind(&article.source_id)
                .bind(&article.url)
                .bind(&article.country)
                .bind(&article.category)
                .bind(article.published_at)
                .bind(article.priority)
                .bind(now)
                .bind(&id)
                .execute(&mut **tx)
                .await?;

                Ok(UpsertOutcome::Updated)
            }
            None => {
                let id = Uuid::new_v4();
                sqlx::query(
                    r#"
                    INSERT INTO articles
                    (id, tenant_id, title, slug, content, excerpt, image_url, author,
                     source_name, source_id, url, country, category, published_at,
                     priority, created_at, updated_at)
                    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(id.to_string())
                .bind(&article.tenant_id)
                .bind(&article.title)
                .bind(&article.slug)
                .bind(&article.content)
                .bind(&article.excerpt)
                .bind(&article.image_url)
                .bind(&article.author)
                .bind(&article.source_name)
                .bind(&article.source_id)
                .bind(&article.url)
                .bind(&article.country)
                .bind(&article.category)
                .bind(article.published_at)
                .bind(article.priority)
                .bind(now)
                .bind(now)
                .execute(&mut **tx)
                .await?;

                Ok(UpsertOutcome::Inserted)
            }
        }
    }

    /// Find an article by the tenant-scoped title key
    pub async fn find_by_title(&self, tenant_id: &str, title: &str) -> Result<Option<Article>> {
        let sql = format!("{} WHERE tenant_id = ? AND title = ?", SELECT_COLUMNS);
        let row: Option<ArticleRow> = sqlx::query_as(&sql)
            .bind(tenant_id)
            .bind(title)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(row.map(Article::from))
    }

    /// Find an article by the tenant-scoped url key
    pub async fn find_by_url(&self, tenant_id: &str, url: &str) -> Result<Option<Article>> {
        let sql = format!("{} WHERE tenant_id = ? AND url = ?", SELECT_COLUMNS);
        let row: Option<ArticleRow> = sqlx::query_as(&sql)
            .bind(tenant_id)
            .bind(url)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(row.map(Article::from))
    }

    /// List a tenant's articles, newest first, with optional filters.
    /// This is the query shape the storefront read API consumes.
    pub async fn list(&self, tenant_id: &str, filter: &ArticleFilter) -> Result<Vec<Article>> {
        let sql = format!(
            r#"{}
            WHERE tenant_id = ?
              AND (? IS NULL OR country = ?)
              AND (? IS NULL OR category = ?)
              AND (? IS NULL OR source_id = ?)
            ORDER BY published_at DESC
            LIMIT ? OFFSET ?
            "#,
            SELECT_COLUMNS
        );

        let rows: Vec<ArticleRow> = sqlx::query_as(&sql)
            .bind(tenant_id)
            .bind(&filter.country)
            .bind(&filter.country)
            .bind(&filter.category)
            .bind(&filter.category)
            .bind(&filter.source_id)
            .bind(&filter.source_id)
            .bind(filter.limit.unwrap_or(50))
            .bind(filter.offset.unwrap_or(0))
            .fetch_all(self.db.pool())
            .await?;

        Ok(rows.into_iter().map(Article::from).collect())
    }

    /// Count all articles owned by a tenant
    pub async fn count_for_tenant(&self, tenant_id: &str) -> Result<u32> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM articles WHERE tenant_id = ?")
            .bind(tenant_id)
            .fetch_one(self.db.pool())
            .await?;

        Ok(count.0 as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_article(tenant: &str, title: &str, url: &str) -> NewArticle {
        NewArticle {
            tenant_id: tenant.to_string(),
            title: title.to_string(),
            slug: crate::normalize::slugify(title),
            content: Some("Body text".to_string()),
            excerpt: Some("Body text".to_string()),
            image_url: Some("https://x/img.jpg".to_string()),
            author: None,
            source_name: "Test Feed".to_string(),
            source_id: "test-feed".to_string(),
            url: url.to_string(),
            country: "us".to_string(),
            category: "general".to_string(),
            published_at: Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap(),
            priority: 1,
        }
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let db = Database::new_in_memory().await.unwrap();
        let repo = ArticleRepository::new(&db);
        let article = sample_article("t1", "City opens new park", "https://x/1");

        assert_eq!(repo.upsert(&article).await.unwrap(), UpsertOutcome::Inserted);
        assert_eq!(repo.upsert(&article).await.unwrap(), UpsertOutcome::Updated);
        assert_eq!(repo.count_for_tenant("t1").await.unwrap(), 1);

        let stored = repo
            .find_by_title("t1", "City opens new park")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.slug, "city-opens-new-park");
        assert_eq!(stored.content.as_deref(), Some("Body text"));
    }

    #[tokio::test]
    async fn test_upsert_matches_on_url_when_title_changes() {
        let db = Database::new_in_memory().await.unwrap();
        let repo = ArticleRepository::new(&db);

        let first = sample_article("t1", "Original headline", "https://x/1");
        repo.upsert(&first).await.unwrap();

        let mut retitled = sample_article("t1", "Updated headline", "https://x/1");
        retitled.slug = crate::normalize::slugify(&retitled.title);
        assert_eq!(
            repo.upsert(&retitled).await.unwrap(),
            UpsertOutcome::Updated
        );

        assert_eq!(repo.count_for_tenant("t1").await.unwrap(), 1);
        let stored = repo.find_by_url("t1", "https://x/1").await.unwrap().unwrap();
        assert_eq!(stored.title, "Updated headline");
    }

    #[tokio::test]
    async fn test_tenant_isolation() {
        let db = Database::new_in_memory().await.unwrap();
        let repo = ArticleRepository::new(&db);

        let a = sample_article("t1", "Shared headline", "https://x/shared");
        let b = sample_article("t2", "Shared headline", "https://x/shared");

        assert_eq!(repo.upsert(&a).await.unwrap(), UpsertOutcome::Inserted);
        assert_eq!(repo.upsert(&b).await.unwrap(), UpsertOutcome::Inserted);

        assert_eq!(repo.count_for_tenant("t1").await.unwrap(), 1);
        assert_eq!(repo.count_for_tenant("t2").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_batch_reports_inserts_and_updates() {
        let db = Database::new_in_memory().await.unwrap();
        let repo = ArticleRepository::new(&db);

        let batch = vec![
            sample_article("t1", "First", "https://x/1"),
            sample_article("t1", "Second", "https://x/2"),
        ];

        assert_eq!(repo.upsert_batch(&batch).await.unwrap(), (2, 0));
        assert_eq!(repo.upsert_batch(&batch).await.unwrap(), (0, 2));
        assert_eq!(repo.count_for_tenant("t1").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_list_filters_and_orders() {
        let db = Database::new_in_memory().await.unwrap();
        let repo = ArticleRepository::new(&db);

        let mut older = sample_article("t1", "Older story", "https://x/old");
        older.published_at = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
        older.category = "sports".to_string();
        let mut newer = sample_article("t1", "Newer story", "https://x/new");
        newer.published_at = Utc.with_ymd_and_hms(2024, 1, 2, 8, 0, 0).unwrap();

        repo.upsert(&older).await.unwrap();
        repo.upsert(&newer).await.unwrap();

        let all = repo.list("t1", &ArticleFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].title, "Newer story");

        let sports = repo
            .list(
                "t1",
                &ArticleFilter {
                    category: Some("sports".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(sports.len(), 1);
        assert_eq!(sports[0].title, "Older story");
    }
}
