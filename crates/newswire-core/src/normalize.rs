//! Raw item normalization into the canonical article shape.
//!
//! Strips HTML, mines a thumbnail from inline description markup, derives
//! the slug and excerpt, and resolves the publish timestamp.

use chrono::{DateTime, Utc};

use crate::article::{NewArticle, PRIORITY_WITHOUT_IMAGE, PRIORITY_WITH_IMAGE};
use crate::ingest::RawItem;

/// Slugs are capped to keep URLs bounded
pub const SLUG_MAX_LEN: usize = 100;
/// Excerpts are a bounded prefix of the cleaned content
pub const EXCERPT_MAX_LEN: usize = 240;

/// Convert a raw item into a storable article.
///
/// `category` is the resolved topic slug: either source-supplied or the
/// classifier's verdict, decided by the caller.
pub fn normalize(
    raw: &RawItem,
    source_id: &str,
    tenant_id: &str,
    country: &str,
    category: &str,
) -> NewArticle {
    let body_html = raw
        .content
        .as_deref()
        .or(raw.description.as_deref())
        .unwrap_or("");

    let content = strip_html(body_html);
    let content = if content.is_empty() { None } else { Some(content) };

    let image_url = raw
        .image_url
        .clone()
        .or_else(|| raw.description.as_deref().and_then(extract_first_image_url));

    let priority = if image_url.is_some() {
        PRIORITY_WITH_IMAGE
    } else {
        PRIORITY_WITHOUT_IMAGE
    };

    NewArticle {
        tenant_id: tenant_id.to_string(),
        title: raw.title.trim().to_string(),
        slug: slugify(&raw.title),
        excerpt: content.as_deref().map(excerpt),
        content,
        image_url,
        author: raw.author.clone(),
        source_name: raw.source_name.clone(),
        source_id: source_id.to_string(),
        url: raw.url.clone(),
        country: country.to_string(),
        category: category.to_string(),
        published_at: parse_published(raw.published_at.as_deref()),
        priority,
    }
}

/// Derive a URL-safe slug from a title: lowercase, runs of
/// non-alphanumerics collapsed to one hyphen, edges trimmed, bounded length
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }

    if slug.len() > SLUG_MAX_LEN {
        slug.truncate(SLUG_MAX_LEN);
        while slug.ends_with('-') {
            slug.pop();
        }
    }

    slug
}

/// Bounded prefix of the content, cut at a word boundary where one exists
pub fn excerpt(content: &str) -> String {
    let collapsed = content.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= EXCERPT_MAX_LEN {
        return collapsed;
    }

    let mut cut = 0;
    for (count, (idx, _)) in collapsed.char_indices().enumerate() {
        if count == EXCERPT_MAX_LEN {
            cut = idx;
            break;
        }
    }

    let prefix = &collapsed[..cut];
    let trimmed = match prefix.rfind(' ') {
        Some(space) if space > 0 => &prefix[..space],
        _ => prefix,
    };

    format!("{}…", trimmed)
}

/// Convert HTML content to plain text
pub fn strip_html(html: &str) -> String {
    let text = html2text::from_read(html.as_bytes(), 80)
        .unwrap_or_else(|_| html.to_string());
    text.trim().to_string()
}

/// Pull the first `<img src>` out of inline HTML, skipping obvious
/// tracking pixels
pub fn extract_first_image_url(html: &str) -> Option<String> {
    let html_lower = html.to_lowercase();

    let img_start = html_lower.find("<img")?;
    let remaining = html.get(img_start..)?;

    let src_start = remaining.to_lowercase().find("src=")?;
    let src_remaining = remaining.get(src_start + 4..)?;

    let quote_char = src_remaining.chars().next()?;
    if quote_char != '"' && quote_char != '\'' {
        return None;
    }

    let url_end = src_remaining[1..].find(quote_char)?;
    let url = &src_remaining[1..1 + url_end];

    if url.contains("1x1") || url.contains("pixel") || url.contains("tracking") {
        return None;
    }

    Some(url.to_string())
}

/// Parse a source publish-date string; absent or unparsable dates fall
/// back to the ingestion time
pub fn parse_published(raw: Option<&str>) -> DateTime<Utc> {
    let Some(raw) = raw else {
        return Utc::now();
    };

    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.with_timezone(&Utc);
    }

    tracing::debug!("Unparsable publish date: {}", raw);
    Utc::now()
}
