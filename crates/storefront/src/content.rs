//! Markdown health articles and static pages.
//!
//! Loaded once at startup from `content/articles` and `content/pages`. Each
//! file starts with YAML front matter; the body is rendered with GFM
//! extensions.
//!
//! # Product Shortcodes
//!
//! Articles can link products from the catalog:
//!
//! ```markdown
//! {{product "vitamin-d3-1000iu" label="Our vitamin D3"}}
//! ```

use chrono::NaiveDate;
use comrak::{Options, markdown_to_html};
use gray_matter::{Matter, ParsedEntity, engine::YAML};
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, LazyLock};

/// Words per minute used for the reading time estimate.
const WORDS_PER_MINUTE: usize = 200;

/// Metadata for static pages (about, privacy).
#[derive(Debug, Clone, Deserialize)]
pub struct PageMeta {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub updated_at: Option<NaiveDate>,
}

/// Article front matter.
#[derive(Debug, Clone, Deserialize)]
pub struct ArticleMeta {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    pub published_at: NaiveDate,
    #[serde(default)]
    pub updated_at: Option<NaiveDate>,
    #[serde(default)]
    pub hero_image: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub draft: bool,
}

#[derive(Debug, Clone)]
pub struct Page {
    pub slug: String,
    pub meta: PageMeta,
    pub content_html: String,
}

#[derive(Debug, Clone)]
pub struct Article {
    pub slug: String,
    pub meta: ArticleMeta,
    pub content_html: String,
    pub reading_time_minutes: u32,
}

impl Article {
    #[must_use]
    pub fn published_on(&self) -> String {
        self.meta.published_at.format("%d %B %Y").to_string()
    }
}

/// All content, held in memory.
#[derive(Debug, Clone, Default)]
pub struct ContentStore {
    pages: Arc<HashMap<String, Page>>,
    articles: Arc<Vec<Article>>,
}

impl ContentStore {
    /// Load all content from the filesystem.
    ///
    /// Missing directories yield an empty store; files that fail to parse are
    /// logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing content directory cannot be read.
    pub fn load(content_dir: &Path) -> Result<Self, ContentError> {
        let pages = load_dir(&content_dir.join("pages"), parse_page)?
            .into_iter()
            .map(|page| (page.slug.clone(), page))
            .collect();
        let mut articles = load_dir(&content_dir.join("articles"), parse_article)?;
        articles.sort_by(|a, b| {
            b.meta
                .published_at
                .cmp(&a.meta.published_at)
                .then_with(|| a.slug.cmp(&b.slug))
        });

        tracing::info!(articles = articles.len(), "Content loaded");
        Ok(Self {
            pages: Arc::new(pages),
            articles: Arc::new(articles),
        })
    }

    #[must_use]
    pub fn page(&self, slug: &str) -> Option<&Page> {
        self.pages.get(slug)
    }

    /// A published article by slug. Drafts are not served.
    #[must_use]
    pub fn article(&self, slug: &str) -> Option<&Article> {
        self.articles
            .iter()
            .find(|a| a.slug == slug && !a.meta.draft)
    }

    /// Published articles, newest first.
    pub fn published(&self) -> impl Iterator<Item = &Article> {
        self.articles.iter().filter(|a| !a.meta.draft)
    }

    /// Published articles carrying `tag` (case-insensitive).
    pub fn by_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Article> {
        let tag_lower = tag.to_lowercase();
        self.published()
            .filter(move |a| a.meta.tags.iter().any(|t| t.to_lowercase() == tag_lower))
    }

    /// Unique tags of published articles, sorted.
    #[must_use]
    pub fn tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self
            .published()
            .flat_map(|a| a.meta.tags.iter().cloned())
            .collect();
        tags.sort();
        tags.dedup();
        tags
    }

    /// Newest published articles, optionally excluding one slug.
    #[must_use]
    pub fn recent(&self, limit: usize, exclude_slug: Option<&str>) -> Vec<&Article> {
        self.published()
            .filter(|a| exclude_slug.is_none_or(|s| a.slug != s))
            .take(limit)
            .collect()
    }

    /// Published articles in the order `slugs` lists them.
    #[must_use]
    pub fn by_slugs(&self, slugs: &[String]) -> Vec<&Article> {
        slugs.iter().filter_map(|slug| self.article(slug)).collect()
    }

    #[cfg(test)]
    pub(crate) fn from_parts(pages: Vec<Page>, mut articles: Vec<Article>) -> Self {
        articles.sort_by(|a, b| b.meta.published_at.cmp(&a.meta.published_at));
        Self {
            pages: Arc::new(pages.into_iter().map(|p| (p.slug.clone(), p)).collect()),
            articles: Arc::new(articles),
        }
    }
}

fn load_dir<T>(
    dir: &Path,
    parse: fn(&str, &str) -> Result<T, ContentError>,
) -> Result<Vec<T>, ContentError> {
    let mut items = Vec::new();

    if !dir.exists() {
        tracing::warn!("Content directory does not exist: {:?}", dir);
        return Ok(items);
    }

    let entries = std::fs::read_dir(dir).map_err(|e| ContentError::Io(e.to_string()))?;

    for entry in entries.flatten() {
        let path = entry.path();
        if !path.extension().is_some_and(|ext| ext == "md") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let parsed = std::fs::read_to_string(&path)
            .map_err(|e| ContentError::Io(e.to_string()))
            .and_then(|source| parse(stem, &source));
        match parsed {
            Ok(item) => items.push(item),
            Err(e) => tracing::error!("Failed to load {:?}: {}", path, e),
        }
    }

    Ok(items)
}

fn parse_page(stem: &str, source: &str) -> Result<Page, ContentError> {
    let matter = Matter::<YAML>::new();
    let parsed: ParsedEntity<PageMeta> = matter
        .parse(source)
        .map_err(|e| ContentError::Parse(format!("Failed to parse frontmatter: {e}")))?;
    let meta = parsed
        .data
        .ok_or_else(|| ContentError::Parse("Missing frontmatter".to_string()))?;

    Ok(Page {
        slug: stem.to_string(),
        meta,
        content_html: render_markdown(&parsed.content),
    })
}

/// Parse an article. A `YYYY-MM-DD-` file name prefix is not part of the slug.
fn parse_article(stem: &str, source: &str) -> Result<Article, ContentError> {
    let slug = strip_date_prefix(stem).to_string();

    let matter = Matter::<YAML>::new();
    let parsed: ParsedEntity<ArticleMeta> = matter
        .parse(source)
        .map_err(|e| ContentError::Parse(format!("Failed to parse frontmatter: {e}")))?;
    let meta = parsed
        .data
        .ok_or_else(|| ContentError::Parse("Missing frontmatter".to_string()))?;

    Ok(Article {
        slug,
        meta,
        content_html: render_markdown(&parsed.content),
        reading_time_minutes: reading_time(&parsed.content),
    })
}

fn strip_date_prefix(stem: &str) -> &str {
    let bytes = stem.as_bytes();
    let dated = bytes.len() > 11
        && bytes.get(4) == Some(&b'-')
        && bytes.get(7) == Some(&b'-')
        && bytes.get(10) == Some(&b'-')
        && stem.get(..10).is_some_and(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").is_ok());
    if dated { stem.get(11..).unwrap_or(stem) } else { stem }
}

/// Minutes to read `text`, at least one.
fn reading_time(text: &str) -> u32 {
    let words = text.split_whitespace().count();
    u32::try_from(words.div_ceil(WORDS_PER_MINUTE))
        .unwrap_or(u32::MAX)
        .max(1)
}

/// Render markdown to HTML with GitHub Flavored Markdown support.
fn render_markdown(content: &str) -> String {
    let processed = process_shortcodes(content);

    let mut options = Options::default();
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.extension.header_ids = Some(String::new());
    options.extension.footnotes = true;

    // Articles are authored in-house and may embed HTML.
    options.render.r#unsafe = true;

    markdown_to_html(&processed, &options)
}

// =============================================================================
// Shortcode Processing
// =============================================================================

/// Matches `{{product "slug" ...attributes}}`.
static PRODUCT_SHORTCODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\{\{product\s+"([a-z0-9-]+)"([^}]*)\}\}"#).expect("Invalid regex")
});

/// Matches key="value" attributes.
static ATTR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(\w+)="([^"]*)""#).expect("Invalid regex"));

fn process_shortcodes(content: &str) -> String {
    PRODUCT_SHORTCODE_RE
        .replace_all(content, |caps: &regex::Captures| {
            let slug = &caps[1];
            let attrs = caps.get(2).map_or("", |m| m.as_str());
            let label = ATTR_RE
                .captures_iter(attrs)
                .find(|attr| &attr[1] == "label")
                .map_or_else(|| "View product".to_string(), |attr| attr[2].to_string());
            format!(
                r#"<a class="article-product" href="/products/{slug}">{}</a>"#,
                escape_html(&label)
            )
        })
        .into_owned()
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Content loading errors
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
}
