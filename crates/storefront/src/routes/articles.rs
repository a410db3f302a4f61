//! Article route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::content::Article;
use crate::error::AppError;
use crate::filters;
use crate::models::Toast;
use crate::routes::forms::redirect_with_toast;
use crate::session_state::{self, FragmentRequest, PageContext};
use crate::state::AppState;

/// Number of related articles shown under an article.
const RECENT_ARTICLES_COUNT: usize = 3;

/// Article list filter.
#[derive(Debug, Deserialize)]
pub struct ArticleQuery {
    pub tag: Option<String>,
}

/// Article index template.
#[derive(Template, WebTemplate)]
#[template(path = "articles/index.html")]
pub struct ArticlesIndexTemplate {
    pub ctx: PageContext,
    pub articles: Vec<Article>,
    pub tags: Vec<String>,
    pub active_tag: Option<String>,
}

/// Article detail template.
#[derive(Template, WebTemplate)]
#[template(path = "articles/show.html")]
pub struct ArticleShowTemplate {
    pub ctx: PageContext,
    pub article: Article,
    pub recent: Vec<Article>,
    pub saved: bool,
}

/// Save button fragment.
#[derive(Template, WebTemplate)]
#[template(path = "partials/save_article.html")]
pub struct SaveArticleTemplate {
    pub slug: String,
    pub saved: bool,
}

/// Display published articles, newest first, optionally filtered by tag.
#[instrument(skip(state, ctx))]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ArticleQuery>,
    ctx: PageContext,
) -> impl IntoResponse {
    let content = state.content();
    let active_tag = query.tag.filter(|t| !t.trim().is_empty());
    let articles = match active_tag.as_deref() {
        Some(tag) => content.by_tag(tag).cloned().collect(),
        None => content.published().cloned().collect(),
    };

    ArticlesIndexTemplate {
        ctx,
        articles,
        tags: content.tags(),
        active_tag,
    }
}

/// Display a single article.
#[instrument(skip(state, session, ctx))]
pub async fn show(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    session: Session,
    ctx: PageContext,
) -> Result<ArticleShowTemplate, AppError> {
    let content = state.content();
    let article = content
        .article(&slug)
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("article {slug}")))?;

    Ok(ArticleShowTemplate {
        ctx,
        recent: content
            .recent(RECENT_ARTICLES_COUNT, Some(&slug))
            .into_iter()
            .cloned()
            .collect(),
        saved: session_state::saved_articles(&session).await.contains(&slug),
        article,
    })
}

/// Toggle an article in the visitor's saved list.
#[instrument(skip(state, session))]
pub async fn toggle_save(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    session: Session,
    FragmentRequest(fragment): FragmentRequest,
) -> Result<Response, AppError> {
    if state.content().article(&slug).is_none() {
        return Err(AppError::NotFound(format!("article {slug}")));
    }

    let saved = session_state::toggle_saved_article(&session, &slug).await?;
    if fragment {
        return Ok(SaveArticleTemplate { slug, saved }.into_response());
    }

    let message = if saved {
        "Article saved"
    } else {
        "Article removed from your saved list"
    };
    let back = format!("/articles/{slug}");
    Ok(redirect_with_toast(&session, Toast::success(message), &back).await)
}

