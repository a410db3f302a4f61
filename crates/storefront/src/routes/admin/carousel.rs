//! Home page carousel management.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, Path, State},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use apothecary_core::SlideId;

use super::{MultipartFields, store_image, upload_error_message};
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::models::{CarouselSlide, MoveDirection, SlideInput, Toast};
use crate::routes::forms::redirect_with_toast;
use crate::session_state::PageContext;
use crate::state::AppState;

const CAROUSEL_PATH: &str = "/admin/carousel";

/// Slide list with create and inline edit forms.
#[derive(Template, WebTemplate)]
#[template(path = "admin/carousel.html")]
pub struct CarouselTemplate {
    pub ctx: PageContext,
    pub slides: Vec<CarouselSlide>,
}

pub async fn index(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    ctx: PageContext,
) -> impl IntoResponse {
    CarouselTemplate {
        ctx,
        slides: state.carousel().list().await,
    }
}

/// Build a slide from the form. A new upload wins over the `image_url`
/// field, which falls back to `current_image`.
async fn read_input(
    state: &AppState,
    form: MultipartFields,
    current_image: Option<&str>,
) -> Result<SlideInput, String> {
    let title = form.text("title").ok_or("Title is required")?;

    let mut input = SlideInput {
        title,
        subtitle: form.text("subtitle"),
        image_url: form
            .text("image_url")
            .or_else(|| current_image.map(str::to_string))
            .unwrap_or_default(),
        link_url: form.text("link_url"),
        button_text: form.text("button_text"),
        is_active: form.flag("is_active"),
    };

    if let Some(image) = form.image {
        input.image_url = store_image(state, image)
            .await
            .map_err(|e| upload_error_message(&e))?;
    }
    if input.image_url.is_empty() {
        return Err("An image is required".to_string());
    }
    if let Some(link) = input.link_url.as_deref()
        && !(link.starts_with('/') || link.starts_with("https://"))
    {
        return Err("Links must be a site path or an https URL".to_string());
    }

    Ok(input)
}

/// Create a slide at the end of the carousel.
#[instrument(skip_all, fields(admin_id = %admin.user.id))]
pub async fn create(
    admin: RequireAdmin,
    State(state): State<AppState>,
    session: Session,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let form = MultipartFields::read(multipart).await?;
    let toast = match read_input(&state, form, None).await {
        Ok(input) => match state.carousel().create(&input).await {
            Some(slide) => {
                tracing::info!(slide_id = %slide.id, "Slide created");
                Toast::success(format!("Added slide \"{}\"", slide.title))
            }
            None => Toast::error("The slide could not be saved"),
        },
        Err(message) => Toast::error(message),
    };
    Ok(redirect_with_toast(&session, toast, CAROUSEL_PATH).await)
}

/// Update a slide. Without a new upload the current image is kept.
#[instrument(skip_all, fields(admin_id = %admin.user.id, slide_id = %id))]
pub async fn update(
    admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<SlideId>,
    session: Session,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let carousel = state.carousel();
    let slide = carousel
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("slide {id}")))?;

    let form = MultipartFields::read(multipart).await?;
    let toast = match read_input(&state, form, Some(&slide.image_url)).await {
        Ok(input) => match carousel.update(id, &input).await {
            Some(slide) => Toast::success(format!("Saved slide \"{}\"", slide.title)),
            None => Toast::error("The slide could not be saved"),
        },
        Err(message) => Toast::error(message),
    };
    Ok(redirect_with_toast(&session, toast, CAROUSEL_PATH).await)
}

/// Show or hide a slide on the home page.
#[instrument(skip_all, fields(admin_id = %admin.user.id, slide_id = %id))]
pub async fn toggle(
    admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<SlideId>,
    session: Session,
) -> Result<Response, AppError> {
    let carousel = state.carousel();
    let slide = carousel
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("slide {id}")))?;

    let toast = if carousel.set_active(id, !slide.is_active).await {
        Toast::success(if slide.is_active {
            "Slide hidden"
        } else {
            "Slide shown"
        })
    } else {
        Toast::error("The slide could not be updated")
    };
    Ok(redirect_with_toast(&session, toast, CAROUSEL_PATH).await)
}

async fn move_slide(state: &AppState, id: SlideId, direction: MoveDirection) -> Response {
    // Moving past either end is a no-op, not an error
    if !state.carousel().move_slide(id, direction).await {
        tracing::debug!(slide_id = %id, ?direction, "Slide not moved");
    }
    Redirect::to(CAROUSEL_PATH).into_response()
}

#[instrument(skip_all, fields(slide_id = %id))]
pub async fn move_up(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<SlideId>,
) -> Response {
    move_slide(&state, id, MoveDirection::Up).await
}

#[instrument(skip_all, fields(slide_id = %id))]
pub async fn move_down(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<SlideId>,
) -> Response {
    move_slide(&state, id, MoveDirection::Down).await
}

#[instrument(skip_all, fields(admin_id = %admin.user.id, slide_id = %id))]
pub async fn delete(
    admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<SlideId>,
    session: Session,
) -> Response {
    let toast = if state.carousel().delete(id).await {
        tracing::info!("Slide deleted");
        Toast::success("Slide deleted")
    } else {
        Toast::error("The slide could not be deleted")
    };
    redirect_with_toast(&session, toast, CAROUSEL_PATH).await
}
