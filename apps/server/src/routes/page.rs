use actix_web::{HttpRequest, HttpResponse, get, http::header::ContentType, web};
use tracing::info;

use super::RefreshQuery;
use crate::error::AppError;
use crate::state::AppState;

/// Dashboard page
#[get("/")]
pub async fn index_route(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<RefreshQuery>,
) -> Result<HttpResponse, AppError> {
    info!(peer = ?req.peer_addr(), "page request");

    let rows = state.statuses(query.wait()).await;
    let html = state.render(&rows)?;

    Ok(HttpResponse::Ok().content_type(ContentType::html()).body(html))
}
