use actix_web::{HttpRequest, HttpResponse, Responder, get, web};
use tracing::info;

use super::RefreshQuery;
use crate::state::AppState;

/// Status of every target as JSON, refreshing first.
/// With `?wait=true` the response waits for the probes to finish.
#[get("/status")]
pub async fn status_route(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<RefreshQuery>,
) -> impl Responder {
    info!(peer = ?req.peer_addr(), wait = query.wait(), "status request");

    let rows = state.statuses(query.wait()).await;
    HttpResponse::Ok().json(rows)
}
