//! Synonym Lookup Endpoint
//!
//! `GET /synonym/{word}` resolves a word through the cache tiers and the
//! graph. The word is normalized before lookup, so `/synonym/HAPPY%20` and
//! `/synonym/happy` share one cache entry.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use thesaurus_core::WordKey;
use thesaurus_storage::SynonymResolver;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::types::SynonymResponse;

/// GET /synonym/{word} - Resolve the synonym cluster of a word
pub async fn get_synonyms(
    State(resolver): State<Arc<SynonymResolver>>,
    Path(word): Path<String>,
) -> ApiResult<Json<SynonymResponse>> {
    let resolution = resolver
        .resolve(&word)
        .await?
        .ok_or_else(|| ApiError::word_not_found(WordKey::normalize(&word)))?;

    Ok(Json(SynonymResponse::from(resolution)))
}

/// Create the synonym lookup router.
pub fn create_router() -> Router<AppState> {
    Router::new().route("/synonym/:word", get(get_synonyms))
}
