use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use model::entities::user;
use sea_orm::EntityTrait;
use tracing::{debug, error, warn};

use crate::error::ApiError;
use crate::schemas::AppState;

/// Header carrying the id of the administrator performing the request.
/// It is set by the authentication layer in front of this service.
pub const ACTOR_HEADER: &str = "x-actor-id";

/// The acting administrator, resolved from [`ACTOR_HEADER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorId(pub i32);

#[async_trait]
impl FromRequestParts<AppState> for ActorId {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(ACTOR_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                warn!("Request without {} header", ACTOR_HEADER);
                ApiError::unauthorized(format!("Missing {} header", ACTOR_HEADER))
            })?;

        let actor_id: i32 = raw
            .trim()
            .parse()
            .map_err(|_| ApiError::unauthorized(format!("Invalid {} header", ACTOR_HEADER)))?;

        match user::Entity::find_by_id(actor_id).one(&state.db).await {
            Ok(Some(_)) => {
                debug!("Acting administrator {}", actor_id);
                Ok(ActorId(actor_id))
            }
            Ok(None) => {
                warn!("Unknown administrator {}", actor_id);
                Err(ApiError::unauthorized(format!("Unknown administrator {}", actor_id)))
            }
            Err(e) => {
                error!("Failed to look up administrator {}: {}", actor_id, e);
                Err(ledger::LedgerError::from(e).into())
            }
        }
    }
}
