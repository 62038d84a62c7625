use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Instance owner on whose behalf the request runs.
#[derive(Debug, Clone, Copy)]
pub struct UserId(pub Uuid);

/// Admits only calls relayed by the trusted gateway.
///
/// The gateway presents the shared `CONTROL_PLANE_API_KEY` as a bearer
/// token and names the already-authenticated owner in `X-User-Id`. Every
/// ownership check downstream trusts that id.
pub async fn auth_middleware(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    match caller(&state.config.control_plane_api_key, req.headers()) {
        Ok(user_id) => {
            req.extensions_mut().insert(user_id);
            next.run(req).await
        }
        Err(e) => e.into_response(),
    }
}

fn caller(api_key: &str, headers: &HeaderMap) -> Result<UserId, ApiError> {
    let presented = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized)?;
    if presented != api_key {
        return Err(ApiError::Unauthorized);
    }

    headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| Uuid::parse_str(s.trim()).ok())
        .map(UserId)
        .ok_or_else(|| ApiError::BadRequest("missing or invalid X-User-Id header".into()))
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn gateway_key_and_owner_id_admit_the_call() {
        let owner = Uuid::new_v4();
        let id = caller(
            "k",
            &headers(&[("authorization", "Bearer k"), ("x-user-id", &owner.to_string())]),
        )
        .unwrap();
        assert_eq!(id.0, owner);
    }

    #[test]
    fn key_is_checked_before_owner_id() {
        let err = caller("k", &headers(&[("authorization", "Bearer other")])).unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));

        let err = caller("k", &headers(&[("authorization", "k")])).unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));

        let err = caller(
            "k",
            &headers(&[("authorization", "Bearer k"), ("x-user-id", "42")]),
        )
        .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }
}
