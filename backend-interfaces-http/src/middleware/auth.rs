use axum::http::HeaderMap;
use tracing::warn;

use backend_application::AppState;
use backend_domain::Session;

/// Resolves the caller's session from the bearer token.
///
/// A missing or invalid token is not an error here: the use case decides
/// whether an anonymous caller is acceptable.
pub async fn resolve_session(state: &AppState, headers: &HeaderMap) -> Option<Session> {
    let token = extract_bearer(headers)?;
    match state.session_provider.resolve(&token).await {
        Ok(session) => session,
        Err(err) => {
            warn!("session lookup failed: {}", err);
            None
        }
    }
}

fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    let value = headers.get("Authorization")?.to_str().ok()?.trim();
    let prefix = "Bearer ";
    if !value.starts_with(prefix) {
        return None;
    }
    let token = value[prefix.len()..].trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_is_trimmed() {
        let mut headers = HeaderMap::new();
        headers.insert("Authorization", HeaderValue::from_static("Bearer  abc.def "));
        assert_eq!(extract_bearer(&headers).as_deref(), Some("abc.def"));
    }

    #[test]
    fn other_schemes_are_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert("Authorization", HeaderValue::from_static("Basic Zm9vOmJhcg=="));
        assert_eq!(extract_bearer(&headers), None);
        headers.insert("Authorization", HeaderValue::from_static("Bearer "));
        assert_eq!(extract_bearer(&headers), None);
    }
}
