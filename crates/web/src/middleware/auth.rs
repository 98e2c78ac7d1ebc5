//! Authentication extractors.
//!
//! Provides extractors for requiring a signed-in identity in route handlers.

use axum::{
    extract::{FromRequestParts, OriginalUri},
    http::{StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};
use tower_sessions::Session;

use crate::models::{CurrentIdentity, session_keys};

/// Page that unauthenticated page requests are sent to.
pub const SIGN_IN_PATH: &str = "/sign-in";

/// Path prefix of resource endpoints that answer 401 instead of redirecting.
const RESOURCE_PREFIX: &str = "/resources/";

/// `302 Found` to a local path.
///
/// Every redirect the site issues, after a successful form post or to the
/// sign-in page, uses this status.
pub fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

/// Full request path. Nested routers only see the part after their prefix.
fn request_path(parts: &Parts) -> &str {
    parts
        .extensions
        .get::<OriginalUri>()
        .map_or_else(|| parts.uri.path(), |uri| uri.0.path())
}

/// Resource requests are redirected only when a browser navigates to them
/// (a plain form post); script calls get a bare 401.
fn wants_redirect(parts: &Parts) -> bool {
    if !request_path(parts).starts_with(RESOURCE_PREFIX) {
        return true;
    }
    parts
        .headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|accept| accept.contains("text/html"))
}

/// Extractor that requires a signed-in identity.
///
/// Page requests and form posts without one are redirected to the sign-in
/// page; scripted resource requests get `401 Unauthorized`.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireIdentity(identity): RequireIdentity,
/// ) -> impl IntoResponse {
///     format!("Signed in as {}", identity.email)
/// }
/// ```
pub struct RequireIdentity(pub CurrentIdentity);

/// Error returned when authentication is required but nobody is signed in.
#[derive(Debug)]
pub enum AuthRejection {
    /// Redirect to sign-in page (for HTML requests).
    RedirectToSignIn,
    /// Unauthorized response (for resource requests).
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToSignIn => found(SIGN_IN_PATH),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireIdentity
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let redirect = wants_redirect(parts);
        let rejection = || {
            if redirect {
                AuthRejection::RedirectToSignIn
            } else {
                AuthRejection::Unauthorized
            }
        };

        // Get the session from extensions (set by SessionManagerLayer)
        let Some(session) = parts.extensions.get::<Session>() else {
            return Err(rejection());
        };

        let identity: CurrentIdentity = session
            .get(session_keys::CURRENT_IDENTITY)
            .await
            .ok()
            .flatten()
            .ok_or_else(rejection)?;

        Ok(Self(identity))
    }
}

/// Extractor that optionally gets the current identity.
///
/// Unlike `RequireIdentity`, this does not reject the request if nobody is signed in.
pub struct OptionalIdentity(pub Option<CurrentIdentity>);

impl<S> FromRequestParts<S> for OptionalIdentity
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let identity = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CurrentIdentity>(session_keys::CURRENT_IDENTITY)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(identity))
    }
}

/// Store the signed-in identity in the session.
///
/// Cycles the session id to prevent fixation.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_identity(
    session: &Session,
    identity: &CurrentIdentity,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session
        .insert(session_keys::CURRENT_IDENTITY, identity)
        .await
}

/// Clear the signed-in identity from the session (sign out).
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn clear_current_identity(
    session: &Session,
) -> Result<(), tower_sessions::session::Error> {
    session
        .remove::<CurrentIdentity>(session_keys::CURRENT_IDENTITY)
        .await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(path: &str, accept: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri(path);
        if let Some(accept) = accept {
            builder = builder.header(header::ACCEPT, accept);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_pages_redirect() {
        assert!(wants_redirect(&parts("/", None)));
        assert!(wants_redirect(&parts("/exchanges/current", Some("*/*"))));
    }

    #[test]
    fn test_scripted_resources_get_401() {
        assert!(!wants_redirect(&parts("/resources/image-upload", None)));
        assert!(!wants_redirect(&parts("/resources/image-upload", Some("*/*"))));
    }

    #[test]
    fn test_resource_form_posts_redirect() {
        assert!(wants_redirect(&parts(
            "/resources/profile-editor",
            Some("text/html,application/xhtml+xml;q=0.9,*/*;q=0.8")
        )));
    }

    #[test]
    fn test_nested_resource_path_uses_original_uri() {
        // Inside `nest("/resources", ..)` the handler sees only the suffix.
        let mut p = parts("/image-upload", None);
        p.extensions
            .insert(OriginalUri("/resources/image-upload".parse().unwrap()));
        assert!(!wants_redirect(&p));

        let mut p = parts("/join", None);
        p.extensions
            .insert(OriginalUri("/exchanges/abc/join".parse().unwrap()));
        assert!(wants_redirect(&p));
    }

    #[test]
    fn test_redirect_is_302_to_sign_in() {
        let response = AuthRejection::RedirectToSignIn.into_response();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], SIGN_IN_PATH);

        let response = AuthRejection::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_missing_session_rejects() {
        let mut p = parts("/resources/image-upload", None);
        let result = RequireIdentity::from_request_parts(&mut p, &()).await;
        assert!(matches!(result, Err(AuthRejection::Unauthorized)));

        let mut p = parts("/", None);
        let result = RequireIdentity::from_request_parts(&mut p, &()).await;
        assert!(matches!(result, Err(AuthRejection::RedirectToSignIn)));
    }
}
