use async_trait::async_trait;
use axum::extract::{Extension, FromRequest, RequestParts};
use axum::http::HeaderMap;
use uuid::Uuid;

use crate::api::DynAPI;
use crate::auth::Actor;
use crate::error::{unauthenticated_error, unexpected_error, Error};

/// Set by the gateway once the caller has been authenticated.
pub const USER_ID_HEADER: &str = "x-user-id";

fn identity(headers: &HeaderMap) -> Result<Uuid, Error> {
    headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| Uuid::parse_str(value.trim()).ok())
        .ok_or_else(unauthenticated_error)
}

/// Identity of a caller who may not have an account yet.
#[derive(Clone, Copy, Debug)]
pub struct Identity(pub Uuid);

#[async_trait]
impl<B> FromRequest<B> for Identity
where
    B: Send,
{
    type Rejection = Error;

    async fn from_request(req: &mut RequestParts<B>) -> Result<Self, Self::Rejection> {
        Ok(Identity(identity(req.headers())?))
    }
}

#[async_trait]
impl<B> FromRequest<B> for Actor
where
    B: Send,
{
    type Rejection = Error;

    async fn from_request(req: &mut RequestParts<B>) -> Result<Self, Self::Rejection> {
        let id = identity(req.headers())?;

        let Extension(api) = Extension::<DynAPI>::from_request(req)
            .await
            .map_err(|_| unexpected_error())?;

        api.authenticate(id).await
    }
}

#[test]
fn identity_test() {
    use axum::http::HeaderValue;

    let id = Uuid::new_v4();
    let mut headers = HeaderMap::new();

    assert_eq!(identity(&headers).unwrap_err(), unauthenticated_error());

    headers.insert(USER_ID_HEADER, HeaderValue::from_static("not-a-uuid"));
    assert_eq!(identity(&headers).unwrap_err(), unauthenticated_error());

    headers.insert(
        USER_ID_HEADER,
        HeaderValue::from_str(&id.to_string()).unwrap(),
    );
    assert_eq!(identity(&headers).unwrap(), id);
}
