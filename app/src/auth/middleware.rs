use std::sync::{Arc, LazyLock};
use std::{future::Future, pin::Pin};

use axum::body::Body;
use axum::http::{Request, Response, header::AUTHORIZATION};
use tower_http::auth::{AsyncAuthorizeRequest, AsyncRequireAuthorizationLayer};

use crate::auth::provider::{
    HttpIdentityProvider, Identity, IdentityProvider, StaticIdentityProvider,
};
use crate::common::error::ApiError;
use crate::config;
use crate::config::auth::AuthConfig;

#[derive(Clone)]
pub struct IdentityAuthLayer {
    provider: Arc<dyn IdentityProvider>,
    auth_config: &'static AuthConfig,
}

impl IdentityAuthLayer {
    pub fn new(provider: Arc<dyn IdentityProvider>, auth_config: &'static AuthConfig) -> Self {
        IdentityAuthLayer {
            provider,
            auth_config,
        }
    }
}

pub fn get_identity_auth_layer() -> AsyncRequireAuthorizationLayer<IdentityAuthLayer> {
    let auth_config = config::get().auth();

    let provider: Arc<dyn IdentityProvider> = match auth_config.identity_url() {
        Some(url) => Arc::new(
            HttpIdentityProvider::new(url).expect("Failed to build the identity client"),
        ),
        None => Arc::new(StaticIdentityProvider::new("userless", "default")),
    };

    AsyncRequireAuthorizationLayer::new(IdentityAuthLayer::new(provider, auth_config))
}

static GUEST_IDENTITY: LazyLock<Identity> = LazyLock::new(|| Identity {
    user_id: "guest".to_string(),
    tenant_id: "guest".to_string(),
    email: None,
});

static USERLESS_IDENTITY: LazyLock<Identity> = LazyLock::new(|| Identity {
    user_id: "userless".to_string(),
    tenant_id: "default".to_string(),
    email: None,
});

impl AsyncAuthorizeRequest<Body> for IdentityAuthLayer {
    type RequestBody = Body;

    type ResponseBody = Body;

    type Future = Pin<
        Box<
            dyn Future<Output = Result<Request<Self::RequestBody>, Response<Self::ResponseBody>>>
                + Send,
        >,
    >;

    fn authorize(&mut self, mut request: Request<Body>) -> Self::Future {
        if self.auth_config.userless() {
            request.extensions_mut().insert(USERLESS_IDENTITY.clone());

            return Box::pin(async move { Ok(request) });
        }

        let provider = self.provider.clone();
        let path = request.uri().path();

        if self
            .auth_config
            .allow_list()
            .iter()
            .any(|prefix| path.starts_with(prefix))
        {
            request.extensions_mut().insert(GUEST_IDENTITY.clone());

            return Box::pin(async move { Ok(request) });
        }

        Box::pin(async move {
            let token = match extract_bearer(&request) {
                Ok(token) => token,
                Err(err) => return Err(err.into()),
            };

            let identity = match provider.resolve(&token).await {
                Ok(identity) => identity,
                Err(err) => return Err(err.into()),
            };

            request.extensions_mut().insert(identity);

            Ok(request)
        })
    }
}

fn extract_bearer(request: &Request<Body>) -> Result<String, ApiError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .ok_or_else(|| ApiError::UnAuthorized("Authorization header missing".to_string()))?;

    let raw = header
        .to_str()
        .map_err(|_| ApiError::UnAuthorized("Invalid Authorization header".to_string()))?;

    let token = raw
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::UnAuthorized("Malformed Authorization header".to_string()))?;

    Ok(token.to_string())
}
