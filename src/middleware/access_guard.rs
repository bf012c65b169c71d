/// Access Token Guard
///
/// Validates the bearer access token on every request it wraps and injects
/// the resolved `Identity` into request extensions for route handlers.
/// Missing tokens are rejected with 401, invalid or expired ones with 403.
/// The refresh token registry is never consulted.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

use crate::auth::{bearer_token, AuthGateway};
use crate::error::AppError;

/// Guard for routes that require a valid access token
pub struct AccessGuard {
    gateway: AuthGateway,
}

impl AccessGuard {
    pub fn new(gateway: AuthGateway) -> Self {
        Self { gateway }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AccessGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AccessGuardService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(AccessGuardService {
            service: Rc::new(service),
            gateway: self.gateway.clone(),
        }))
    }
}

pub struct AccessGuardService<S> {
    service: Rc<S>,
    gateway: AuthGateway,
}

impl<S, B> Service<ServiceRequest> for AccessGuardService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let identity = bearer_token(req.headers())
            .and_then(|token| self.gateway.verify_access(&token));

        match identity {
            Ok(identity) => {
                tracing::debug!(name = %identity.name, path = %req.path(), "Access token accepted");
                req.extensions_mut().insert(identity);

                let service = self.service.clone();
                Box::pin(async move { service.call(req).await })
            }
            Err(e) => {
                let error: Error = AppError::Auth(e).into();
                Box::pin(async move { Err(error) })
            }
        }
    }
}
