//! Bearer-token guard for the admin routes.
//!
//! Requests must carry `Authorization: Bearer <APG_ADMIN_API_TOKEN>`. A missing or wrong token gets a 401 response.
//! If no token is configured, every request is refused.

use std::{future::Future, pin::Pin, rc::Rc};

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
};
use apg_common::Secret;
use futures::future::{ok, Ready};
use log::*;

use crate::{
    errors::{AuthError, ServerError},
    helpers::bearer_token,
};

pub struct AdminTokenMiddlewareFactory {
    token: Secret<String>,
}

impl AdminTokenMiddlewareFactory {
    pub fn new(token: Secret<String>) -> Self {
        AdminTokenMiddlewareFactory { token }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AdminTokenMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AdminTokenMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AdminTokenMiddlewareService { token: self.token.clone(), service: Rc::new(service) })
    }
}

pub struct AdminTokenMiddlewareService<S> {
    token: Secret<String>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AdminTokenMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let check = check_token(&self.token, bearer_token(req.headers()));
        Box::pin(async move {
            match check {
                Ok(()) => service.call(req).await.map(ServiceResponse::map_into_left_body),
                Err(e) => {
                    warn!("💻️ Refused admin request to {}. {e}", req.path());
                    let err = ServerError::AuthenticationError(e);
                    Ok(req.error_response(err).map_into_right_body())
                },
            }
        })
    }
}

fn check_token(expected: &Secret<String>, provided: Option<&str>) -> Result<(), AuthError> {
    if expected.is_empty() {
        return Err(AuthError::InvalidCredentials("No admin token has been configured".into()));
    }
    let provided = provided.ok_or(AuthError::MissingCredentials)?;
    if constant_time_eq(expected.reveal().as_bytes(), provided.as_bytes()) {
        Ok(())
    } else {
        Err(AuthError::InvalidCredentials("Invalid admin token".into()))
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
