//! Access control list middleware for the Kopi server.
//! This middleware can be placed on any route or service.
//!
//! It authenticates the request from its bearer token and then checks the role in the token against the roles
//! allowed on the route. Holding any one of the allowed roles is sufficient. Requests without a valid token get a 401
//! response, and requests from users with the wrong role get a 403 response.

use std::{
    future::{ready, Future, Ready},
    pin::Pin,
    rc::Rc,
};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
};
use kopi_engine::db_types::Role;
use log::*;

use crate::{auth::authenticate, errors::ServerError};

pub struct AclMiddlewareFactory {
    allowed_roles: Vec<Role>,
}

impl AclMiddlewareFactory {
    pub fn new(allowed_roles: &[Role]) -> Self {
        AclMiddlewareFactory { allowed_roles: allowed_roles.to_vec() }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AclMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = AclMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AclMiddlewareService { allowed_roles: self.allowed_roles.clone(), service: Rc::new(service) }))
    }
}

pub struct AclMiddlewareService<S> {
    allowed_roles: Vec<Role>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AclMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let allowed_roles = self.allowed_roles.clone();
        Box::pin(async move {
            let claims = authenticate(req.request())?;
            if allowed_roles.contains(&claims.role) {
                service.call(req).await
            } else {
                info!("🔐️ User {} ({}) tried to access {} without permission", claims.id, claims.role, req.path());
                let roles = allowed_roles.iter().map(Role::to_string).collect::<Vec<_>>().join(" or ");
                Err(ServerError::InsufficientPermissions(format!("This action requires the {roles} role")).into())
            }
        })
    }
}
