use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
};
use futures_util::future::LocalBoxFuture;
use std::future::{ready, Ready};
use std::rc::Rc;

/// Middleware that logs request failures for monitoring.
///
/// Response bodies are already shaped by `AppError`'s `ResponseError`
/// impl; this layer only records the failure with its path.
pub struct ErrorLogger;

impl<S> Transform<S, ServiceRequest> for ErrorLogger
where
    S: Service<ServiceRequest, Response = ServiceResponse, Error = Error> + 'static,
    S::Future: 'static,
{
    type Response = ServiceResponse;
    type Error = Error;
    type InitError = ();
    type Transform = ErrorLoggerMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ErrorLoggerMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct ErrorLoggerMiddleware<S> {
    service: Rc<S>,
}

impl<S> Service<ServiceRequest> for ErrorLoggerMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse, Error = Error> + 'static,
    S::Future: 'static,
{
    type Response = ServiceResponse;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let path = req.path().to_string();

        Box::pin(async move {
            let result = service.call(req).await;

            match &result {
                Err(err) => {
                    tracing::error!(path = %path, error = %err, "Request failed");
                }
                Ok(res) if res.status().is_server_error() => {
                    tracing::error!(path = %path, status = %res.status(), "Request failed");
                }
                Ok(_) => {}
            }

            result
        })
    }
}
