use actix_cors::Cors;
use actix_web::{
    body::{EitherBody, MessageBody},
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::{header, Method},
    web, Error, ResponseError,
};
use futures_util::future::{ok, Ready, LocalBoxFuture};
use std::{rc::Rc, task::{Context, Poll}};

use crate::{admission::check_origin, errors::AppError, AppState};

/// Rejects browser requests whose `Origin` is not on the allow-list, before
/// any other middleware (rate limiting included) sees them.
pub struct OriginGuard;

impl<S, B> Transform<S, ServiceRequest> for OriginGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = OriginGuardService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(OriginGuardService {
            service: Rc::new(service),
        })
    }
}

pub struct OriginGuardService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for OriginGuardService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            let state = req.app_data::<web::Data<AppState>>()
                .ok_or_else(|| {
                    tracing::error!("AppState missing in origin guard");
                    AppError::InternalError("application state not configured".into())
                })?;

            // A non-UTF-8 origin can never match the allow-list.
            let origin = req.headers()
                .get(header::ORIGIN)
                .map(|value| value.to_str().unwrap_or("\u{fffd}"));

            let decision = check_origin(origin, &state.allowed_origins);
            if !decision.allowed {
                let origin = origin.unwrap_or_default().to_string();
                tracing::warn!(
                    %origin,
                    path = req.path(),
                    reason = decision.reason.as_deref().unwrap_or_default(),
                    "Rejected cross-origin request"
                );
                let response = AppError::OriginRejected(origin).error_response();
                return Ok(req.into_response(response).map_into_right_body());
            }

            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}

/// CORS response headers and preflight handling for the allow-listed origins.
pub fn build_cors(allowed_origins: &[String]) -> Cors {
    allowed_origins
        .iter()
        .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
        .allowed_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allowed_header(header::CONTENT_TYPE)
        .max_age(3600)
}
