use actix_web::{
    body::{EitherBody, MessageBody},
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderMap, HeaderName, HeaderValue},
    web, Error, ResponseError,
};
use futures_util::future::{ok, Ready, LocalBoxFuture};
use std::{rc::Rc, task::{Context, Poll}};

use crate::{
    admission::{AdmissionDecision, RateDecision},
    errors::AppError,
    utils::get_client_ip::{get_client_ip, rate_limit_key},
    AppState,
};

const RATELIMIT_LIMIT: &str = "ratelimit-limit";
const RATELIMIT_REMAINING: &str = "ratelimit-remaining";

/// Fixed-window admission per client and path. Wrap it around the routes
/// that should carry a budget.
pub struct RateLimitMiddleware;

impl<S, B> Transform<S, ServiceRequest> for RateLimitMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(RateLimitMiddlewareService {
            service: Rc::new(service),
        })
    }
}

pub struct RateLimitMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddlewareService<S>
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
                .cloned()
                .ok_or_else(|| {
                    tracing::error!("AppState missing in rate limiter");
                    AppError::InternalError("application state not configured".into())
                })?;

            let client_ip = get_client_ip(req.request(), state.trust_proxy_headers);
            let key = rate_limit_key(&client_ip, req.path());
            let decision = state.limiter.check_and_record(&key);

            if !decision.allowed {
                let admission = AdmissionDecision::from(&decision);
                tracing::warn!(
                    client = %client_ip,
                    path = req.path(),
                    reason = admission.reason.as_deref().unwrap_or_default(),
                    "Rate limit exceeded"
                );
                let mut response = AppError::RateLimited {
                    retry_after_secs: decision.retry_after_secs(),
                }
                .error_response();
                insert_rate_headers(response.headers_mut(), &decision);
                return Ok(req.into_response(response).map_into_right_body());
            }

            let mut res = match service.call(req).await {
                Ok(res) => res,
                Err(err) => {
                    if state.skip_failed_requests {
                        state.limiter.refund(&key);
                    }
                    return Err(err);
                }
            };

            if state.skip_failed_requests && res.status().as_u16() >= 400 {
                tracing::debug!(client = %client_ip, status = res.status().as_u16(), "Refunding failed request");
                state.limiter.refund(&key);
            }

            insert_rate_headers(res.headers_mut(), &decision);
            Ok(res.map_into_left_body())
        })
    }
}

fn insert_rate_headers(headers: &mut HeaderMap, decision: &RateDecision) {
    headers.insert(HeaderName::from_static(RATELIMIT_LIMIT), HeaderValue::from(decision.limit));
    headers.insert(HeaderName::from_static(RATELIMIT_REMAINING), HeaderValue::from(decision.remaining));
}
