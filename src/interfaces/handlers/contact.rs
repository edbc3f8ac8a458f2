use actix_web::{post, web, HttpResponse, Responder};

use crate::{
    entities::contact::ContactSubmission,
    errors::AppError,
    middlewares::rate_limit::RateLimitMiddleware,
    AppState,
};

#[post("/contact", wrap = "RateLimitMiddleware")]
pub async fn submit_contact(
    state: web::Data<AppState>,
    form: web::Json<ContactSubmission>,
) -> Result<impl Responder, AppError> {
    let response = state.contact_handler
        .submit(form.into_inner()).await?;

    Ok(HttpResponse::Ok().json(response))
}
