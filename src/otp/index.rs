use super::controller::send_otp;
use actix_web::web;

pub fn otp_routes(cfg: &mut web::ServiceConfig) {
    // every verb reaches the handler so non-POST requests get the JSON 405
    cfg.service(web::resource("/api/send-otp").route(web::route().to(send_otp)));
}
