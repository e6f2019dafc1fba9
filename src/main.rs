use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::middleware::{ErrorHandlers, Logger};
use actix_web::{App, HttpResponse, HttpServer, Responder, get, web};
use dotenv::dotenv;
use env_logger::Env;
use log::{error, info};
use serde_json::json;

mod config;
mod database;
mod middleware;
mod otp;
mod router;
mod utils;

use config::{AppConfig, ServerConfig};
use middleware::not_found::not_found;
use otp::service::OtpService;
use router::index::routes;
use utils::email::SmtpMailer;

#[get("/")]
async fn default(server: web::Data<ServerConfig>) -> impl Responder {
    HttpResponse::Ok().json(json!({
        "success": true,
        "message": "OTP service is running",
        "httpStatusCode": StatusCode::OK.as_u16(),
        "service": server.service_name,
    }))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    // Missing configuration is fatal before anything is served
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    info!("Loaded configuration: {:?}", config);

    let store = database::connect_store(&config.store).await.map_err(|e| {
        error!("Failed to initialize document store: {}", e);
        std::io::Error::other(e)
    })?;

    let mailer = SmtpMailer::new(&config.smtp).map_err(|e| {
        error!("Failed to initialize SMTP transport: {}", e);
        std::io::Error::other(e)
    })?;

    let otp_service = web::Data::new(OtpService::new(
        store,
        Arc::new(mailer),
        config.store.collection_id.clone(),
        config.smtp.from.clone(),
        config.otp_validity,
    ));
    let server_config = web::Data::new(config.server.clone());

    let bind = (config.server.host.clone(), config.server.port);
    info!("Starting server on http://{}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(otp_service.clone())
            .app_data(server_config.clone())
            .configure(routes)
            .wrap(ErrorHandlers::new().handler(StatusCode::NOT_FOUND, not_found))
            .service(default)
    })
    .bind(bind)?
    .run()
    .await?;

    info!("Server has stopped");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test;

    #[actix_web::test]
    async fn root_reports_service_name() {
        let server = ServerConfig {
            host: "localhost".to_string(),
            port: 8000,
            service_name: "otp-issuer".to_string(),
        };
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(server))
                .service(default),
        )
        .await;

        let req = test::TestRequest::get().uri("/").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["success"], true);
        assert_eq!(body["service"], "otp-issuer");
    }
}
