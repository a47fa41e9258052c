use actix_web::dev::Server;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::net::TcpListener;

use crate::auth::TokenEngine;
use crate::middleware::JwtMiddleware;
use crate::routes::{current_session, health_check, refresh};

pub fn run(listener: TcpListener, engine: TokenEngine) -> Result<Server, std::io::Error> {
    let engine_data = web::Data::new(engine.clone());

    let server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            // Shared state
            .app_data(engine_data.clone())
            // Public routes
            .route("/health_check", web::get().to(health_check))
            .route("/auth/refresh", web::post().to(refresh))
            // Protected routes (require a valid access token)
            .service(
                web::scope("/api")
                    .wrap(JwtMiddleware::new(engine.clone()))
                    .route("/me", web::get().to(current_session)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
