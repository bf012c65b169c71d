use actix_web::dev::Server;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::net::TcpListener;

use crate::auth::AuthGateway;
use crate::logger::LoggerMiddleware;
use crate::middleware::AccessGuard;
use crate::routes::{current_identity, health_check, login, logout, logout_all, refresh};

pub fn run(listener: TcpListener, gateway: AuthGateway) -> Result<Server, std::io::Error> {
    // One gateway (and refresh token store) shared by every worker
    let gateway_data = web::Data::new(gateway.clone());

    let server = HttpServer::new(move || {
        App::new()
            // Global middleware
            .wrap(Logger::default())
            .wrap(LoggerMiddleware)

            // Shared state
            .app_data(gateway_data.clone())

            // Public routes
            .route("/health_check", web::get().to(health_check))
            .route("/login", web::post().to(login))
            .route("/token", web::post().to(refresh))
            .route("/accessToken", web::get().to(refresh))
            .route("/logout", web::delete().to(logout))

            // Protected routes (require an access token)
            .service(
                web::resource("/me")
                    .wrap(AccessGuard::new(gateway.clone()))
                    .route(web::get().to(current_identity)),
            )
            .service(
                web::resource("/logout/all")
                    .wrap(AccessGuard::new(gateway.clone()))
                    .route(web::delete().to(logout_all)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
