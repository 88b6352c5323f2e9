use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use std::io;

use taskvault::auth::{AuthMiddleware, Credentials};
use taskvault::config::Config;
use taskvault::routes::{self, health};
use taskvault::store::Database;

fn startup_error(context: &str, err: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| startup_error("invalid configuration", e))?;
    let database = Database::connect(&config)
        .await
        .map_err(|e| startup_error("failed to connect to MongoDB", e))?;

    let db_data = web::Data::new(database.clone());
    let credentials = web::Data::new(Credentials::from_config(&config));
    let bind_address = (config.server_host.clone(), config.server_port);

    log::info!("Starting taskvault server at {}", config.server_url());
    let server_config = config.clone();
    HttpServer::new(move || {
        App::new()
            .app_data(db_data.clone())
            .app_data(credentials.clone())
            .wrap(server_config.cors())
            .wrap(Logger::default())
            .service(health::health)
            .service(
                web::scope("/api/v1")
                    .wrap(AuthMiddleware)
                    .configure(routes::config),
            )
    })
    .bind(bind_address)?
    .run()
    .await?;

    database.close().await;
    Ok(())
}
