use std::io;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use sqlx::PgPool;

use campusdesk::auth::{AuthMiddleware, TokenService};
use campusdesk::config::Config;
use campusdesk::routes::{self, health, API_PREFIX};
use campusdesk::state::AppState;

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;
    let tokens = TokenService::new(&config.jwt_secret, config.jwt_ttl());

    let state = match &config.database_url {
        Some(url) => {
            let pool = PgPool::connect(url).await.map_err(io::Error::other)?;
            log::info!("using PostgreSQL store");
            AppState::postgres(pool, tokens, config.bcrypt_cost)
        }
        None => {
            log::warn!("DATABASE_URL not set; records are kept in memory and lost on restart");
            AppState::in_memory(tokens, config.bcrypt_cost)
        }
    };
    let state = web::Data::new(state);

    log::info!("Starting campusdesk server at {}", config.server_url());
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .service(health::health)
            .service(
                web::scope(API_PREFIX)
                    .wrap(AuthMiddleware)
                    .configure(routes::config),
            )
    })
    .bind((config.server_host.clone(), config.server_port))?
    .run()
    .await
}
