use std::sync::Arc;

use actix_web::{App, HttpRequest, HttpServer, web};
use linksnip::{
    config::{
        self,
        logger::{LogFormat, LoggerConfig},
    },
    handler::handlers::Handler,
    memory::db::DB,
    ratelimit::limiter::FixedWindowLimiter,
    validate::validator::Validator,
};
use tracing_subscriber::fmt::time::ChronoLocal;

type AppHandler = Handler<Arc<DB>, FixedWindowLimiter>;

fn build_logger(config: &LoggerConfig) {
    let builder = tracing_subscriber::fmt().with_timer(ChronoLocal::rfc_3339());

    match config.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
        LogFormat::Pretty => builder.pretty().init(),
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let cfg = match config::load() {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("Failed to load configuration: {}", err);
            std::process::exit(1);
        }
    };
    build_logger(&cfg.logger);

    tracing::debug!(config = ?cfg, "Configuration loaded successfully");

    let repo = Arc::new(DB::new());
    let limiter = FixedWindowLimiter::from_config(&cfg.rate_limit);
    let validator = Validator::from_config(&cfg.validate);
    let port = cfg.handler.port;
    let handler = web::Data::new(Handler::new(
        Arc::clone(&repo),
        limiter,
        validator,
        cfg.handler.clone(),
    ));

    HttpServer::new(move || {
        App::new()
            .app_data(handler.clone())
            .service(
                web::scope("/health")
                    .route(
                        "/livez",
                        web::get().to(|handler: web::Data<AppHandler>| async move {
                            handler.livez().await
                        }),
                    )
                    .route(
                        "/readyz",
                        web::get().to(|handler: web::Data<AppHandler>| async move {
                            handler.readyz().await
                        }),
                    ),
            )
            .service(web::scope("/api").service(web::scope("/v1").route(
                "/shorten",
                web::post().to(
                    |handler: web::Data<AppHandler>, req: HttpRequest, body: web::Bytes| async move {
                        handler.shorten(req, body).await
                    },
                ),
            )))
            .route(
                "/{id}",
                web::get().to(
                    |handler: web::Data<AppHandler>,
                     req: HttpRequest,
                     path: web::Path<String>| async move {
                        handler.redirect(req, path).await
                    },
                ),
            )
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
