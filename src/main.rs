use actix_web::{App, HttpServer, middleware, web};

use udpipe_web::config::Config;
use udpipe_web::fetch::HttpFetcher;
use udpipe_web::handlers;
use udpipe_web::service::UdpipeClient;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = Config::from_env().map_err(std::io::Error::other)?;
    // Processing a long text takes far longer than fetching a catalog.
    let client = UdpipeClient::new(&config.service_url, config.fetch_timeout * 30)
        .map_err(std::io::Error::other)?;
    let fetcher = HttpFetcher::new(config.fetch_timeout, config.fetch_policy())
        .map_err(std::io::Error::other)?;

    log::info!("Using UDPipe service at {}", config.service_url);
    log::info!("Using model catalog at {}", config.catalog_url);
    log::info!("Fetching non-public hosts only from {:?}", config.fetch_allowed_hosts);
    log::info!("Starting server at http://{}", config.bind_addr);

    let bind_addr = config.bind_addr.clone();
    let static_dir = config.static_dir.clone();
    let config = web::Data::new(config);
    let client = web::Data::new(client);
    let fetcher = web::Data::new(fetcher);

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(config.clone())
            .app_data(client.clone())
            .app_data(fetcher.clone())
            // Static files (stylesheet, bundled model catalog)
            .service(actix_files::Files::new("/static", &static_dir))
            .configure(handlers::run_handlers::configure)
            // Default 404 handler (must be registered last)
            .default_service(web::to(|| async {
                actix_web::HttpResponse::NotFound()
                    .content_type("text/plain; charset=utf-8")
                    .body("Not Found")
            }))
    })
    .bind(bind_addr)?
    .run()
    .await
}
