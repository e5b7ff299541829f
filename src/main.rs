use std::net::SocketAddr;

use axum::Router;
use axum::extract::{DefaultBodyLimit, MatchedPath};
use dotenvy::dotenv;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use document_store::bootstrap::app_context::{AppContext, AppServices};
use document_store::bootstrap::config::Config;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
        paths(
            document_store::presentation::http::health::health,
            document_store::presentation::http::documents::list_documents,
            document_store::presentation::http::documents::get_document,
            document_store::presentation::http::documents::create_document,
            document_store::presentation::http::documents::update_document,
            document_store::presentation::http::documents::update_document_by_id,
            document_store::presentation::http::documents::delete_document,
        ),
        components(schemas(
            document_store::application::dto::documents::DocumentDto,
            document_store::application::dto::documents::DataDto,
            document_store::presentation::http::health::HealthResp,
        )),
        tags(
            (name = "Documents", description = "Document storage with tags"),
            (name = "Health", description = "Liveness and storage reachability")
        )
    )]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| {
            "document_store=debug,axum=info,tower_http=info".into()
        }))
        .init();

    let cfg = Config::from_env()?;
    info!(?cfg, "Starting document store");

    let services = AppServices::from_config(&cfg).await?;
    let ctx = AppContext::new(cfg.clone(), services);

    let mut app = Router::new()
        .nest("/api", document_store::presentation::http::health::routes(ctx.clone()))
        .nest(
            "/api",
            document_store::presentation::http::documents::routes(ctx.clone()),
        );
    if !cfg.is_production {
        app = app.merge(SwaggerUi::new("/api/docs").url("/api/openapi.json", ApiDoc::openapi()));
    }
    let app = app
        .layer(DefaultBodyLimit::max(cfg.body_max_bytes))
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &http::Request<_>| {
                let method = req.method().clone();
                let uri = req.uri().clone();
                let matched = req
                    .extensions()
                    .get::<MatchedPath>()
                    .map(|p| p.as_str().to_string())
                    .unwrap_or_default();
                tracing::info_span!("http", %method, %uri, matched_path = %matched)
            }),
        );

    let api_addr = SocketAddr::from(([0, 0, 0, 0], cfg.api_port));
    info!(%api_addr, "HTTP API listening");
    let listener = tokio::net::TcpListener::bind(api_addr).await?;

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!(?e, "API server failed");
        return Err(e.into());
    }
    info!("Shut down cleanly");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(?e, "ctrl_c_listener_failed");
    }
}
