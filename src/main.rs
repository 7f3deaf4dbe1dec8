mod core;
mod features;
mod modules;
mod shared;

use crate::core::config::Config;
use crate::core::extractor::HostPolicy;
use crate::core::openapi::{ApiDoc, SwaggerInfoModifier};
use crate::core::{database, middleware};
use crate::features::admin::{routes as admin_routes, AdminService, AdminState};
use crate::features::attachments::extensions::ExtensionRegistry;
use crate::features::attachments::{
    routes as attachments_routes, with_permission, AttachmentService, AttachmentsState,
    LinkService,
};
use crate::features::auth;
use crate::features::content_types::ContentTypeService;
use crate::features::file_types::{routes as file_types_routes, FileTypeService};
use crate::modules::storage;
use axum::{middleware::from_fn_with_state, Extension, Router};
use std::sync::Arc;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::Modify;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

fn main() -> anyhow::Result<()> {
    // Build Tokio runtime with configurable worker threads
    let worker_threads = std::env::var("TOKIO_WORKER_THREADS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|p| p.get())
                .unwrap_or(4)
        });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(worker_threads)
        .max_blocking_threads(worker_threads * 4)
        .enable_all()
        .build()?;

    runtime.block_on(async_main(worker_threads))
}

async fn async_main(worker_threads: usize) -> anyhow::Result<()> {
    // Load .env file BEFORE initializing logger so RUST_LOG is available
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;
    tracing::info!(
        "Configuration loaded: tokio_worker_threads={}, pid={}",
        worker_threads,
        std::process::id()
    );

    // Unknown extension names abort startup
    let extensions = ExtensionRegistry::with_defaults()
        .resolve(&config.attachments)
        .map_err(|e| anyhow::anyhow!("{}", e))?;
    tracing::info!(
        "Attachment extensions resolved (flat table: {})",
        extensions.flat_table
    );

    let pool = database::create_pool(&config.database).await?;
    tracing::info!("Database connection pool created");

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Migration failed: {}", e))?;
    tracing::info!("Database migrations completed successfully");

    let jwt_validator = Arc::new(auth::JwtValidator::new(&config.auth));
    tracing::info!("Auth configuration initialized");

    let file_storage = storage::create_storage(&config.storage)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize storage: {}", e))?;
    tracing::info!("{} storage initialized", file_storage.name());

    // Services
    let content_type_service = Arc::new(ContentTypeService::new(pool.clone()));
    let file_type_service = Arc::new(FileTypeService::new(pool.clone()));
    let attachment_service = Arc::new(
        AttachmentService::new(
            pool.clone(),
            Arc::clone(&file_storage),
            &extensions,
            &config.attachments,
            Arc::clone(&content_type_service),
            Arc::clone(&file_type_service),
        )
        .map_err(|e| anyhow::anyhow!("{}", e))?,
    );
    let link_service = Arc::new(LinkService::new(pool.clone(), Arc::clone(&file_storage)));
    let admin_service = Arc::new(AdminService::new(
        pool.clone(),
        Arc::clone(&attachment_service),
    ));
    tracing::info!("Attachment services initialized");

    let swagger_modifier = SwaggerInfoModifier {
        title: config.swagger.title.clone(),
        version: config.swagger.version.clone(),
        description: config.swagger.description.clone(),
    };

    let mut openapi = ApiDoc::openapi();
    swagger_modifier.modify(&mut openapi);

    let swagger = if let Some(credentials) = config.swagger.credentials() {
        tracing::info!("Swagger UI basic auth enabled");
        Router::new()
            .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
            .layer(from_fn_with_state(
                Arc::new(credentials),
                middleware::basic_auth_middleware,
            ))
    } else {
        tracing::info!("Swagger UI basic auth disabled (no credentials configured)");
        Router::new().merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi))
    };

    // Attachment routes, guarded by the configured permission policy
    let attachment_routes = with_permission(
        Router::new()
            .merge(attachments_routes(AttachmentsState {
                attachments: Arc::clone(&attachment_service),
                links: link_service,
                content_types: Arc::clone(&content_type_service),
            }))
            .merge(file_types_routes::routes(Arc::clone(&file_type_service))),
        Arc::clone(&extensions.permission),
    );

    // Staff routes
    let admin = Router::new().nest(
        "/api/admin",
        admin_routes::routes(AdminState {
            admin: admin_service,
            file_types: file_type_service,
            content_types: content_type_service,
        }),
    );

    let host_policy = Arc::new(HostPolicy::from_config(&config.app));
    tracing::info!(
        "Allowed hosts: {:?} (X-Forwarded-Host trusted: {})",
        config.app.allowed_hosts,
        config.app.use_x_forwarded_host
    );

    // Tokens are optional here; permission policies and guards decide
    let api_routes = Router::new()
        .merge(attachment_routes)
        .merge(admin)
        .layer(from_fn_with_state(jwt_validator, middleware::auth_middleware))
        .layer(Extension(host_policy));

    // Simple health check endpoint (no auth required)
    async fn health_check() -> axum::http::StatusCode {
        axum::http::StatusCode::OK
    }
    let health_route = Router::new().route("/health", axum::routing::get(health_check));

    let app = Router::new()
        .merge(swagger)
        .merge(api_routes)
        .merge(health_route)
        .layer(middleware::cors_layer(
            config.app.cors_allowed_origins.clone(),
        ))
        // Propagate X-Request-Id to response headers
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(middleware::MakeSpanWithRequestId)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Generate X-Request-Id using UUID v7 (or use client-provided one)
        .layer(SetRequestIdLayer::x_request_id(middleware::MakeRequestUuid));

    let addr = config.app.server_address();
    let socket_addr: std::net::SocketAddr = addr
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid address: {}", e))?;

    let socket = socket2::Socket::new(
        socket2::Domain::for_address(socket_addr),
        socket2::Type::STREAM,
        Some(socket2::Protocol::TCP),
    )?;

    socket.set_reuse_address(true)?;
    #[cfg(unix)]
    socket.set_reuse_port(true)?;
    socket.set_nodelay(true)?;

    #[cfg(target_os = "linux")]
    {
        let keepalive = socket2::TcpKeepalive::new()
            .with_time(std::time::Duration::from_secs(60))
            .with_interval(std::time::Duration::from_secs(10))
            .with_retries(3);
        socket.set_tcp_keepalive(&keepalive)?;
    }
    #[cfg(not(target_os = "linux"))]
    {
        let keepalive = socket2::TcpKeepalive::new().with_time(std::time::Duration::from_secs(60));
        socket.set_tcp_keepalive(&keepalive)?;
    }

    socket.set_nonblocking(true)?;
    socket.bind(&socket_addr.into())?;
    socket.listen(1024)?;

    let listener = tokio::net::TcpListener::from_std(socket.into())?;
    tracing::info!("Server listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
