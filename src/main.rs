use clap::Parser;
use dotenvy::dotenv;
use rust_gallery_backend::config::GalleryConfig;
use rust_gallery_backend::infrastructure::{database, storage};
use rust_gallery_backend::services::gallery_service::GalleryService;
use rust_gallery_backend::services::metadata_store::{MetadataStore, SeaOrmMetadataStore};
use rust_gallery_backend::services::reconciler::OrphanReconciler;
use rust_gallery_backend::services::storage::StorageService;
use rust_gallery_backend::services::upload_service::UploadService;
use rust_gallery_backend::services::worker::BackgroundWorker;
use rust_gallery_backend::{AppState, create_app};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Service type to run (api, worker, all)
    #[arg(short, long, default_value = "all")]
    mode: String,

    /// Port for the API server
    #[arg(short, long, default_value_t = 3000)]
    port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Environment & logging
    dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rust_gallery_backend=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🚀 Starting Rust Gallery Backend [Mode: {}]...", args.mode);

    // 2. Shared infrastructure
    let db = database::setup_database().await?;
    let storage_service: Arc<dyn StorageService> = storage::setup_storage().await;
    let metadata_store: Arc<dyn MetadataStore> = Arc::new(SeaOrmMetadataStore::new(db.clone()));

    let config = GalleryConfig::from_env();
    info!(
        "🖼️  Gallery Config: Batch Width={}, Max Size={}MB, Prefix={}, Orphan Grace={}h",
        config.batch_width,
        config.max_file_size / 1024 / 1024,
        config.storage_prefix,
        config.orphan_grace_hours
    );

    // 3. Shutdown channel for the worker
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let mut handles = Vec::new();

    // 4. Reconciliation worker
    if args.mode == "worker" || args.mode == "all" {
        let reconciler = OrphanReconciler::new(
            storage_service.clone(),
            metadata_store.clone(),
            config.storage_prefix.clone(),
            config.orphan_grace_hours,
        );
        let worker = BackgroundWorker::new(
            reconciler,
            config.reconcile_interval_secs,
            shutdown_rx.clone(),
        );
        handles.push(tokio::spawn(worker.run()));
        info!("👷 Worker service initialized.");
    }

    // 5. API server
    let (server_stop_tx, server_stop_rx) = tokio::sync::oneshot::channel::<()>();
    if args.mode == "api" || args.mode == "all" {
        let upload_service = Arc::new(UploadService::new(
            storage_service.clone(),
            metadata_store.clone(),
            config.clone(),
        )?);
        let gallery_service = Arc::new(GalleryService::new(db.clone(), storage_service.clone()));

        let state = AppState {
            db: db.clone(),
            storage: storage_service.clone(),
            upload_service,
            gallery_service,
            config: config.clone(),
        };

        let trace_layer = TraceLayer::new_for_http()
            .make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            })
            .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
                info!("📥 {} {}", request.method(), request.uri());
            })
            .on_response(
                |response: &axum::http::Response<_>,
                 latency: std::time::Duration,
                 _span: &tracing::Span| {
                    info!(
                        "📤 Finished in {:?} with status {}",
                        latency,
                        response.status()
                    );
                },
            );

        let app = create_app(state).layer(trace_layer);
        let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
        let listener = tokio::net::TcpListener::bind(addr).await?;

        info!("✅ API Server listening on: http://0.0.0.0:{}", args.port);
        info!(
            "📖 Swagger UI documentation: http://localhost:{}/swagger-ui",
            args.port
        );

        handles.push(tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = server_stop_rx.await;
                })
                .await
            {
                error!("❌ Server runtime error: {}", e);
            }
        }));
    }

    // 6. One signal stops both services
    shutdown_signal().await;
    info!("🛑 Shutting down backend services...");
    let _ = shutdown_tx.send(true);
    let _ = server_stop_tx.send(());

    for handle in handles {
        let _ = handle.await;
    }

    info!("👋 Backend exited cleanly.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("⌨️  Ctrl+C received, initiating graceful shutdown...");
        },
        _ = terminate => {
            info!("💤 SIGTERM received, initiating graceful shutdown...");
        },
    }
}
