use axum::{
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    extract::State,
    response::IntoResponse,
    routing::get,
    Router,
};
use aoi_core::features::{FeatureStore, FileStorage};
use clap::Parser;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

mod commands;
mod config;
mod handler;
mod surface;

use commands::{command_error_message, ClientCommand};
use config::Config;

// Application State
struct AppState {
    store: Mutex<FeatureStore<FileStorage>>,
    // Carries the id of the connection that changed the store
    changes: broadcast::Sender<u64>,
    next_conn: AtomicU64,
}

impl AppState {
    fn store(&self) -> MutexGuard<'_, FeatureStore<FileStorage>> {
        self.store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[tokio::main]
async fn main() {
    let config = Config::parse();
    tracing_subscriber::fmt().with_max_level(config.level()).init();

    let data_dir = config.data_dir();
    info!(data_dir = %data_dir.display(), "Using data directory");

    let storage = match FileStorage::open(&data_dir) {
        Ok(storage) => storage,
        Err(e) => {
            error!(error = %e, "Storage unavailable");
            std::process::exit(1);
        }
    };

    let (changes, _) = broadcast::channel(64);
    let shared_state = Arc::new(AppState {
        store: Mutex::new(FeatureStore::load(storage)),
        changes,
        next_conn: AtomicU64::new(1),
    });

    let mut app = Router::new().route("/ws", get(ws_handler));
    app = match &config.static_dir {
        Some(dir) => {
            info!(static_dir = %dir.display(), "Serving front end");
            app.fallback_service(ServeDir::new(dir))
        }
        None => app.route("/", get(root)),
    };
    let app = app.layer(TraceLayer::new_for_http()).with_state(shared_state);

    info!("listening on {}", config.addr);
    let listener = match tokio::net::TcpListener::bind(config.addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(addr = %config.addr, error = %e, "Failed to bind");
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "Server stopped");
    }
}

async fn root() -> &'static str {
    "Hello from AOI Backend!"
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>) {
    let conn = state.next_conn.fetch_add(1, Ordering::Relaxed);
    info!(conn, "Client connected");

    let mut changes = state.changes.subscribe();

    // Each connection drives its own surface over the shared store
    let (mut controller, frames) = {
        let store = state.store();
        let mut controller = handler::connect(&*store);
        let frames = handler::initial_frames(&*store, &mut controller);
        (controller, frames)
    };
    if !send_all(&mut socket, frames).await {
        controller.teardown();
        return;
    }

    loop {
        let frames = tokio::select! {
            msg = socket.recv() => {
                let text = match msg {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => continue,
                };

                match ClientCommand::parse(&text) {
                    Ok(command) => {
                        // Store writes hit the disk
                        let reply = tokio::task::block_in_place(|| {
                            let mut store = state.store();
                            handler::handle_command(&mut *store, &mut controller, command)
                        });
                        if reply.store_changed {
                            let _ = state.changes.send(conn);
                        }
                        reply.frames
                    }
                    Err(e) => {
                        warn!(conn, error = %e, "Rejected client frame");
                        vec![command_error_message(&e)]
                    }
                }
            }
            changed = changes.recv() => match changed {
                Ok(origin) if origin == conn => continue,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {
                    debug!(conn, "Resyncing after change from another connection");
                    let store = state.store();
                    handler::resync_frames(&*store, &mut controller)
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        };

        if !send_all(&mut socket, frames).await {
            break;
        }
    }

    controller.teardown();
    info!(conn, "Client disconnected");
}

async fn send_all(socket: &mut WebSocket, frames: Vec<String>) -> bool {
    for frame in frames {
        if socket.send(Message::Text(frame)).await.is_err() {
            return false;
        }
    }
    true
}
