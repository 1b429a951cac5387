// Local image server
// Serves the images directory on loopback so sketches can loadImage() local files

use axum::http::{header, Method};
use axum::Router;
use std::net::{SocketAddr, TcpListener};
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use thiserror::Error;
use tokio::sync::oneshot;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("Failed to create images directory {0}: {1}")]
    CreateDir(PathBuf, std::io::Error),
    #[error("Failed to bind image server to port {0}: {1}")]
    Bind(u16, std::io::Error),
    #[error("Failed to start image server: {0}")]
    Spawn(std::io::Error),
}

pub type AssetResult<T> = Result<T, AssetError>;

/// Handle to a running image server
///
/// Dropping the handle shuts the server down.
pub struct ImageServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl ImageServer {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn base_url(&self) -> String {
        format!("http://localhost:{}", self.addr.port())
    }

    /// Stop accepting requests and wait for the server thread
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Image server thread panicked");
            }
        }
    }
}

impl Drop for ImageServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn router(dir: &Path) -> Router {
    Router::new().fallback_service(ServeDir::new(dir)).layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE]),
    )
}

/// Serve `dir` read-only on `127.0.0.1:port`
///
/// The port is bound before this returns, so a taken port is reported to
/// the caller. Port 0 picks a free port; see [`ImageServer::addr`].
pub fn start_image_server(dir: &Path, port: u16) -> AssetResult<ImageServer> {
    std::fs::create_dir_all(dir).map_err(|e| AssetError::CreateDir(dir.to_path_buf(), e))?;

    let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], port)))
        .map_err(|e| AssetError::Bind(port, e))?;
    listener
        .set_nonblocking(true)
        .map_err(|e| AssetError::Bind(port, e))?;
    let addr = listener.local_addr().map_err(|e| AssetError::Bind(port, e))?;

    let app = router(dir);
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let handle = thread::Builder::new()
        .name("image-server".to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    log::error!("Failed to build image server runtime: {}", e);
                    return;
                }
            };

            runtime.block_on(async move {
                let listener = match tokio::net::TcpListener::from_std(listener) {
                    Ok(listener) => listener,
                    Err(e) => {
                        log::error!("Image server listener error: {}", e);
                        return;
                    }
                };
                let shutdown = async {
                    let _ = shutdown_rx.await;
                };
                if let Err(e) = axum::serve(listener, app)
                    .with_graceful_shutdown(shutdown)
                    .await
                {
                    log::error!("Image server error: {}", e);
                }
            });
            log::info!("Image server stopped");
        })
        .map_err(AssetError::Spawn)?;

    log::info!("Image server running at http://localhost:{}", addr.port());
    log::info!("Serving images from: {}", dir.display());

    Ok(ImageServer {
        addr,
        shutdown_tx: Some(shutdown_tx),
        handle: Some(handle),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpStream;
    use std::time::Duration;
    use tempfile::TempDir;

    fn request(addr: SocketAddr, raw: &str) -> String {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        stream.write_all(raw.as_bytes()).unwrap();
        let mut response = Vec::new();
        stream.read_to_end(&mut response).unwrap();
        String::from_utf8_lossy(&response).to_string()
    }

    #[test]
    fn test_serves_files_with_cors() {
        let temp_dir = TempDir::new().unwrap();
        let images = temp_dir.path().join("images");
        std::fs::create_dir_all(&images).unwrap();
        std::fs::write(images.join("sprite.txt"), "pixels").unwrap();

        let mut server = start_image_server(&images, 0).unwrap();
        let response = request(
            server.addr(),
            "GET /sprite.txt HTTP/1.1\r\nHost: localhost\r\nOrigin: http://tauri.localhost\r\nConnection: close\r\n\r\n",
        );
        server.shutdown();

        let lower = response.to_lowercase();
        assert!(response.starts_with("HTTP/1.1 200"), "{}", response);
        assert!(lower.contains("access-control-allow-origin: *"));
        assert!(response.ends_with("pixels"));
    }

    #[test]
    fn test_preflight_and_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let images = temp_dir.path().join("images");

        let server = start_image_server(&images, 0).unwrap();
        assert!(images.is_dir());
        assert_eq!(
            server.base_url(),
            format!("http://localhost:{}", server.addr().port())
        );

        let preflight = request(
            server.addr(),
            "OPTIONS /a.png HTTP/1.1\r\nHost: localhost\r\nOrigin: http://tauri.localhost\r\nAccess-Control-Request-Method: POST\r\nConnection: close\r\n\r\n",
        )
        .to_lowercase();
        assert!(preflight.contains("access-control-allow-methods"));
        assert!(preflight.contains("post"));
        assert!(preflight.contains("content-type"));

        let missing = request(
            server.addr(),
            "GET /nope.png HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
        );
        assert!(missing.starts_with("HTTP/1.1 404"), "{}", missing);
    }

    #[test]
    fn test_port_in_use_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let taken = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = taken.local_addr().unwrap().port();

        let result = start_image_server(temp_dir.path(), port);

        assert!(matches!(result, Err(AssetError::Bind(p, _)) if p == port));
    }
}
