// Test utilities: origin doubles and a tiny local HTTP origin

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use shrinkray::config::Config;
use shrinkray::metrics::Metrics;
use shrinkray::optimizer::ContentOptimizer;
use shrinkray::origin::{FetchError, OriginFetcher, OriginResponse};
use shrinkray::pipeline::Pipeline;
use shrinkray::rewrite::LiteralRewriter;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Canned origin response
#[derive(Clone)]
pub struct Route {
    pub status: u16,
    pub content_type: String,
    pub body: Bytes,
    pub delay: Duration,
    pub fail: bool,
}

impl Route {
    pub fn ok(content_type: &str, body: impl Into<Bytes>) -> Self {
        Self {
            status: 200,
            content_type: content_type.to_string(),
            body: body.into(),
            delay: Duration::ZERO,
            fail: false,
        }
    }

    pub fn status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn unreachable() -> Self {
        Self {
            fail: true,
            ..Self::ok("", Bytes::new())
        }
    }
}

/// OriginFetcher double that counts fetches per destination URL
#[derive(Default)]
pub struct CountingOrigin {
    routes: Mutex<HashMap<String, Route>>,
    fetches: Mutex<HashMap<String, usize>>,
    total: AtomicUsize,
}

impl CountingOrigin {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a route by path on the default origin (https://monurl.com)
    pub fn route(&self, path: &str, route: Route) {
        self.routes
            .lock()
            .insert(format!("https://monurl.com{}", path), route);
    }

    pub fn fetch_count(&self, path: &str) -> usize {
        self.fetches
            .lock()
            .get(&format!("https://monurl.com{}", path))
            .copied()
            .unwrap_or(0)
    }

    pub fn total_fetches(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OriginFetcher for CountingOrigin {
    async fn fetch(&self, destination_url: &str) -> Result<OriginResponse, FetchError> {
        self.total.fetch_add(1, Ordering::SeqCst);
        *self
            .fetches
            .lock()
            .entry(destination_url.to_string())
            .or_insert(0) += 1;

        let route = self.routes.lock().get(destination_url).cloned();
        let Some(route) = route else {
            return Err(FetchError::Connect {
                url: destination_url.to_string(),
                message: "no such route".to_string(),
            });
        };

        if !route.delay.is_zero() {
            tokio::time::sleep(route.delay).await;
        }
        if route.fail {
            return Err(FetchError::Connect {
                url: destination_url.to_string(),
                message: "connection refused".to_string(),
            });
        }

        Ok(OriginResponse {
            body: route.body,
            content_type: route.content_type,
            status: route.status,
        })
    }
}

/// Pipeline with default settings around a counting origin
pub fn pipeline_with(origin: Arc<CountingOrigin>) -> Arc<Pipeline> {
    pipeline_with_config(origin, Config::default())
}

pub fn pipeline_with_config(origin: Arc<CountingOrigin>, config: Config) -> Arc<Pipeline> {
    Arc::new(Pipeline::with_components(
        &config,
        origin,
        Arc::new(LiteralRewriter::from_config(&config)),
        ContentOptimizer::new(config.optimizer.clone()),
        Arc::new(Metrics::new()),
    ))
}

/// Response served by the local HTTP origin
#[derive(Clone)]
pub struct RawRoute {
    pub status_line: &'static str,
    pub headers: Vec<(&'static str, String)>,
    pub body: Vec<u8>,
}

impl RawRoute {
    pub fn ok(content_type: &str, body: &[u8]) -> Self {
        Self {
            status_line: "200 OK",
            headers: vec![("Content-Type", content_type.to_string())],
            body: body.to_vec(),
        }
    }
}

/// Start a minimal HTTP/1.1 origin on 127.0.0.1 serving `routes` by path.
/// Unknown paths get a 404 with an empty body.
pub async fn spawn_http_origin(routes: HashMap<&'static str, RawRoute>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let routes = Arc::new(routes);

    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            let routes = Arc::clone(&routes);
            tokio::spawn(async move {
                let mut buf = vec![0u8; 8192];
                let mut read = 0;
                loop {
                    match stream.read(&mut buf[read..]).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => read += n,
                    }
                    if buf[..read].windows(4).any(|w| w == b"\r\n\r\n") || read == buf.len() {
                        break;
                    }
                }

                let request = String::from_utf8_lossy(&buf[..read]);
                let path = request
                    .lines()
                    .next()
                    .and_then(|line| line.split_whitespace().nth(1))
                    .unwrap_or("/")
                    .to_string();

                let route = routes.get(path.as_str()).cloned().unwrap_or(RawRoute {
                    status_line: "404 Not Found",
                    headers: vec![],
                    body: vec![],
                });

                let mut response = format!("HTTP/1.1 {}\r\n", route.status_line);
                for (name, value) in &route.headers {
                    response.push_str(&format!("{}: {}\r\n", name, value));
                }
                response.push_str(&format!(
                    "Content-Length: {}\r\nConnection: close\r\n\r\n",
                    route.body.len()
                ));

                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.write_all(&route.body).await;
                let _ = stream.shutdown().await;
            });
        }
    });

    addr
}
