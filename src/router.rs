use std::collections::{BTreeMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use reqwest::Client;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::error::ProxyError;
use crate::registry::HostPool;
use crate::types::{
    FanoutResponse, HostPayload, HostsResponse, ModelCommand, MutationResponse, ProxyConfig,
};

/// Timeout for the per-host model catalog query used by `/admin/list_models`.
const CATALOG_TIMEOUT: Duration = Duration::from_secs(15);

/// Swarm Proxy for a pool of Ollama backends
///
/// Distributes inference requests across dynamically registered hosts using
/// round-robin selection, fails over to the next untried host when a backend
/// errors, and streams the winning response back to the caller unmodified.
pub struct SwarmProxy {
    config: ProxyConfig,
    client: Client,
    pool: HostPool,
}

impl SwarmProxy {
    pub fn new(config: ProxyConfig) -> Result<Self, String> {
        config.validate()?;

        // No client-wide timeout: the deadline depends on the forwarded path
        // and is attached per request.
        let client = Client::builder()
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            config,
            client,
            pool: HostPool::new(),
        })
    }

    /// Create the Axum router with all endpoints
    pub fn create_router(self) -> Router {
        let shared_state = Arc::new(self);

        Router::new()
            .route("/register", post(register_host))
            .route("/unregister", post(unregister_host))
            .route("/hosts", get(list_hosts))
            .route("/admin/pull", post(admin_pull))
            .route("/admin/list_models", get(admin_list_models))
            .fallback(proxy_request)
            .with_state(shared_state)
    }

    /// Start the proxy server
    pub async fn start(self) -> Result<(), Box<dyn std::error::Error>> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        info!("Starting Ollama swarm proxy on {}", addr);

        let app = self.create_router();
        let listener = TcpListener::bind(&addr).await?;

        info!("Swarm proxy listening on {}", listener.local_addr()?);
        axum::serve(listener, app).await?;

        Ok(())
    }

    /// Model pulls can take minutes; everything else gets the short deadline.
    fn forward_timeout(&self, path: &str) -> Duration {
        if path.contains("pull") {
            Duration::from_secs(self.config.pull_timeout_secs)
        } else {
            Duration::from_secs(self.config.request_timeout_secs)
        }
    }

    /// Send one attempt to one host. A transport error and a non-2xx status
    /// are both host failures; the dispatch loop does not distinguish them.
    async fn forward(
        &self,
        method: &Method,
        path: &str,
        query: Option<&str>,
        body: Option<&Value>,
        host: &str,
    ) -> Result<reqwest::Response, ProxyError> {
        let mut url = format!("{}/{}", host.trim_end_matches('/'), path.trim_start_matches('/'));
        if let Some(q) = query {
            url.push('?');
            url.push_str(q);
        }
        let started = Instant::now();

        let builder = if *method == Method::GET {
            self.client.get(&url)
        } else {
            let mut builder = self.client.post(&url);
            if let Some(payload) = body {
                builder = builder.json(payload);
            }
            builder
        };

        let response = builder
            .timeout(self.forward_timeout(path))
            .send()
            .await
            .map_err(|e| {
                warn!(
                    "Failed → {} | {} /{} | {:.3}s | {}",
                    host,
                    method,
                    path,
                    started.elapsed().as_secs_f64(),
                    e
                );
                ProxyError::BackendTransport {
                    host: host.to_string(),
                    reason: e.to_string(),
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!("HTTP error → {} | {} /{} | status {}", host, method, path, status);
            return Err(ProxyError::BackendStatus {
                host: host.to_string(),
                status: status.as_u16(),
            });
        }

        info!(
            "Success → {} | {} /{} | {:.3}s",
            host,
            method,
            path,
            started.elapsed().as_secs_f64()
        );
        Ok(response)
    }

    /// Failover loop: pick a host round-robin, forward, and on failure move
    /// to the next untried host until one succeeds or the pool is exhausted.
    ///
    /// Each host is attempted at most once per inbound request, and the same
    /// parsed payload is replayed on every attempt.
    async fn dispatch(
        &self,
        method: Method,
        path: &str,
        query: Option<&str>,
        body: Option<Value>,
    ) -> Result<reqwest::Response, ProxyError> {
        let mut tried: HashSet<String> = HashSet::new();
        let mut current = self.pool.next()?;

        loop {
            tried.insert(current.clone());

            match self.forward(&method, path, query, body.as_ref(), &current).await {
                Ok(response) => return Ok(response),
                Err(err) => {
                    warn!("Host {} failed ({}), trying next", current, err);
                    match self.pool.next_untried(&current, &tried) {
                        Some(next) => current = next,
                        None => return Err(ProxyError::AllHostsExhausted),
                    }
                }
            }
        }
    }

    /// Stream a backend response to the caller, preserving the status code
    /// and content type. The body is relayed chunk by chunk, never buffered,
    /// so token-by-token generation streams arrive incrementally.
    fn relay(response: reqwest::Response) -> Response {
        let status =
            StatusCode::from_u16(response.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/json")
            .to_string();

        let body = Body::from_stream(response.bytes_stream());

        Response::builder()
            .status(status)
            .header(header::CONTENT_TYPE, content_type)
            .body(body)
            .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
    }

    /// Apply one backend call to every registered host independently and
    /// collect a per-host outcome map. One host's failure never aborts the
    /// others, and failures are recorded as `"failed: <reason>"` strings
    /// rather than propagated.
    async fn for_each_host<F, Fut>(&self, op: F) -> FanoutResponse
    where
        F: Fn(Client, String) -> Fut,
        Fut: Future<Output = Result<Value, String>> + Send + 'static,
    {
        let mut tasks = Vec::new();
        for host in self.pool.hosts() {
            let task = tokio::spawn(op(self.client.clone(), host.clone()));
            tasks.push((host, task));
        }

        let mut results = BTreeMap::new();
        for (host, task) in tasks {
            let outcome = match task.await {
                Ok(Ok(payload)) => payload,
                Ok(Err(reason)) => Value::String(format!("failed: {}", reason)),
                Err(e) => Value::String(format!("failed: {}", e)),
            };
            results.insert(host, outcome);
        }

        FanoutResponse { results }
    }
}

// ===== HTTP Endpoint Handlers =====

async fn register_host(
    State(proxy): State<Arc<SwarmProxy>>,
    Json(payload): Json<HostPayload>,
) -> Json<MutationResponse> {
    let added = proxy.pool.register(&payload.url);
    let hosts = proxy.pool.hosts();

    if added {
        info!("Registered new host: {} | Current hosts: {:?}", payload.url, hosts);
    } else {
        info!("Host already registered: {}", payload.url);
    }

    Json(MutationResponse {
        status: if added { "registered" } else { "already_registered" }.to_string(),
        hosts,
    })
}

async fn unregister_host(
    State(proxy): State<Arc<SwarmProxy>>,
    Json(payload): Json<HostPayload>,
) -> Json<MutationResponse> {
    let removed = proxy.pool.unregister(&payload.url);
    let hosts = proxy.pool.hosts();

    if removed {
        info!("Unregistered host: {} | Remaining: {:?}", payload.url, hosts);
    } else {
        info!("Host not found: {}", payload.url);
    }

    Json(MutationResponse {
        status: if removed { "unregistered" } else { "not_found" }.to_string(),
        hosts,
    })
}

async fn list_hosts(State(proxy): State<Arc<SwarmProxy>>) -> Json<HostsResponse> {
    Json(HostsResponse {
        hosts: proxy.pool.hosts(),
    })
}

async fn admin_pull(
    State(proxy): State<Arc<SwarmProxy>>,
    Json(command): Json<ModelCommand>,
) -> Json<FanoutResponse> {
    let timeout = Duration::from_secs(proxy.config.pull_timeout_secs);
    let model = command.model;
    info!("Pulling model {} on every registered host", model);

    let results = proxy
        .for_each_host(move |client, host| {
            let model = model.clone();
            async move {
                let started = Instant::now();
                let response = client
                    .post(format!("{}/api/pull", host))
                    .json(&json!({ "model": model }))
                    .timeout(timeout)
                    .send()
                    .await
                    .map_err(|e| e.to_string())?;

                if !response.status().is_success() {
                    warn!("Pull failed on {} | status {}", host, response.status());
                    return Err(format!("status {}", response.status()));
                }

                info!("Pull success on {} | {:.2}s", host, started.elapsed().as_secs_f64());
                Ok(Value::String("success".to_string()))
            }
        })
        .await;

    Json(results)
}

async fn admin_list_models(State(proxy): State<Arc<SwarmProxy>>) -> Json<FanoutResponse> {
    let results = proxy
        .for_each_host(|client, host| async move {
            let response = client
                .get(format!("{}/api/tags", host))
                .timeout(CATALOG_TIMEOUT)
                .send()
                .await
                .map_err(|e| e.to_string())?;

            if !response.status().is_success() {
                return Err(format!("status {}", response.status()));
            }

            response.json::<Value>().await.map_err(|e| e.to_string())
        })
        .await;

    Json(results)
}

/// Catch-all: forward any other path to a selected host and stream the reply.
async fn proxy_request(
    State(proxy): State<Arc<SwarmProxy>>,
    request: Request,
) -> Result<Response, ProxyError> {
    let started = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().trim_start_matches('/').to_string();
    let query = request.uri().query().map(|q| q.to_string());

    if method != Method::GET && method != Method::POST {
        return Ok(StatusCode::METHOD_NOT_ALLOWED.into_response());
    }

    // Parse the body once; every retry replays the same payload.
    let body = if method == Method::POST {
        match axum::body::to_bytes(request.into_body(), usize::MAX).await {
            Ok(bytes) if bytes.is_empty() => None,
            Ok(bytes) => match serde_json::from_slice::<Value>(&bytes) {
                Ok(value) => Some(value),
                Err(e) => {
                    return Ok((
                        StatusCode::BAD_REQUEST,
                        Json(json!({ "detail": format!("invalid JSON body: {}", e) })),
                    )
                        .into_response());
                }
            },
            Err(e) => {
                return Ok((
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "detail": format!("failed to read request body: {}", e) })),
                )
                    .into_response());
            }
        }
    } else {
        None
    };

    let response = proxy.dispatch(method, &path, query.as_deref(), body).await?;

    info!(
        "Total request time: {:.3}s | Path: /{}",
        started.elapsed().as_secs_f64(),
        path
    );

    Ok(SwarmProxy::relay(response))
}
