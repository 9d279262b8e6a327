use std::io::Read as _;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context as _;
use photoframe::{ApiRequest, ApiResponse, PhotoframeApi};

/// Bind the HTTP listener.
pub fn bind(listen: &str) -> anyhow::Result<Arc<tiny_http::Server>> {
    let server = tiny_http::Server::http(listen)
        .map_err(|e| anyhow::anyhow!("bind '{listen}': {e}"))?;
    Ok(Arc::new(server))
}

/// Serve requests on `workers` threads until every worker exits.
pub fn run(server: Arc<tiny_http::Server>, api: PhotoframeApi, workers: usize) -> anyhow::Result<()> {
    let api = Arc::new(api);
    let handles = (0..workers.max(1))
        .map(|i| {
            let server = server.clone();
            let api = api.clone();
            std::thread::Builder::new()
                .name(format!("photoframe-http-{i}"))
                .spawn(move || worker_loop(&server, &api))
                .with_context(|| format!("spawn http worker {i}"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    for h in handles {
        if h.join().is_err() {
            anyhow::bail!("http worker panicked");
        }
    }
    Ok(())
}

fn worker_loop(server: &tiny_http::Server, api: &PhotoframeApi) {
    loop {
        match server.recv() {
            Ok(request) => serve_one(request, api),
            Err(err) => {
                tracing::warn!(error = %err, "listener closed");
                return;
            }
        }
    }
}

enum BodyError {
    TooLarge,
    Io(std::io::Error),
}

fn read_body(request: &mut tiny_http::Request, limit: usize) -> Result<Vec<u8>, BodyError> {
    if request.body_length().is_some_and(|n| n > limit) {
        return Err(BodyError::TooLarge);
    }
    let mut body = Vec::new();
    request
        .as_reader()
        .take(limit as u64 + 1)
        .read_to_end(&mut body)
        .map_err(BodyError::Io)?;
    if body.len() > limit {
        return Err(BodyError::TooLarge);
    }
    Ok(body)
}

fn serve_one(mut request: tiny_http::Request, api: &PhotoframeApi) {
    let started = Instant::now();
    let method = request.method().to_string();
    let path = request.url().to_string();
    let limit = api.max_body_bytes();

    let response = match read_body(&mut request, limit) {
        Ok(body) => {
            let headers = request
                .headers()
                .iter()
                .map(|h| (h.field.as_str().as_str().to_string(), h.value.as_str().to_string()))
                .collect();
            api.handle(&ApiRequest {
                method: method.clone(),
                path: path.clone(),
                headers,
                body,
            })
        }
        Err(BodyError::TooLarge) => {
            ApiResponse::error(413, format!("request body exceeds {limit} bytes"))
        }
        Err(BodyError::Io(err)) => {
            tracing::debug!(error = %err, "failed to read request body");
            ApiResponse::error(400, "unreadable request body")
        }
    };

    let status = response.status;
    if let Err(err) = request.respond(into_http(response)) {
        tracing::debug!(error = %err, "client went away before the response was sent");
    }
    tracing::info!(
        %method,
        %path,
        status,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request"
    );
}

fn into_http(response: ApiResponse) -> tiny_http::Response<std::io::Cursor<Vec<u8>>> {
    let mut out = tiny_http::Response::from_data(response.body)
        .with_status_code(tiny_http::StatusCode(response.status));
    let headers = std::iter::once(("Content-Type".to_string(), response.content_type))
        .chain(response.headers);
    for (name, value) in headers {
        match tiny_http::Header::from_bytes(name.as_bytes(), value.as_bytes()) {
            Ok(h) => out.add_header(h),
            Err(()) => tracing::warn!(%name, "dropping invalid response header"),
        }
    }
    out
}

#[cfg(test)]
#[path = "../tests/unit/server.rs"]
mod tests;
