//! Scripted HTTP transport

use async_trait::async_trait;
use guildsync::http::{HttpRequest, HttpResponse, HttpTransport, TransportError};
use reqwest::Method;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

enum Scripted {
    Response(HttpResponse),
    NetworkError(String),
}

struct Route {
    method: Method,
    pattern: String,
    queue: VecDeque<Scripted>,
}

/// Answers requests from per-route queues
///
/// A request is matched against routes in registration order by method and
/// URL substring; the first route with a queued answer serves it. Requests
/// nobody scripted fail with a network error naming the URL.
#[derive(Default)]
pub struct FakeTransport {
    routes: Mutex<Vec<Route>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, method: Method, pattern: &str, item: Scripted) {
        let mut routes = self.routes.lock().unwrap();
        if let Some(route) = routes
            .iter_mut()
            .find(|r| r.method == method && r.pattern == pattern)
        {
            route.queue.push_back(item);
            return;
        }
        routes.push(Route {
            method,
            pattern: pattern.to_string(),
            queue: VecDeque::from([item]),
        });
    }

    /// Queue a raw response
    pub fn on(&self, method: Method, pattern: &str, response: HttpResponse) -> &Self {
        self.push(method, pattern, Scripted::Response(response));
        self
    }

    /// Queue a JSON response
    pub fn on_json(&self, method: Method, pattern: &str, status: u16, body: Value) -> &Self {
        self.on(method, pattern, HttpResponse::json(status, &body))
    }

    /// Queue a network failure
    pub fn on_network_error(&self, method: Method, pattern: &str, message: &str) -> &Self {
        self.push(method, pattern, Scripted::NetworkError(message.to_string()));
        self
    }

    /// Every request sent so far, in order
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests whose URL contains `pattern`
    pub fn requests_matching(&self, pattern: &str) -> Vec<HttpRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.url.contains(pattern))
            .collect()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Scripted answers not consumed
    pub fn pending(&self) -> usize {
        self.routes.lock().unwrap().iter().map(|r| r.queue.len()).sum()
    }
}

#[async_trait]
impl HttpTransport for FakeTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let scripted = {
            let mut routes = self.routes.lock().unwrap();
            routes
                .iter_mut()
                .filter(|r| r.method == request.method && request.url.contains(&r.pattern))
                .find_map(|r| r.queue.pop_front())
        };

        let description = format!("{} {}", request.method, request.url);
        self.requests.lock().unwrap().push(request);

        match scripted {
            Some(Scripted::Response(response)) => Ok(response),
            Some(Scripted::NetworkError(message)) => Err(TransportError::Network(message)),
            None => Err(TransportError::Network(format!(
                "unscripted request: {}",
                description
            ))),
        }
    }
}
