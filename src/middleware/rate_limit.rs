//! Per-client request rate limiting.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use log::warn;

use crate::router::{from_fn, Middleware};
use crate::server::StatusCode;

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    started: Instant,
}

#[derive(Debug)]
struct Clients {
    windows: HashMap<String, Window>,
    last_sweep: Instant,
}

impl Clients {
    fn sweep(&mut self, now: Instant, window: Duration) {
        self.windows
            .retain(|_, w| now.saturating_duration_since(w.started) < window);
        self.last_sweep = now;
    }
}

/// Fixed-window request counter keyed by client IP.
///
/// Each client gets `requests_per_window` requests per window; the window
/// restarts with the first request after it has elapsed. The limiter owns
/// its state, so separate instances never share counts.
///
/// Expired clients are dropped at most once per window, on the first check
/// after the window has passed, so the map only holds clients seen recently.
#[derive(Debug)]
pub struct RateLimiter {
    requests_per_window: u32,
    window: Duration,
    clients: Mutex<Clients>,
}

impl RateLimiter {
    /// A limiter allowing `requests_per_minute` requests per client per minute.
    pub fn per_minute(requests_per_minute: u32) -> Self {
        Self::new(requests_per_minute, Duration::from_secs(60))
    }

    pub fn new(requests_per_window: u32, window: Duration) -> Self {
        Self {
            requests_per_window,
            window,
            clients: Mutex::new(Clients {
                windows: HashMap::new(),
                last_sweep: Instant::now(),
            }),
        }
    }

    /// Count a request from `client` and report whether it is allowed.
    pub fn check(&self, client: &str) -> bool {
        self.check_at(client, Instant::now())
    }

    /// [`check`](Self::check) with an explicit clock reading.
    pub fn check_at(&self, client: &str, now: Instant) -> bool {
        let mut clients = self.clients.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if now.saturating_duration_since(clients.last_sweep) >= self.window {
            clients.sweep(now, self.window);
        }

        match clients.windows.get_mut(client) {
            Some(window) if now.saturating_duration_since(window.started) < self.window => {
                if window.count >= self.requests_per_window {
                    return false;
                }
                window.count += 1;
                true
            }
            Some(window) => {
                *window = Window { count: 1, started: now };
                true
            }
            None => {
                clients.windows.insert(client.to_string(), Window { count: 1, started: now });
                true
            }
        }
    }

    /// Drop clients whose window has elapsed.
    pub fn cleanup(&self) {
        let mut clients = self.clients.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        clients.sweep(Instant::now(), self.window);
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.clients
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .windows
            .len()
    }
}

/// Reject requests over the limiter's quota with 429 Too Many Requests.
pub fn rate_limit(limiter: Arc<RateLimiter>) -> Middleware {
    from_fn(move |res, req, next| {
        if !limiter.check(&req.client_ip) {
            warn!("Rate limit exceeded for {client}", client = req.client_ip);
            res.status(StatusCode::TooManyRequests);
            res.send("Too Many Requests");
            return;
        }
        next.serve(res, req);
    })
}
