//! Routers grouped under path prefixes, each with its own middleware.

use std::sync::Arc;
use log::info;

use microrouter_rs::middleware::{cors, rate_limit, response_time, CorsOptions, RateLimiter, ResponseTimeOptions};
use microrouter_rs::{send_error, from_fn, App, HttpRequest, ResponseWriter, Router, ServerConfig, StatusCode};

fn users_router() -> Router {
    let mut users = Router::new();
    users
        .get("/", |res: &mut ResponseWriter, _req: &mut HttpRequest| {
            res.send_string("List of users");
        })
        .get("/:id", |res: &mut ResponseWriter, req: &mut HttpRequest| {
            let id = req.param("id").unwrap_or_default().to_string();
            res.send_string(&format!("User {id}"));
        })
        .post("/", |res: &mut ResponseWriter, _req: &mut HttpRequest| {
            res.status(StatusCode::Created);
            res.send_string("User created");
        });
    users
}

fn admin_router() -> Router {
    let require_token = from_fn(|res, req, next| {
        if req.get_header("Authorization").is_none() {
            let _ = send_error(res, StatusCode::Unauthorized, "missing Authorization header");
            return;
        }
        next.serve(res, req);
    });

    let mut admin = Router::new();
    admin
        .use_middleware(require_token)
        .get("/dashboard", |res: &mut ResponseWriter, _req: &mut HttpRequest| {
            res.send_string("Admin dashboard");
        })
        .get("/stats/:statId", |res: &mut ResponseWriter, req: &mut HttpRequest| {
            let stat_id = req.param("statId").unwrap_or_default().to_string();
            res.send_string(&format!("Stat {stat_id}"));
        });
    admin
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = ServerConfig {
        addr: "127.0.0.1:8081".parse()?,
        ..ServerConfig::default()
    };

    let limiter = Arc::new(RateLimiter::per_minute(60));

    let mut app = App::new();
    app.use_middleware(response_time(ResponseTimeOptions::default()));
    app.get("/", |res: &mut ResponseWriter, _req: &mut HttpRequest| {
        res.send_string("Home");
    })
    .route("/api/users", users_router(), &[cors(CorsOptions::default())])
    .route("/api/admin", admin_router(), &[rate_limit(limiter)]);

    info!("Mounted prefixes: {prefixes:?}", prefixes = app.prefixes());
    app.listen(config).await?;

    Ok(())
}
