//! A basic application with global middleware, path parameters and JSON responses.

use log::{error, info};
use serde_json::json;

use microrouter_rs::middleware::{logger, recovery, request_id, RecoveryOptions, RequestIdOptions};
use microrouter_rs::{App, HttpRequest, ResponseWriter, ServerConfig, StatusCode};

fn send_json(res: &mut ResponseWriter, value: serde_json::Value) {
    if let Err(e) = res.json(StatusCode::Ok, &value) {
        error!("Failed to serialize response: {e}");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = ServerConfig {
        addr: "127.0.0.1:8080".parse()?,
        ..ServerConfig::default()
    };

    let mut app = App::new();
    app.use_middleware(logger())
        .use_middleware(recovery(RecoveryOptions { log: true }))
        .use_middleware(request_id(RequestIdOptions::default()));

    app.get("/", |res: &mut ResponseWriter, _req: &mut HttpRequest| {
        send_json(res, json!({ "message": "Welcome to microrouter-rs!" }));
    })
    .get("/hello", |res: &mut ResponseWriter, req: &mut HttpRequest| {
        let name = req.get_query_param("name").map_or("World", |s| s.as_str()).to_string();
        res.status(StatusCode::Ok).set_header("Content-Type", "text/plain");
        res.send_string(&format!("Hello, {name}!"));
    })
    .get("/users/:id", |res: &mut ResponseWriter, req: &mut HttpRequest| {
        let id = req.param("id").unwrap_or_default().to_string();
        send_json(res, json!({ "userId": id }));
    })
    .get("/admin/:id/stat/:statId", |res: &mut ResponseWriter, req: &mut HttpRequest| {
        let id = req.param("id").unwrap_or_default().to_string();
        let stat_id = req.param("statId").unwrap_or_default().to_string();
        send_json(res, json!({ "adminId": id, "statId": stat_id }));
    })
    .post("/echo", |res: &mut ResponseWriter, req: &mut HttpRequest| {
        let body = String::from_utf8_lossy(&req.body).to_string();
        send_json(res, json!({ "received": body }));
    })
    .get("/panic", |_res: &mut ResponseWriter, _req: &mut HttpRequest| {
        panic!("this route always fails");
    });

    info!("Starting server on http://{addr}", addr = config.addr);
    app.listen(config).await?;

    Ok(())
}
