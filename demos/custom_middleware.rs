//! Writing middleware: closures over `next`, per-route chains and path-scoped layers.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use log::info;

use microrouter_rs::router::middleware;
use microrouter_rs::{
    from_fn, App, BoxedHandler, Handler, HandlerBuilder, HttpRequest, Method, ResponseWriter, ServerConfig,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = ServerConfig {
        addr: "127.0.0.1:8082".parse()?,
        ..ServerConfig::default()
    };

    // Counts every request the application sees
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = {
        let hits = hits.clone();
        from_fn(move |res, req, next| {
            let n = hits.fetch_add(1, Ordering::Relaxed) + 1;
            res.set_header("X-Request-Count", n.to_string());
            next.serve(res, req);
        })
    };

    // The raw form: a transform from the next handler to a new handler
    let server_header = middleware(|next: BoxedHandler| -> BoxedHandler {
        Arc::new(move |res: &mut ResponseWriter, req: &mut HttpRequest| {
            next.serve(res, req);
            res.set_header("X-Served-By", "custom_middleware");
        })
    });

    let shout = from_fn(|res, req, next| {
        info!("Entering shout middleware for {path}", path = req.path);
        next.serve(res, req);
    });

    let greeting = HandlerBuilder::new(|res: &mut ResponseWriter, _req: &mut HttpRequest| {
        res.send_string("hello from a built handler");
    })
    .use_middleware(shout.clone())
    .build();

    let mut app = App::new();
    app.use_middleware(counter).use_middleware(server_header);

    let router = app.router();
    router
        .use_path("/secret", from_fn(|res, req, next| {
            if req.get_query_param("key").map(String::as_str) != Some("open-sesame") {
                res.status(microrouter_rs::StatusCode::Forbidden);
                res.send_string("Forbidden");
                return;
            }
            next.serve(res, req);
        }))
        .handle(Method::GET, "/shout", |res: &mut ResponseWriter, _req: &mut HttpRequest| {
            res.send_string("HELLO");
        }, &[shout])
        .get("/secret", |res: &mut ResponseWriter, _req: &mut HttpRequest| {
            res.send_string("the secret");
        })
        .get("/greeting", move |res: &mut ResponseWriter, req: &mut HttpRequest| greeting.serve(res, req))
        .get("/hits", move |res: &mut ResponseWriter, _req: &mut HttpRequest| {
            res.send_string(&hits.load(Ordering::Relaxed).to_string());
        });

    app.listen(config).await?;

    Ok(())
}
