//! Tests for route compilation, dispatch, mounting and middleware order.

#[cfg(test)]
mod router_tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use crate::parser::{HttpRequest, HttpVersion, Method};
    use crate::router::{chain_middleware, from_fn, middleware, App, HandlerBuilder, Middleware, RoutePattern, Router};
    use crate::server::{BoxedHandler, Handler, ResponseWriter, StatusCode};

    type Log = Arc<Mutex<Vec<String>>>;

    fn request(method: Method, path: &str) -> HttpRequest {
        HttpRequest::new(method, path, HttpVersion::Http11, HashMap::new())
    }

    fn dispatch(handler: &dyn Handler, req: &mut HttpRequest) -> ResponseWriter {
        let mut res = ResponseWriter::new();
        handler.serve(&mut res, req);
        res
    }

    fn body(res: &ResponseWriter) -> String {
        String::from_utf8_lossy(res.body()).to_string()
    }

    fn reply(text: &'static str) -> impl Handler {
        move |res: &mut ResponseWriter, _req: &mut HttpRequest| {
            res.send_string(text);
        }
    }

    // Records "<name>-before" and "<name>-after" around the inner handler
    fn tracing(name: &'static str, log: &Log) -> Middleware {
        let log = log.clone();
        from_fn(move |res, req, next| {
            log.lock().unwrap().push(format!("{name}-before"));
            next.serve(res, req);
            log.lock().unwrap().push(format!("{name}-after"));
        })
    }

    fn recording(name: &'static str, log: &Log) -> impl Handler {
        let log = log.clone();
        move |res: &mut ResponseWriter, _req: &mut HttpRequest| {
            log.lock().unwrap().push(name.to_string());
            res.send_string(name);
        }
    }

    #[test]
    fn test_pattern_param_names_in_order() {
        let pattern = RoutePattern::compile("/users/:userId/posts/:postId");
        assert_eq!(pattern.template(), "/users/:userId/posts/:postId");
        assert_eq!(pattern.param_names(), vec!["userId", "postId"]);
        assert!(pattern.is_dynamic());
        assert!(!RoutePattern::compile("/health").is_dynamic());
    }

    #[test]
    fn test_pattern_matching() {
        let pattern = RoutePattern::compile("/users/:id");

        let params = pattern.matches("/users/123").unwrap();
        assert_eq!(params.get("id").unwrap(), "123");

        // anchored, same segment count, non-empty captures
        assert!(pattern.matches("/users").is_none());
        assert!(pattern.matches("/users/").is_none());
        assert!(pattern.matches("/users/123/posts").is_none());
        assert!(pattern.matches("/accounts/123").is_none());
        assert!(pattern.matches("/Users/123").is_none());
    }

    #[test]
    fn test_pattern_empty_segments_are_literal() {
        let pattern = RoutePattern::compile("/a//:id");
        assert!(pattern.matches("/a//7").is_some());
        assert!(pattern.matches("/a/7").is_none());
    }

    #[test]
    fn test_pattern_no_decoding() {
        let pattern = RoutePattern::compile("/files/:name");
        let params = pattern.matches("/files/a%20b").unwrap();
        assert_eq!(params.get("name").unwrap(), "a%20b");
    }

    #[test]
    fn test_pattern_duplicate_names_last_wins() {
        let pattern = RoutePattern::compile("/:id/:id");
        let params = pattern.matches("/first/second").unwrap();
        assert_eq!(params.get("id").unwrap(), "second");
        assert_eq!(pattern.param_names(), vec!["id", "id"]);
    }

    #[test]
    fn test_exact_path_matching() {
        let mut router = Router::new();
        router.get("/users", reply("users"));

        let res = dispatch(&router, &mut request(Method::GET, "/users"));
        assert_eq!(res.status_code(), StatusCode::Ok);
        assert_eq!(body(&res), "users");
    }

    #[test]
    fn test_parameter_extraction() {
        let mut router = Router::new();
        router.get("/users/:userId/posts/:postId", |res: &mut ResponseWriter, req: &mut HttpRequest| {
            let text = format!("{}:{}", req.param("userId").unwrap(), req.param("postId").unwrap());
            res.send_string(&text);
        });

        let mut req = request(Method::GET, "/users/456/posts/789");
        let res = dispatch(&router, &mut req);
        assert_eq!(body(&res), "456:789");
        assert_eq!(req.params.get("userId").unwrap(), "456");
        assert_eq!(req.params.get("postId").unwrap(), "789");
    }

    #[test]
    fn test_exact_match_precedence_regardless_of_order() {
        let mut dynamic_first = Router::new();
        dynamic_first
            .get("/users/:id", reply("dynamic"))
            .get("/users/me", reply("exact"));

        let mut exact_first = Router::new();
        exact_first
            .get("/users/me", reply("exact"))
            .get("/users/:id", reply("dynamic"));

        for router in [&dynamic_first, &exact_first] {
            let mut req = request(Method::GET, "/users/me");
            let res = dispatch(router, &mut req);
            assert_eq!(body(&res), "exact");
            assert!(req.params.is_empty());

            let res = dispatch(router, &mut request(Method::GET, "/users/42"));
            assert_eq!(body(&res), "dynamic");
        }
    }

    #[test]
    fn test_parameter_isolation() {
        let mut router = Router::new();
        router
            .get("/users/:userId", reply("user"))
            .get("/orders/:orderId", reply("order"));

        let mut req = request(Method::GET, "/users/1");
        dispatch(&router, &mut req);
        assert_eq!(req.params.get("userId").unwrap(), "1");

        // The same request object is reused for a second dispatch
        req.path = "/orders/2".to_string();
        dispatch(&router, &mut req);
        assert_eq!(req.params.get("orderId").unwrap(), "2");
        assert!(!req.params.contains_key("userId"));
    }

    #[test]
    fn test_not_found() {
        let mut router = Router::new();
        router.get("/users", reply("users"));

        let res = dispatch(&router, &mut request(Method::GET, "/missing"));
        assert_eq!(res.status_code(), StatusCode::NotFound);
        assert!(body(&res).contains("404"));
        assert_eq!(res.get_header("Content-Type").unwrap(), "text/plain");
    }

    #[test]
    fn test_method_mismatch_is_not_found() {
        let mut router = Router::new();
        router.get("/users", reply("users"));

        let res = dispatch(&router, &mut request(Method::POST, "/users"));
        assert_eq!(res.status_code(), StatusCode::NotFound);
    }

    #[test]
    fn test_dynamic_match_continues_past_other_methods() {
        let mut router = Router::new();
        router
            .post("/items/:id", reply("post-item"))
            .get("/items/:name", reply("get-item"));

        let mut req = request(Method::GET, "/items/widget");
        let res = dispatch(&router, &mut req);
        assert_eq!(body(&res), "get-item");
        assert_eq!(req.params.get("name").unwrap(), "widget");
        assert!(!req.params.contains_key("id"));
    }

    #[test]
    fn test_overlapping_templates_use_registration_order() {
        let mut router = Router::new();
        router
            .get("/:a/static", reply("first"))
            .get("/files/:b", reply("second"));

        let res = dispatch(&router, &mut request(Method::GET, "/files/static"));
        assert_eq!(body(&res), "first");
    }

    #[test]
    fn test_shared_template_across_methods() {
        let mut router = Router::new();
        router
            .get("/things/:id", reply("get"))
            .post("/things/:id", reply("post"));

        assert_eq!(body(&dispatch(&router, &mut request(Method::GET, "/things/1"))), "get");
        assert_eq!(body(&dispatch(&router, &mut request(Method::POST, "/things/1"))), "post");
        assert_eq!(
            router.routes(),
            vec![(Method::GET, "/things/:id"), (Method::POST, "/things/:id")]
        );
    }

    #[test]
    fn test_reregistration_overwrites() {
        let mut router = Router::new();
        router.get("/x", reply("old")).get("/x", reply("new"));
        router.get("/y/:id", reply("old")).get("/y/:id", reply("new"));

        assert_eq!(body(&dispatch(&router, &mut request(Method::GET, "/x"))), "new");
        assert_eq!(body(&dispatch(&router, &mut request(Method::GET, "/y/1"))), "new");
        assert_eq!(router.routes().len(), 2);
    }

    #[test]
    fn test_all_verbs_chain() {
        let mut router = Router::new();
        router
            .get("/r", reply("GET"))
            .post("/r", reply("POST"))
            .put("/r", reply("PUT"))
            .delete("/r", reply("DELETE"))
            .patch("/r", reply("PATCH"))
            .head("/r", reply("HEAD"))
            .options("/r", reply("OPTIONS"));

        for method in Method::ALL {
            let res = dispatch(&router, &mut request(method, "/r"));
            assert_eq!(body(&res), method.as_str());
        }
    }

    #[test]
    fn test_middleware_order() {
        let log: Log = Arc::default();
        let mut router = Router::new();
        router
            .use_middleware(tracing("m1", &log))
            .use_middleware(tracing("m2", &log))
            .get("/", recording("handler", &log));

        dispatch(&router, &mut request(Method::GET, "/"));
        assert_eq!(
            *log.lock().unwrap(),
            vec!["m1-before", "m2-before", "handler", "m2-after", "m1-after"]
        );
    }

    #[test]
    fn test_middleware_captured_at_registration() {
        let log: Log = Arc::default();
        let mut router = Router::new();
        router.get("/early", recording("early", &log));
        router.use_middleware(tracing("late", &log));
        router.get("/after", recording("after", &log));

        dispatch(&router, &mut request(Method::GET, "/early"));
        assert_eq!(*log.lock().unwrap(), vec!["early"]);

        log.lock().unwrap().clear();
        dispatch(&router, &mut request(Method::GET, "/after"));
        assert_eq!(*log.lock().unwrap(), vec!["late-before", "after", "late-after"]);
    }

    #[test]
    fn test_router_path_and_route_middleware_order() {
        let log: Log = Arc::default();
        let mut router = Router::new();
        router
            .use_middleware(tracing("router", &log))
            .use_path("/p", tracing("path", &log))
            .handle(Method::GET, "/p", recording("handler", &log), &[tracing("route", &log)])
            .get("/other", recording("other", &log));

        dispatch(&router, &mut request(Method::GET, "/p"));
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "router-before",
                "path-before",
                "route-before",
                "handler",
                "route-after",
                "path-after",
                "router-after"
            ]
        );

        log.lock().unwrap().clear();
        dispatch(&router, &mut request(Method::GET, "/other"));
        assert_eq!(*log.lock().unwrap(), vec!["router-before", "other", "router-after"]);
    }

    #[test]
    fn test_chain_middleware_first_is_outermost() {
        let log: Log = Arc::default();
        let handler: BoxedHandler = Arc::new(recording("h", &log));
        let composed = chain_middleware(handler, &[tracing("a", &log), tracing("b", &log)]);

        dispatch(composed.as_ref(), &mut request(Method::GET, "/"));
        assert_eq!(*log.lock().unwrap(), vec!["a-before", "b-before", "h", "b-after", "a-after"]);
    }

    #[test]
    fn test_handler_builder() {
        let log: Log = Arc::default();
        let handler = HandlerBuilder::new(recording("h", &log))
            .use_middleware(tracing("first", &log))
            .use_middleware(tracing("second", &log))
            .build();

        dispatch(handler.as_ref(), &mut request(Method::GET, "/"));
        assert_eq!(
            *log.lock().unwrap(),
            vec!["first-before", "second-before", "h", "second-after", "first-after"]
        );
    }

    #[test]
    fn test_middleware_can_short_circuit() {
        let deny = middleware(|_next: BoxedHandler| -> BoxedHandler {
            Arc::new(|res: &mut ResponseWriter, _req: &mut HttpRequest| {
                res.status(StatusCode::Unauthorized);
                res.send_string("denied");
            })
        });

        let mut router = Router::new();
        router.handle(Method::GET, "/secret", reply("secret"), &[deny]);

        let res = dispatch(&router, &mut request(Method::GET, "/secret"));
        assert_eq!(res.status_code(), StatusCode::Unauthorized);
        assert_eq!(body(&res), "denied");
    }

    #[test]
    fn test_router_is_a_handler() {
        let mut inner = Router::new();
        inner.get("/ping", reply("pong"));

        let mut outer = Router::new();
        outer.get("/ping", inner);

        assert_eq!(body(&dispatch(&outer, &mut request(Method::GET, "/ping"))), "pong");
    }

    fn seen_path(log: &Log) -> impl Handler {
        let log = log.clone();
        move |res: &mut ResponseWriter, req: &mut HttpRequest| {
            log.lock().unwrap().push(req.path.clone());
            res.send_string("ok");
        }
    }

    #[test]
    fn test_longest_prefix_mount() {
        let log: Log = Arc::default();

        let mut api = Router::new();
        api.get("/admin/stats", reply("api"));
        let mut admin = Router::new();
        admin.get("/stats", seen_path(&log));

        let mut app = App::new();
        app.route("/api", api, &[])
            .route("/api/admin", admin, &[]);
        assert_eq!(app.prefixes(), vec!["/api/admin", "/api"]);

        let mut req = request(Method::GET, "/api/admin/stats");
        let res = dispatch(&app, &mut req);
        assert_eq!(body(&res), "ok");
        assert_eq!(*log.lock().unwrap(), vec!["/stats"]);

        // Restored after dispatch
        assert_eq!(req.path, "/api/admin/stats");
    }

    #[test]
    fn test_mount_prefix_requires_segment_boundary() {
        let mut short = Router::new();
        short.get("/rs", reply("mounted"));

        let mut app = App::new();
        app.route("/use", short, &[])
            .get("/users", reply("root"));

        assert_eq!(body(&dispatch(&app, &mut request(Method::GET, "/users"))), "root");
    }

    #[test]
    fn test_mount_root_of_prefix() {
        let log: Log = Arc::default();
        let mut users = Router::new();
        users.get("/", seen_path(&log));

        let mut app = App::new();
        app.route("/users", users, &[]);

        let mut req = request(Method::GET, "/users");
        assert_eq!(body(&dispatch(&app, &mut req)), "ok");
        assert_eq!(*log.lock().unwrap(), vec!["/"]);
        assert_eq!(req.path, "/users");
    }

    #[test]
    fn test_mount_at_slash_keeps_path() {
        let log: Log = Arc::default();
        let mut everything = Router::new();
        everything.get("/a/b", seen_path(&log));

        let mut app = App::new();
        app.route("", everything, &[]);
        assert_eq!(app.prefixes(), vec!["/"]);

        assert_eq!(body(&dispatch(&app, &mut request(Method::GET, "/a/b"))), "ok");
        assert_eq!(*log.lock().unwrap(), vec!["/a/b"]);
    }

    #[test]
    fn test_mounted_params() {
        let mut users = Router::new();
        users.get("/:id", |res: &mut ResponseWriter, req: &mut HttpRequest| {
            let id = req.param("id").unwrap_or_default().to_string();
            res.send_string(&id);
        });

        let mut app = App::new();
        app.route("/users", users, &[]);

        let mut req = request(Method::GET, "/users/123");
        assert_eq!(body(&dispatch(&app, &mut req)), "123");
        assert_eq!(req.params.get("id").unwrap(), "123");
    }

    #[test]
    fn test_unmatched_request_reaches_root() {
        let mut api = Router::new();
        api.get("/items", reply("items"));

        let mut app = App::new();
        app.route("/api", api, &[]).get("/health", reply("healthy"));

        assert_eq!(body(&dispatch(&app, &mut request(Method::GET, "/health"))), "healthy");
        let res = dispatch(&app, &mut request(Method::GET, "/nowhere"));
        assert_eq!(res.status_code(), StatusCode::NotFound);
    }

    #[test]
    fn test_matched_mount_does_not_fall_through_to_root() {
        let log: Log = Arc::default();
        let mut api = Router::new();
        api.get("/items", recording("mount", &log));

        let mut app = App::new();
        app.route("/api", api, &[])
            .get("/api/items", recording("root", &log))
            .get("/api/other", recording("root-other", &log));

        let res = dispatch(&app, &mut request(Method::GET, "/api/items"));
        assert_eq!(body(&res), "mount");
        assert_eq!(*log.lock().unwrap(), vec!["mount"]);

        // The mount claims the path, so its own 404 is the answer
        let res = dispatch(&app, &mut request(Method::GET, "/api/other"));
        assert_eq!(res.status_code(), StatusCode::NotFound);
        assert_eq!(*log.lock().unwrap(), vec!["mount"]);
    }

    #[test]
    fn test_remount_same_prefix_overwrites() {
        let mut first = Router::new();
        first.get("/", reply("first"));
        let mut second = Router::new();
        second.get("/", reply("second"));

        let mut app = App::new();
        app.route("/v1", first, &[]).route("/v1", second, &[]);
        assert_eq!(app.prefixes(), vec!["/v1"]);

        assert_eq!(body(&dispatch(&app, &mut request(Method::GET, "/v1"))), "second");
    }

    #[test]
    fn test_equal_length_prefixes_keep_mount_order() {
        let mut app = App::new();
        app.route("/aa", Router::new(), &[])
            .route("/bb", Router::new(), &[])
            .route("/c", Router::new(), &[])
            .route("/dddd", Router::new(), &[]);
        assert_eq!(app.prefixes(), vec!["/dddd", "/aa", "/bb", "/c"]);
    }

    #[test]
    fn test_global_mount_route_middleware_order() {
        let log: Log = Arc::default();
        let mut api = Router::new();
        api.handle(Method::GET, "/x", recording("handler", &log), &[tracing("route", &log)]);

        let mut app = App::new();
        app.use_middleware(tracing("global", &log))
            .route("/api", api, &[tracing("mount", &log)]);

        dispatch(&app, &mut request(Method::GET, "/api/x"));
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "global-before",
                "mount-before",
                "route-before",
                "handler",
                "route-after",
                "mount-after",
                "global-after"
            ]
        );
    }

    #[test]
    fn test_global_middleware_added_after_mount_applies() {
        let log: Log = Arc::default();
        let mut api = Router::new();
        api.get("/x", recording("handler", &log));

        let mut app = App::new();
        app.route("/api", api, &[tracing("mount", &log)])
            .use_middleware(tracing("global", &log));

        // Repeated dispatches reuse the composed chain
        for _ in 0..2 {
            dispatch(&app, &mut request(Method::GET, "/api/x"));
        }
        let expected = ["global-before", "mount-before", "handler", "mount-after", "global-after"];
        assert_eq!(*log.lock().unwrap(), [expected, expected].concat());
    }

    #[test]
    fn test_global_middleware_wraps_root_router() {
        let log: Log = Arc::default();
        let mut app = App::new();
        app.get("/", recording("root", &log));
        app.use_middleware(tracing("global", &log));

        dispatch(&app, &mut request(Method::GET, "/"));
        assert_eq!(*log.lock().unwrap(), vec!["global-before", "root", "global-after"]);
    }

    #[test]
    fn test_global_middleware_sees_original_path_after_mount() {
        let log: Log = Arc::default();
        let after = {
            let log = log.clone();
            from_fn(move |res, req, next| {
                next.serve(res, req);
                log.lock().unwrap().push(req.path.clone());
            })
        };

        let mut api = Router::new();
        api.get("/x", reply("x"));

        let mut app = App::new();
        app.use_middleware(after).route("/api", api, &[]);

        let mut req = request(Method::GET, "/api/x");
        dispatch(&app, &mut req);
        // The global layer runs inside the rewrite, the caller sees the original
        assert_eq!(*log.lock().unwrap(), vec!["/x"]);
        assert_eq!(req.path, "/api/x");
    }

    #[test]
    fn test_app_registration_chains() {
        let mut app = App::new();
        app.get("/", reply("GET"))
            .post("/", reply("POST"))
            .put("/", reply("PUT"))
            .delete("/", reply("DELETE"))
            .patch("/", reply("PATCH"))
            .head("/", reply("HEAD"))
            .options("/", reply("OPTIONS"))
            .route("/sub", Router::new(), &[])
            .use_middleware(middleware(|next| next));

        assert_eq!(body(&dispatch(&app, &mut request(Method::PATCH, "/"))), "PATCH");
        assert_eq!(app.router().routes().len(), 7);
    }

    #[test]
    fn test_shared_router_mounted_twice() {
        let mut shared = Router::new();
        shared.get("/ping", reply("pong"));
        let shared = Arc::new(shared);

        let mut app = App::new();
        app.route("/v1", shared.clone(), &[])
            .route("/v2", shared, &[]);

        assert_eq!(body(&dispatch(&app, &mut request(Method::GET, "/v1/ping"))), "pong");
        assert_eq!(body(&dispatch(&app, &mut request(Method::GET, "/v2/ping"))), "pong");
    }

    #[test]
    fn test_concurrent_dispatch() {
        let mut router = Router::new();
        router.get("/n/:value", |res: &mut ResponseWriter, req: &mut HttpRequest| {
            let value = req.param("value").unwrap_or_default().to_string();
            res.send_string(&value);
        });
        let router = Arc::new(router);

        let threads: Vec<_> = (0..8)
            .map(|i| {
                let router = router.clone();
                std::thread::spawn(move || {
                    let mut req = request(Method::GET, &format!("/n/{i}"));
                    let res = dispatch(router.as_ref(), &mut req);
                    assert_eq!(body(&res), i.to_string());
                })
            })
            .collect();

        for thread in threads {
            thread.join().unwrap();
        }
    }
}
