//! Sub-application mounting.

use axum::http::{Method, StatusCode};
use stackroute::{status_text, text, App, HandlerError, HttpError};

mod common;

use common::{fetch, TextState};

#[tokio::test]
async fn test_mount_composes_all_path_segments() {
    let mut inner: App<()> = App::with_base_path("/api");
    inner.get("/users", |_ctx| Box::pin(async move { Ok(text("users")) }));

    let mut app: App<()> = App::with_base_path("/main");
    app.mount_app("/v1", inner);
    let handler = app.handler().unwrap();

    assert_eq!(
        fetch(&handler, Method::GET, "/main/v1/api/users").await,
        (StatusCode::OK, "users".to_string())
    );
    for path in ["/v1/users", "/main/v1/users", "/main/users", "/v1/api/users"] {
        assert_eq!(fetch(&handler, Method::GET, path).await.0, StatusCode::NOT_FOUND, "{path}");
    }
}

#[tokio::test]
async fn test_mount_with_empty_segments() {
    let mut inner: App<()> = App::new();
    inner.get("/status", |_ctx| Box::pin(async move { Ok(text("ok")) }));

    let mut app: App<()> = App::new();
    app.mount_app("/", inner);

    assert_eq!(fetch(&app.handler().unwrap(), Method::GET, "/status").await.1, "ok");
}

#[tokio::test]
async fn test_inner_middleware_nests_inside_outer() {
    let mut inner: App<TextState> = App::new();
    inner
        .use_middleware(|ctx| {
            Box::pin(async move {
                ctx.state.text.push_str("_Inner");
                ctx.next().await
            })
        })
        .get("/", |ctx| Box::pin(async move { Ok(text(ctx.state.text.clone())) }));

    let mut app: App<TextState> = App::new();
    app.use_middleware(|ctx| {
        Box::pin(async move {
            ctx.state.text = "Outer".to_string();
            ctx.next().await
        })
    })
    .mount_app("/inner", inner);

    assert_eq!(
        fetch(&app.handler().unwrap(), Method::GET, "/inner").await,
        (StatusCode::OK, "Outer_Inner".to_string())
    );
}

#[tokio::test]
async fn test_outer_after_code_runs_after_inner_chain() {
    let mut inner: App<TextState> = App::new();
    inner
        .use_middleware(|ctx| {
            Box::pin(async move {
                ctx.state.text.push('[');
                let response = ctx.next().await;
                ctx.state.text.push(']');
                response
            })
        })
        .get("/x", |ctx| {
            Box::pin(async move {
                ctx.state.text.push('x');
                Ok(text(""))
            })
        });

    let mut app: App<TextState> = App::new();
    app.use_middleware(|ctx| {
        Box::pin(async move {
            ctx.state.text.push('(');
            ctx.next().await?;
            ctx.state.text.push(')');
            Ok(text(ctx.state.text.clone()))
        })
    })
    .mount_app("/sub", inner);

    assert_eq!(fetch(&app.handler().unwrap(), Method::GET, "/sub/x").await.1, "([x])");
}

#[tokio::test]
async fn test_inner_middleware_is_scoped_to_mount_point() {
    let mut inner: App<TextState> = App::new();
    inner
        .use_middleware(|ctx| {
            Box::pin(async move {
                ctx.state.text.push_str("inner;");
                ctx.next().await
            })
        })
        .get("/a", |ctx| Box::pin(async move { Ok(text(ctx.state.text.clone())) }));

    let mut app: App<TextState> = App::new();
    app.mount_app("/sub", inner)
        .get("/top", |ctx| Box::pin(async move { Ok(text(format!("top:{}", ctx.state.text)))}));
    let handler = app.handler().unwrap();

    assert_eq!(fetch(&handler, Method::GET, "/sub/a").await.1, "inner;");
    assert_eq!(fetch(&handler, Method::GET, "/top").await.1, "top:");
}

#[tokio::test]
async fn test_mounted_params_and_methods() {
    let mut inner: App<()> = App::with_base_path("/users");
    inner
        .get("/:id", |ctx| {
            Box::pin(async move { Ok(text(ctx.param("id").unwrap_or_default().to_string())) })
        })
        .delete("/:id", |_ctx| Box::pin(async move { Ok(status_text(StatusCode::NO_CONTENT, "")) }));

    let mut app: App<()> = App::new();
    app.mount_app("/api", inner);
    let handler = app.handler().unwrap();

    assert_eq!(fetch(&handler, Method::GET, "/api/users/17").await.1, "17");
    assert_eq!(fetch(&handler, Method::DELETE, "/api/users/17").await.0, StatusCode::NO_CONTENT);
    assert_eq!(fetch(&handler, Method::PUT, "/api/users/17").await.0, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_nested_mounts() {
    let mut leaf: App<()> = App::new();
    leaf.get("/leaf", |_ctx| Box::pin(async move { Ok(text("leaf")) }));

    let mut middle: App<()> = App::with_base_path("/m");
    middle.mount_app("/n", leaf);

    let mut app: App<()> = App::with_base_path("/root");
    app.mount_app("/o", middle);

    assert_eq!(
        fetch(&app.handler().unwrap(), Method::GET, "/root/o/m/n/leaf").await.1,
        "leaf"
    );
}

#[tokio::test]
async fn test_inner_error_routes_are_carried() {
    let mut inner: App<()> = App::new();
    inner
        .get("/fail", |_ctx| {
            Box::pin(async move { Err(HandlerError::other(std::io::Error::other("inner failure"))) })
        })
        .on_error("/", |ctx| {
            Box::pin(async move {
                let message = ctx.error.as_ref().map(ToString::to_string).unwrap_or_default();
                Ok(status_text(StatusCode::BAD_GATEWAY, message))
            })
        });

    let mut app: App<()> = App::new();
    app.mount_app("/inner", inner).get("/fail", |_ctx| {
        Box::pin(async move { Err(HandlerError::other(std::io::Error::other("outer failure"))) })
    });
    let handler = app.handler().unwrap();

    assert_eq!(
        fetch(&handler, Method::GET, "/inner/fail").await,
        (StatusCode::BAD_GATEWAY, "inner failure".to_string())
    );
    assert_eq!(fetch(&handler, Method::GET, "/fail").await.0, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_outer_not_found_owns_mounted_paths() {
    let mut inner: App<()> = App::new();
    inner
        .get("/gone", |_ctx| Box::pin(async move { Err(HttpError::not_found().into()) }))
        .not_found(|_ctx| Box::pin(async move { Ok(status_text(StatusCode::NOT_FOUND, "inner 404")) }));

    let mut app: App<()> = App::new();
    app.mount_app("/inner", inner)
        .not_found(|_ctx| Box::pin(async move { Ok(status_text(StatusCode::NOT_FOUND, "outer 404")) }));
    let handler = app.handler().unwrap();

    assert_eq!(fetch(&handler, Method::GET, "/inner/gone").await.1, "outer 404");
    assert_eq!(fetch(&handler, Method::GET, "/inner/missing").await.1, "outer 404");
}

#[tokio::test]
async fn test_inner_pattern_errors_reach_outer_build() {
    let mut inner: App<()> = App::new();
    inner.get("/broken/:", |_ctx| Box::pin(async move { Ok(text("")) }));

    let mut app: App<()> = App::new();
    app.mount_app("/inner", inner);

    let err = app.handler().err().unwrap();
    assert_eq!(err.errors.len(), 1);
}
