//! Example application: dynamic routes, path parameters, templates,
//! sessions, a stats endpoint and a WebSocket echo.
//!
//! Run with `cargo run --example server`, then try:
//!
//! - <http://localhost:8080/>            home page
//! - <http://localhost:8080/api/hello?name=you>
//! - <http://localhost:8080/api/time>
//! - <http://localhost:8080/users/123>   path parameter extraction
//! - <http://localhost:8080/template>    template engine demo
//! - <http://localhost:8080/login?user=alice> then /whoami
//! - <http://localhost:8080/api/stats>   server counters

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use lantern_http::protocol::{Method, Request, Response, Status, WsError};
use lantern_http::websocket::WsMessage;
use lantern_web::json::{json_error, json_response};
use lantern_web::router::Route;
use lantern_web::{RequestContext, Server, ServerConfig, WsHandler, WsStream, handler_fn, template};

const HOME_HTML: &str = "<!DOCTYPE html>\n\
    <html><head><title>lantern example</title></head>\n\
    <body>\n\
    <h1>Welcome to lantern</h1>\n\
    <p>This is an example lantern application.</p>\n\
    <h2>Quick links</h2>\n\
    <ul>\n\
    <li><a href=\"/api/hello\">Hello API</a></li>\n\
    <li><a href=\"/api/time\">Current time</a></li>\n\
    <li><a href=\"/users/123\">User profile</a></li>\n\
    <li><a href=\"/template\">Template example</a></li>\n\
    <li><a href=\"/api/stats\">Server statistics</a></li>\n\
    </ul>\n\
    </body></html>\n";

fn epoch_secs() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|elapsed| elapsed.as_secs()).unwrap_or(0)
}

struct EchoSocket;

#[async_trait]
impl WsHandler for EchoSocket {
    async fn handle(&self, request: Request, mut ws: WsStream) -> Result<(), WsError> {
        info!(path = request.path(), "websocket client connected");
        while let Some(message) = ws.next_message().await? {
            match message {
                WsMessage::Text(text) => {
                    let text = String::from_utf8_lossy(&text).into_owned();
                    ws.send_text(&format!("echo: {text}")).await?;
                }
                WsMessage::Binary(payload) => ws.send_binary(payload).await?,
                WsMessage::Ping(_) => {}
            }
        }
        info!("websocket client disconnected");
        Ok(())
    }
}

#[tokio::main]
async fn main() {
    let config = ServerConfig {
        enable_security_headers: true,
        ..ServerConfig::with_rate_limiting()
    };

    let server = Server::builder()
        .address("127.0.0.1:8080")
        .config(config)
        .route(Route::new(
            Method::Get,
            "/",
            handler_fn(|_ctx: &RequestContext| async { Ok(Response::html(HOME_HTML)) }),
            "Home page",
        ))
        .route(Route::new(
            Method::Get,
            "/api/hello",
            handler_fn(|ctx: &RequestContext| {
                let name = ctx.query_param("name").unwrap_or("World").to_string();
                async move {
                    Ok(json_response(
                        json!({ "message": format!("Hello, {name}!"), "timestamp": epoch_secs() }),
                        "Hello API response",
                    ))
                }
            }),
            "Hello API",
        ))
        .route(Route::new(
            Method::Get,
            "/api/time",
            handler_fn(|_ctx: &RequestContext| async {
                Ok(json_response(
                    json!({ "timestamp": epoch_secs(), "server": "lantern example" }),
                    "Current time",
                ))
            }),
            "Time API",
        ))
        .route(Route::new(
            Method::Get,
            "/users/{id}",
            handler_fn(|ctx: &RequestContext| {
                let user_id = ctx.path_param("id").unwrap_or_else(|| "unknown".to_string());
                async move {
                    Ok(Response::html(format!(
                        "<!DOCTYPE html>\n\
                         <html><head><title>User profile</title></head>\n\
                         <body>\n\
                         <h1>User profile</h1>\n\
                         <p>User ID: <strong>{user_id}</strong></p>\n\
                         <p>This demonstrates path parameter extraction.</p>\n\
                         <a href=\"/\">Back to home</a>\n\
                         </body></html>\n"
                    )))
                }
            }),
            "User profile",
        ))
        .route(Route::new(
            Method::Get,
            "/template",
            handler_fn(|_ctx: &RequestContext| async {
                let page = template::render_str(
                    "<!DOCTYPE html>\n\
                     <html><head><title>{{title}}</title></head>\n\
                     <body>\n\
                     <h1>{{heading}}</h1>\n\
                     <p>Welcome, {{user_name}}!</p>\n\
                     <p>You have {{message_count}} new messages.</p>\n\
                     <p>Server status: {{status}}</p>\n\
                     </body></html>\n",
                    &json!({
                        "title": "Template Example",
                        "heading": "Template engine demo",
                        "user_name": "lantern user",
                        "message_count": 42,
                        "status": "Online",
                    }),
                );
                Ok(Response::html(page))
            }),
            "Template example",
        ))
        .route(Route::new(
            Method::Get,
            "/api/status",
            handler_fn(|_ctx: &RequestContext| async {
                Ok(Response::json(
                    json!({
                        "status": "ok",
                        "server": "lantern",
                        "features": {
                            "sessions": true,
                            "websockets": true,
                            "json_api": true,
                            "templates": true,
                        },
                    })
                    .to_string(),
                ))
            }),
            "API status endpoint",
        ))
        .websocket_handler(EchoSocket)
        .build()
        .expect("server configuration");

    // These routes read server-owned state, so they register against the
    // built server.
    let stats = Arc::clone(server.stats());
    server
        .add_route(Route::new(
            Method::Get,
            "/api/stats",
            handler_fn(move |_ctx: &RequestContext| {
                let stats = Arc::clone(&stats);
                async move {
                    let snapshot = stats.snapshot();
                    Ok(Response::json(
                        json!({
                            "requests_served": snapshot.requests_served,
                            "bytes_sent": snapshot.bytes_sent,
                            "bytes_received": snapshot.bytes_received,
                            "active_connections": snapshot.active_connections,
                            "error_count": snapshot.error_count,
                        })
                        .to_string(),
                    ))
                }
            }),
            "Server statistics",
        ))
        .expect("route registration");

    let sessions = Arc::clone(server.sessions());
    server
        .add_route(Route::new(
            Method::Get,
            "/login",
            handler_fn(move |ctx: &RequestContext| {
                let sessions = Arc::clone(&sessions);
                let user = ctx.query_param("user").map(str::to_string);
                async move {
                    match sessions.create(user.as_deref()) {
                        Ok(session_id) => Ok(json_response(
                            json!({ "user": user.unwrap_or_default() }),
                            "logged in",
                        )
                        .with_header("Set-Cookie", format!("session_id={session_id}; Path=/"))),
                        Err(e) => Ok(json_error(Status::ServiceUnavailable, &e.to_string())),
                    }
                }
            }),
            "Create a session",
        ))
        .expect("route registration");

    let sessions = Arc::clone(server.sessions());
    server
        .add_route(Route::new(
            Method::Get,
            "/whoami",
            handler_fn(move |ctx: &RequestContext| {
                let sessions = Arc::clone(&sessions);
                let session_id = ctx.session_id().map(str::to_string);
                async move {
                    let session = session_id.as_deref().and_then(|id| sessions.get(id));
                    match session {
                        Some(session) => Ok(json_response(
                            json!({
                                "user": session.user_id(),
                                "authenticated": session.authenticated(),
                            }),
                            "session found",
                        )),
                        None => Ok(json_error(Status::Unauthorized, "no active session")),
                    }
                }
            }),
            "Session lookup",
        ))
        .expect("route registration");

    server.start().await;
}
