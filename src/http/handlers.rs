//! Built-in routes: index page, status, statistics, route listing and
//! session management. Also the demonstration routes the server binary
//! mounts.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::json;

use crate::config::{FeatureConfig, PathsConfig};
use crate::content::escape::html_escape;
use crate::content::files::StaticFiles;
use crate::content::json::{json_error, json_success, parse_json_body};
use crate::content::template::{render_template, substitute_variables};
use crate::error::{Error, Result};
use crate::http::message::{Method, Request, Response, StatusCode};
use crate::http::response::SERVER_NAME;
use crate::http::websocket::{Frame, WebSocketHandler};
use crate::routing::{RequestContext, Route, RouteTable};
use crate::session::Session;

/// Register the built-in routes. Returns how many were accepted.
pub fn register_default_routes(table: &RouteTable, features: &FeatureConfig) -> usize {
    let mut routes = vec![
        Route::new(Method::Get, "/", index, "Index page"),
        Route::new(Method::Get, "/api/status", status, "Server status"),
        Route::new(Method::Get, "/api/stats", stats, "Server statistics"),
        Route::new(Method::Get, "/api/routes", list_routes, "Registered routes"),
    ];
    if features.sessions {
        routes.extend([
            Route::new(Method::Post, "/api/session", create_session, "Create a session"),
            Route::new(Method::Get, "/api/session", show_session, "Current session"),
            Route::new(Method::Put, "/api/session", update_session, "Replace session data"),
            Route::new(Method::Delete, "/api/session", destroy_session, "End the session"),
        ]);
    }
    table.register_all(routes)
}

fn index(ctx: &RequestContext<'_>) -> Result<Response> {
    let items: String = ctx
        .state
        .routes
        .snapshot()
        .iter()
        .map(|r| {
            format!(
                "<li><code>{} {}</code> {}</li>\n",
                r.method,
                html_escape(&r.pattern),
                html_escape(&r.description)
            )
        })
        .collect();
    let body = format!(
        "<!DOCTYPE html>\n<html><head><title>{SERVER_NAME}</title></head>\n<body>\n\
         <h1>{SERVER_NAME} is running</h1>\n<ul>\n{items}</ul>\n</body></html>\n"
    );
    Ok(Response::html(StatusCode::Ok, body))
}

fn status(ctx: &RequestContext<'_>) -> Result<Response> {
    let uptime = SystemTime::now()
        .duration_since(ctx.state.started_at)
        .unwrap_or_default();
    Ok(json_success(
        json!({
            "status": "running",
            "server": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION"),
            "uptime_secs": uptime.as_secs(),
        }),
        "Server is running",
    ))
}

fn stats(ctx: &RequestContext<'_>) -> Result<Response> {
    let counters = ctx.state.stats.snapshot();
    Ok(json_success(
        json!({
            "requests_served": counters.requests_served,
            "bytes_sent": counters.bytes_sent,
            "bytes_received": counters.bytes_received,
            "active_connections": counters.active_connections,
            "error_count": counters.error_count,
            "route_count": ctx.state.routes.len(),
            "session_count": ctx.state.sessions.len(),
        }),
        "Server statistics",
    ))
}

fn list_routes(ctx: &RequestContext<'_>) -> Result<Response> {
    let routes = serde_json::to_value(ctx.state.routes.snapshot())
        .map_err(|e| Error::HandlerFailure(e.to_string()))?;
    Ok(json_success(routes, "Registered routes"))
}

fn create_session(ctx: &RequestContext<'_>) -> Result<Response> {
    let user = ctx.query_param("user").filter(|u| !u.is_empty());
    match ctx.state.sessions.create(user) {
        Ok(id) => {
            let cookie = format!("session_id={id}; Path=/; HttpOnly");
            Ok(json_success(
                json!({ "session_id": id, "user_id": user }),
                "Session created",
            )
            .with_status(StatusCode::Created)
            .with_header("Set-Cookie", cookie))
        }
        Err(e @ Error::CapacityExceeded { .. }) => Ok(json_error(e.status(), &e.to_string())),
        Err(e) => Err(e),
    }
}

fn show_session(ctx: &RequestContext<'_>) -> Result<Response> {
    match &ctx.session {
        Some(session) => Ok(json_success(session_json(session), "Current session")),
        None => Ok(json_error(StatusCode::NotFound, "No active session")),
    }
}

fn update_session(ctx: &RequestContext<'_>) -> Result<Response> {
    let Some(session) = &ctx.session else {
        return Ok(json_error(StatusCode::NotFound, "No active session"));
    };
    let data = String::from_utf8_lossy(ctx.request.body());
    ctx.state.sessions.update(&session.id, &data)?;
    let updated = ctx.state.sessions.get(&session.id)?;
    Ok(json_success(session_json(&updated), "Session updated"))
}

fn destroy_session(ctx: &RequestContext<'_>) -> Result<Response> {
    let Some(id) = ctx.request.session_id.as_deref() else {
        return Ok(json_error(StatusCode::NotFound, "No active session"));
    };
    match ctx.state.sessions.destroy(id) {
        Ok(()) => Ok(json_success(json!(null), "Session destroyed")
            .with_header("Set-Cookie", "session_id=; Path=/; Max-Age=0")),
        Err(Error::NotFound(_)) => Ok(json_error(StatusCode::NotFound, "No active session")),
        Err(e) => Err(e),
    }
}

/// Register the demonstration routes. Returns how many were accepted.
pub fn register_demo_routes(table: &RouteTable, paths: &PathsConfig) -> usize {
    let echo = EchoSocket {
        greeting: Some(format!("Welcome to {SERVER_NAME}")),
    };
    let templates = paths.template_directory.clone();
    table.register_all([
        Route::new(Method::Get, "/api/hello", hello, "Greeting"),
        Route::new(Method::Get, "/api/time", time, "Current server time"),
        Route::new(Method::Post, "/api/echo", echo_json, "Echo a JSON body"),
        Route::new(Method::Get, "/users/{id}", user, "User by id"),
        Route::new(
            Method::Get,
            "/template",
            move |ctx: &RequestContext<'_>| template_page(ctx, Path::new(&templates)),
            "Rendered template",
        ),
        Route::websocket("/ws", echo, "WebSocket echo"),
        Route::new(
            Method::Get,
            "/static/*",
            StaticFiles::new(&paths.static_directory, "/static/"),
            "Static files",
        ),
    ])
}

const DEFAULT_TEMPLATE: &str = "<!DOCTYPE html>\n<html><head><title>{{title}}</title></head>\n\
<body><h1>Hello, {{name}}!</h1><p>Served by {{server}}.</p></body></html>\n";

fn hello(_ctx: &RequestContext<'_>) -> Result<Response> {
    Ok(json_success(json!({ "message": "Hello, World!" }), "Greeting"))
}

fn time(_ctx: &RequestContext<'_>) -> Result<Response> {
    Ok(json_success(
        json!({ "timestamp": unix_secs(SystemTime::now()) }),
        "Current server time",
    ))
}

fn echo_json(ctx: &RequestContext<'_>) -> Result<Response> {
    match parse_json_body(ctx.request) {
        Ok(body) => Ok(json_success(body, "Echo")),
        Err(e) => Ok(json_error(e.status(), &e.to_string())),
    }
}

fn user(ctx: &RequestContext<'_>) -> Result<Response> {
    let id = ctx
        .path_param("id")
        .ok_or_else(|| Error::HandlerFailure("missing id parameter".to_string()))?;
    Ok(json_success(
        json!({ "id": id, "name": format!("User {id}") }),
        "User found",
    ))
}

/// Renders `index.html` from the template directory, or a built-in page
/// when that file is missing.
fn template_page(ctx: &RequestContext<'_>, directory: &Path) -> Result<Response> {
    let name = ctx.query_param("name").unwrap_or("World");
    let variables = json!({
        "title": SERVER_NAME,
        "name": html_escape(name),
        "server": SERVER_NAME,
    })
    .to_string();

    let path = directory.join("index.html");
    let body = if path.is_file() {
        render_template(&path, &variables)?
    } else {
        substitute_variables(DEFAULT_TEMPLATE, &variables)
    };
    Ok(Response::html(StatusCode::Ok, body))
}

fn session_json(session: &Session) -> serde_json::Value {
    json!({
        "session_id": session.id,
        "user_id": session.user_id,
        "authenticated": session.authenticated,
        "data": session.data,
        "created_at": unix_secs(session.created_at),
        "last_access": unix_secs(session.last_access),
    })
}

fn unix_secs(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH).map_or(0, |d| d.as_secs())
}

/// WebSocket handler that sends every message straight back.
#[derive(Debug, Clone, Default)]
pub struct EchoSocket {
    /// Sent once after the handshake, if set.
    pub greeting: Option<String>,
}

impl WebSocketHandler for EchoSocket {
    fn on_open(&self, _request: &Request) -> Option<Vec<u8>> {
        self.greeting.as_ref().map(|g| g.clone().into_bytes())
    }

    fn on_message(&self, _request: &Request, frame: &Frame) -> Option<Vec<u8>> {
        Some(frame.payload.clone())
    }

    fn on_close(&self, request: &Request) {
        tracing::debug!(path = %request.path, "Echo socket closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::http::server::AppState;

    fn state(features: FeatureConfig) -> AppState {
        let config = ServerConfig {
            features,
            ..ServerConfig::default()
        };
        let state = AppState::new(config);
        register_default_routes(&state.routes, &state.config.features);
        state
    }

    fn call(state: &AppState, request: &Request) -> Response {
        let route = state.routes.find(request).unwrap();
        let session = request
            .session_id
            .as_deref()
            .and_then(|id| state.sessions.get(id).ok());
        let ctx = RequestContext {
            request,
            route: &route,
            state,
            session,
        };
        match &route.endpoint {
            crate::routing::Endpoint::Http(handler) => handler.handle(&ctx).unwrap(),
            crate::routing::Endpoint::WebSocket(_) => panic!("not an HTTP route"),
        }
    }

    fn body_json(response: &Response) -> serde_json::Value {
        serde_json::from_slice(&response.body).unwrap()
    }

    #[test]
    fn session_routes_follow_feature_flag() {
        assert_eq!(state(FeatureConfig::default()).routes.len(), 8);
        let off = FeatureConfig {
            sessions: false,
            ..FeatureConfig::default()
        };
        assert_eq!(state(off).routes.len(), 4);
    }

    #[test]
    fn stats_report_route_and_session_counts() {
        let state = state(FeatureConfig::default());
        state.sessions.create(None).unwrap();
        let resp = call(&state, &Request::new(Method::Get, "/api/stats"));
        let json = body_json(&resp);
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["route_count"], 8);
        assert_eq!(json["data"]["session_count"], 1);
    }

    #[test]
    fn status_and_index() {
        let state = state(FeatureConfig::default());
        let json = body_json(&call(&state, &Request::new(Method::Get, "/api/status")));
        assert_eq!(json["data"]["status"], "running");

        let index = call(&state, &Request::new(Method::Get, "/"));
        let html = String::from_utf8(index.body).unwrap();
        assert!(html.contains("<code>GET /api/status</code>"));
    }

    #[test]
    fn session_lifecycle() {
        let state = state(FeatureConfig::default());

        let created = call(&state, &Request::new(Method::Post, "/api/session?user=alice"));
        assert_eq!(created.status, StatusCode::Created);
        let id = body_json(&created)["data"]["session_id"]
            .as_str()
            .unwrap()
            .to_string();
        assert!(created
            .header("Set-Cookie")
            .unwrap()
            .starts_with(&format!("session_id={id};")));

        let cookie = format!("session_id={id}");
        let mut show = Request::new(Method::Get, "/api/session").with_header("Cookie", cookie.as_str());
        show.session_id = Some(id.clone());
        let json = body_json(&call(&state, &show));
        assert_eq!(json["data"]["user_id"], "alice");
        assert_eq!(json["data"]["authenticated"], true);

        let mut put = Request::new(Method::Put, "/api/session").with_body("theme=dark");
        put.session_id = Some(id.clone());
        let json = body_json(&call(&state, &put));
        assert_eq!(json["data"]["data"], "theme=dark");

        let mut delete = Request::new(Method::Delete, "/api/session");
        delete.session_id = Some(id.clone());
        assert_eq!(call(&state, &delete).status, StatusCode::Ok);
        assert_eq!(call(&state, &delete).status, StatusCode::NotFound);
        assert_eq!(call(&state, &show).status, StatusCode::NotFound);
    }

    #[test]
    fn demo_routes() {
        let state = state(FeatureConfig::default());
        let registered = register_demo_routes(&state.routes, &state.config.paths);
        assert_eq!(registered, 7);

        let json = body_json(&call(&state, &Request::new(Method::Get, "/users/42")));
        assert_eq!(json["data"]["id"], "42");

        let page = call(&state, &Request::new(Method::Get, "/template?name=<b>"));
        let html = String::from_utf8(page.body).unwrap();
        assert!(html.contains("Hello, &lt;b&gt;!"));

        let echo = Request::new(Method::Post, "/api/echo")
            .with_header("Content-Type", "application/json")
            .with_body(r#"{"a":1}"#);
        assert_eq!(body_json(&call(&state, &echo))["data"]["a"], 1);

        let bad = Request::new(Method::Post, "/api/echo").with_body("plain");
        assert_eq!(call(&state, &bad).status, StatusCode::BadRequest);
    }

    #[test]
    fn echo_socket_echoes() {
        let echo = EchoSocket {
            greeting: Some("hi".to_string()),
        };
        let req = Request::new(Method::Get, "/ws");
        assert_eq!(echo.on_open(&req), Some(b"hi".to_vec()));
        let frame = Frame {
            fin: true,
            opcode: crate::http::websocket::Opcode::Text,
            masked: false,
            mask: None,
            payload: b"ping".to_vec(),
        };
        assert_eq!(echo.on_message(&req, &frame), Some(b"ping".to_vec()));
    }
}
