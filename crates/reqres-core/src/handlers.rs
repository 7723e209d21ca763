//! The three fixed behaviors and the method/target match that picks one.

use crate::{Method, Request, Response, Result};
use serde::{Deserialize, Serialize};

/// Login page served on `GET /`
pub const LOGIN_FORM: &str = r#"
<h1>Welcome!</h1>
<form action="/login" method="POST">
    <input type="text" name="username" placeholder="Enter Username" />
    <input type="password" name="password" placeholder="Enter Password" />
    <button type="submit">Login</button>
</form>
"#;

/// Message carried by every login receipt
pub const LOGIN_MESSAGE: &str = "Login Successful!";

/// JSON document returned by `POST /login`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginReceipt {
    pub message: String,
    /// Raw request body, not form-decoded
    pub received_data: String,
}

impl LoginReceipt {
    pub fn new(received_data: impl Into<String>) -> Self {
        Self {
            message: LOGIN_MESSAGE.to_string(),
            received_data: received_data.into(),
        }
    }
}

/// Route selected for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    LoginForm,
    Login,
    NotFound,
}

impl Route {
    /// Exact match on method and request target. A query string makes the
    /// target differ, so `GET /?a=b` does not match `GET /`.
    pub fn resolve(method: Method, target: &str) -> Self {
        match (method, target) {
            (Method::Get, "/") => Route::LoginForm,
            (Method::Post, "/login") => Route::Login,
            _ => Route::NotFound,
        }
    }

    /// Whether the route needs the body buffered before responding
    pub fn reads_body(self) -> bool {
        matches!(self, Route::Login)
    }

    pub fn respond(self, req: &Request) -> Result<Response> {
        match self {
            Route::LoginForm => Ok(login_form()),
            Route::Login => login(req),
            Route::NotFound => Ok(not_found()),
        }
    }
}

pub fn login_form() -> Response {
    Response::html(LOGIN_FORM)
}

/// Echo the buffered body back inside a [`LoginReceipt`].
///
/// The JSON is sent as `text/plain`.
pub fn login(req: &Request) -> Result<Response> {
    let receipt = LoginReceipt::new(req.body_text());
    Ok(Response::text(serde_json::to_string(&receipt)?))
}

pub fn not_found() -> Response {
    Response::not_found()
}
