//! Front-ends: terminal commands and the HTTP form/API

pub mod cli;
pub mod http;

pub use http::run_http_server;
