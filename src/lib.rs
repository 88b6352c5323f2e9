#![doc = "The `taskvault` library crate."]
#![doc = ""]
#![doc = "Per-user task management over HTTP: registration and login issuing JWT access"]
#![doc = "tokens, profile management, and owner-scoped task CRUD backed by MongoDB."]
#![doc = "The binary (`main.rs`) wires these modules into an actix-web server."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod store;
