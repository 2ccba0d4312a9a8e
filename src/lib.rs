pub mod api_doc;
pub mod backend;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod feature;
pub mod flippy;
pub mod handlers;
pub mod models;
pub mod page;
pub mod routes;
pub mod server;
pub mod state;
