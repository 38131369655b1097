pub mod api;
pub mod config;
pub mod db;
pub mod http;
pub mod permission;
pub mod scope;
pub mod service;

pub use self::config::Config;
