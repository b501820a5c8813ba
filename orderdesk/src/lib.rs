pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod form;
pub mod poller;
pub mod prefill;
pub mod service;
pub mod session;
pub mod types;
