pub mod analytics;
pub mod app;
pub mod config;
pub mod error;
pub mod health;
pub mod hello;
pub mod openapi;
pub mod pipeline;
pub mod recorder;
pub mod seed;
pub mod storage;
pub mod types;
