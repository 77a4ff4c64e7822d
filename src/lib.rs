pub mod config;
pub mod content;
pub mod errors;
pub mod export;
pub mod generation;
pub mod images;
pub mod logging;
pub mod normalize;
pub mod search;
pub mod server;
pub mod service;
pub mod storage;
