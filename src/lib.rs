pub mod app;
pub mod catalog;
pub mod config;
pub mod content;
pub mod domain;
pub mod error;
pub mod fetcher;
pub mod http;
pub mod normalize;
pub mod output;
pub mod plan;
pub mod table;
pub mod watermark;
