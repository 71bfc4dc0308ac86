mod app;
mod report;
mod run_config;

pub use app::run_app;
