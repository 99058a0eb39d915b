pub mod config;
pub mod errors;
pub mod fetch;
pub mod locator;
pub mod orchestrator;
pub mod paths;
pub mod resolver;
pub mod runner;
