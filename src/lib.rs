pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod geo;
pub mod history;
pub mod model;
pub mod pipeline;
pub mod sink;
pub mod transform;
