pub mod config;
pub mod geometry;
pub mod measure;
pub mod metrics;
pub mod pose;
pub mod task;
