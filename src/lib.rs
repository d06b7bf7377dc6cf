pub mod analysis;
pub mod config;
pub mod export;
pub mod frame;
pub mod logging;
pub mod process;
pub mod render;
pub mod report;
