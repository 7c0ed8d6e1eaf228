pub mod board;
pub mod errors;
pub mod gateway_config;
pub mod ui;
