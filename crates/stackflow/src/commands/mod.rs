pub mod config;
pub mod export;
pub mod outputs;
pub mod preview;
pub mod up;
