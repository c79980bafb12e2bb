// App-specific modules
pub mod api;
pub mod config;
pub mod rpc;
pub mod utils;
pub mod view;
pub mod wallet;
pub mod workflow;
