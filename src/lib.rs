pub mod audit;
pub mod cli;
pub mod clipboard;
pub mod clock;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod lockout;
pub mod persist;
pub mod session;
pub mod store;
pub mod timer;
pub mod vault;
