// File: lib.rs
// Location: /src/lib.rs

pub mod compositor;
pub mod config;
pub mod export;
pub mod forms;
pub mod logo;
pub mod payload;
pub mod qr;
pub mod session;
