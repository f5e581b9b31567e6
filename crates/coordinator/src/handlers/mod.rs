//! HTTP request handlers.

pub mod admin;
pub mod files;
pub mod health;

pub use admin::*;
pub use files::*;
pub use health::*;
