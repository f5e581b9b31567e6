//! Common test utilities.

pub mod multipart;
pub mod server;

#[allow(unused_imports)]
pub use multipart::*;
#[allow(unused_imports)]
pub use server::*;
