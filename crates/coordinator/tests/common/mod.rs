//! Common test utilities and fixtures.

pub mod fixtures;
pub mod multipart;
pub mod nodes;
pub mod server;

#[allow(unused_imports)]
pub use fixtures::*;
#[allow(unused_imports)]
pub use multipart::*;
#[allow(unused_imports)]
pub use nodes::*;
#[allow(unused_imports)]
pub use server::*;
