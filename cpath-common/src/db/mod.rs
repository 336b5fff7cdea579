//! Database initialization and record stores

pub mod init;
pub mod models;
pub mod schools;
pub mod submissions;

pub use init::*;
pub use models::*;
pub use schools::*;
pub use submissions::*;
