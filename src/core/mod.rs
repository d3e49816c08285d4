pub mod config;
pub mod grid;
pub mod media;
pub mod session;
pub mod transport;

#[cfg(test)]
mod config_test;

pub use config::*;
pub use grid::*;
pub use media::*;
pub use session::*;
pub use transport::*;
