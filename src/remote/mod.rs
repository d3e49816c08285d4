pub mod client;
pub mod worker;

pub use client::*;
pub use worker::*;
