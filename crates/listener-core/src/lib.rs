mod config;
mod controller;
mod engine;
mod error;
mod events;
mod runtime;

pub mod actors;

pub use config::*;
pub use controller::*;
pub use engine::*;
pub use error::*;
pub use events::*;
pub use runtime::*;
