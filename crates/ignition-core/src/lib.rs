pub mod checkpoint;
pub mod component;
pub mod config;
pub mod error;
pub mod health;
pub mod history;
pub mod io;
pub mod paths;
pub mod process;
pub mod repair;
pub mod router;
pub mod sequencer;
pub mod servants;

pub use error::{IgnitionError, Result};
