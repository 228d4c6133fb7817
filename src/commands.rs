//! The module for the jtl CLI commands.

mod config;
mod run;

pub use self::{config::*, run::*};
