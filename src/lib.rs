pub mod catalogue;
pub mod cdo;
pub mod cli;
pub mod config;
pub mod error;
pub mod filename;
pub mod indices;
pub mod logging;
pub mod merge;
pub mod parallel;
pub mod patch;
pub mod regrid;
pub mod scan;
pub mod stage;

pub use error::{Error, Result};
