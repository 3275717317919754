pub mod db;
pub mod error;
pub mod history;
pub mod logging;
pub mod model;
pub mod output;
pub mod paths;
pub mod query;
pub mod reorder;
pub mod session;
pub mod store;
pub mod tui;
pub mod watch;

pub use error::{Error, Result};
