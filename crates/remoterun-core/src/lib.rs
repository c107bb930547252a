// remote-run Core Library (russh 기반)
// author: kodeholic

pub mod config;
pub mod error;
pub mod exec;
pub mod session;
pub mod sftp;
pub mod state;
pub mod utils;

pub use config::{load, ConnectionProfile, HostKeyPolicy};
pub use error::{Error, Result};
pub use exec::CommandOutput;
pub use session::Session;
pub use sftp::Transferred;
