//! # lunadm
//!
//! LUN administration for storage controllers reached over SSH or Telnet.
//!
//! lunadm resolves a `[user@]host[:port]` target and its credentials, opens
//! a session over the requested transport, runs one controller command and
//! hands back the output.
//!
//! ## Layers
//!
//! - [`credentials`]: target parsing and interactive credential resolution
//! - [`known_hosts`]: read-only host-key trust store
//! - [`transport`]: SSH and Telnet sessions behind the [`Session`] trait
//! - [`connection`]: the [`Connection`] facade, selected by [`ConnectionType`]
//! - [`cli`]: argument surface, `lun` command lines and console output
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lunadm::{ConnectionBuilder, Session};
//! use lunadm::credentials::TerminalPrompter;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), lunadm::Error> {
//!     let mut conn = ConnectionBuilder::new("root@filer01")
//!         .connection_type("SSH")
//!         .build(TerminalPrompter)?;
//!
//!     conn.connect().await?;
//!     let output = conn.exec_cmd("lun show all").await?;
//!     println!("{}", output.into_text().await.map_err(lunadm::error::TransportError::Io)?);
//!
//!     conn.close().await?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod connection;
pub mod credentials;
pub mod error;
pub mod known_hosts;
pub mod transport;

// Re-export main types for convenience
pub use connection::{Connection, ConnectionBuilder, ConnectionType};
pub use credentials::{Credentials, TargetSpec};
pub use error::Error;
pub use transport::{CommandOutput, Session, SessionConfig, SessionState};
