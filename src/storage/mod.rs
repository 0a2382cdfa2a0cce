pub mod config;
pub mod session;

pub use config::{Config, ConfigError};
pub use session::{FileSessionStore, MemorySessionStore, Session, SessionError, SessionStore};
