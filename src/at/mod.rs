//! AT command session: commands, reply tokens and the polling session.

pub mod command;
pub mod session;
pub mod token;

pub use command::AtCommand;
pub use session::{AtSession, LinkState, POLL_INTERVAL};
pub use token::TokenMatch;
