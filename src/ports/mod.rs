//! Port traits: the seams between domain logic and the outside world.

pub mod config_port;
pub mod credential_port;
pub mod notify_port;
pub mod push_port;
pub mod quote_port;
pub mod store_port;
pub mod token_port;
