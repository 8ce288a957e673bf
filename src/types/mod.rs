mod commands;
mod errors;
pub mod messaging;
mod protocol;

pub use commands::*;
pub use errors::*;
pub use messaging::*;
pub use protocol::*;
