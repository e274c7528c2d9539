pub mod bus;
pub mod types;

pub use bus::{CommandBus, CommandReceiver, CommandSender};
pub use types::{Command, CommandSource};

/// Result of applying one command: a JSON payload or a user-facing error
pub type Outcome = Result<serde_json::Value, String>;
