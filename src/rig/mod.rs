pub mod chain;
pub mod error;
pub mod history;
pub mod params;
pub mod selection;

pub use chain::{Amplifier, Chain, Direction, PedalInstance, Target};
pub use error::{ChainError, ChainResult};
pub use history::History;
pub use params::drag_value;
pub use selection::Selection;
