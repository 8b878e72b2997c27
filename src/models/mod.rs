pub mod asset;
pub mod generation;
pub mod history;
pub mod phase;
pub mod settings;

pub use asset::*;
pub use generation::*;
pub use history::*;
pub use phase::*;
pub use settings::*;
