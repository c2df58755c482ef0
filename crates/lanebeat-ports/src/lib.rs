pub mod audio;
pub mod chart;
pub mod input;
pub mod storage;
pub mod types;
pub mod view;

pub use audio::*;
pub use chart::*;
pub use input::*;
pub use storage::*;
pub use types::*;
pub use view::*;
