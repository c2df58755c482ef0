pub mod authoring;
pub mod chart;
pub mod model;
pub mod tempo;
pub mod timeline;

pub use authoring::*;
pub use chart::*;
pub use model::*;
pub use tempo::*;
pub use timeline::*;
