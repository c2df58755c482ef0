pub mod judge;
pub mod runtime;
pub mod scoring;
pub mod windows;

pub use judge::*;
pub use runtime::*;
pub use scoring::*;
pub use windows::*;
