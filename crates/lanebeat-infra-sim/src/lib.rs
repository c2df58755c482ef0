pub mod gamepad;
pub mod transport;
pub mod view;

pub use gamepad::*;
pub use transport::*;
pub use view::*;
