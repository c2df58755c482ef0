pub mod clock;
pub mod diagnostics;
pub mod editor;
pub mod ipc;
pub mod metronome;
pub mod scheduler;
pub mod session;

pub use clock::*;
pub use diagnostics::*;
pub use editor::*;
pub use ipc::*;
pub use metronome::*;
pub use scheduler::*;
pub use session::*;
