pub mod actor;
pub mod messages;

pub use actor::SessionActor;
pub use messages::{SessionCommand, SessionEvent};
