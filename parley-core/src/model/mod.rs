mod conn;
mod room;
mod signaling;

pub use conn::ConnId;
pub use room::RoomId;
pub use signaling::{ClientSignal, IceServerConfig, ServerSignal};
