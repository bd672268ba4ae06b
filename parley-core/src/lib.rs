pub mod model;
pub mod utils;

pub use model::{ClientSignal, ConnId, IceServerConfig, RoomId, ServerSignal};
