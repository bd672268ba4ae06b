pub use parley_core::{ClientSignal, ConnId, IceServerConfig, RoomId, ServerSignal};

pub mod model {
    pub use parley_core::model::*;
    pub use parley_core::utils::*;
}

#[cfg(feature = "server")]
pub mod server {
    pub use parley_server::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use parley_client::*;
}
