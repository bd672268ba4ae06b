
pub use mock_engine::*;
pub use mock_sink::*;
pub use router_bridge::*;
