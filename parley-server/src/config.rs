use parley_core::IceServerConfig;
use parley_core::utils::{DEFAULT_SIGNALING_PORT, DEFAULT_STUN_ADDR};
use std::net::{Ipv4Addr, SocketAddr};

/// Runtime settings of the rendezvous server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Handed to every client in its `welcome` frame.
    pub ice_servers: Vec<IceServerConfig>,
    /// Capacity of the router's inbound command queue.
    pub router_queue: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_SIGNALING_PORT)),
            ice_servers: vec![IceServerConfig::stun(DEFAULT_STUN_ADDR)],
            router_queue: 1024,
        }
    }
}
