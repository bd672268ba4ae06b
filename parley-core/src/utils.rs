pub const DEFAULT_STUN_ADDR: &str = "stun:stun.l.google.com:19302";

/// Port the rendezvous server listens on when nothing else is configured.
pub const DEFAULT_SIGNALING_PORT: u16 = 5050;
