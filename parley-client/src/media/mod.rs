mod media_engine;
mod rtc_engine;

pub use media_engine::*;
pub use rtc_engine::*;
