mod bus;
mod types;

pub use bus::AudioService;
pub use types::EngineEvent;
