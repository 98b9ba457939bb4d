pub mod app;
pub mod effects;
pub mod events;
pub mod live;
pub mod ranking;

pub use app::App;
pub use effects::{ApiCall, CollectEvent, Effect};
pub use events::{Event, LiveMessage, LocalAction, NetworkResponse, PortMessage};
