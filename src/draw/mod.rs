pub mod bus;
pub mod canvas;
pub mod follow;
pub mod geometry;
pub mod history;
pub mod input;
pub mod keyboard;
pub mod messages;
pub mod model;
pub mod overlay;
pub mod scheduler;
pub mod service;
pub mod status;
pub mod toolbar;
pub mod window_query;

pub use bus::{CommandBus, CommandSender};
pub use input::{DrawEngine, EngineEffect, EngineEvent};
pub use messages::Command;
pub use overlay::PainterApp;
pub use service::PainterRuntime;
