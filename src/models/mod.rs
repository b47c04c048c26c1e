pub mod message;
pub mod mood;
pub mod websocket;

pub use message::Message;
pub use mood::Mood;
