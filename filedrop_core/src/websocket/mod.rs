pub mod handler;
pub mod manager;
pub mod messages;


pub use handler::websocket_handler;
pub use manager::{BroadcastReport, ChannelHandle, ClientChannel, NotificationHub};
pub use messages::NotificationEvent;
