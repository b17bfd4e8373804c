pub mod api;
pub mod chat;
pub mod site;
pub mod websocket;
