pub mod error;
pub mod ghost_config;
pub mod ghost_connection;
pub mod ghosting_message;
pub mod packet_notifiable;
