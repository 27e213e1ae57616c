pub mod messages;
pub mod participants;
pub mod rooms;
