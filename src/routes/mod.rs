pub mod events;
pub mod health;
pub mod playback;
pub mod route;
