pub mod event;
pub mod route;
