pub mod camera;
pub mod constants;
pub mod entity;
pub mod input;
pub mod store;
