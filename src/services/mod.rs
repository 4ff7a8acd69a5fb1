pub mod codec;
pub mod media_service;
pub mod store;
