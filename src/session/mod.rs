pub mod client;
pub mod controller;
pub mod state;

pub use client::{HttpUploadClient, NetworkError, UploadClient};
pub use controller::SessionController;
pub use state::{SessionStatus, UploadSession, UploadTicket};
