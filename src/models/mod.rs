pub mod draft;
pub mod events;
pub mod rpc;
pub mod session;
pub mod voter;
