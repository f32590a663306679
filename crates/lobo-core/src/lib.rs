pub mod frame;
pub mod protocol;
pub mod role;
pub mod room;
pub mod transport;

#[cfg(feature = "native")]
pub mod ws_transport;
