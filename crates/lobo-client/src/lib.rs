pub mod announcement;
pub mod channel;
pub mod client_controller;
pub mod colorize;
pub mod config;
pub mod error;
pub mod game_state;
pub mod listeners;
pub mod phase_timer;
pub mod room_view;
pub mod session;
pub mod vote;
