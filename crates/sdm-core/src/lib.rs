pub mod config;
pub mod logging;

pub mod classify;
pub mod controller;
pub mod downloads;
pub mod notify;
pub mod probe;
pub mod reactor;
pub mod status;
