pub mod app;
pub mod bridge;
pub mod browse;
pub mod commands;
pub mod config;
pub mod core;
pub mod event;
pub mod logging;
pub mod markup;
pub mod model;
pub mod poll;
pub mod snapshot;
pub mod state;
pub mod trivia;
pub mod trivia_net;
pub mod ui;
pub mod worker;
