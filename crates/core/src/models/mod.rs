pub mod action;
pub mod activity;
pub mod block_time;
pub mod chain;
pub mod chart;
pub mod event;
pub mod read_model;
pub mod settings;
