pub mod event_store;
pub mod read_model_service;
pub mod series_service;

// Presentation helpers and the write path
pub mod action_service;
pub mod activity_service;
