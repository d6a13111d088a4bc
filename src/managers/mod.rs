pub mod state_store;
pub mod surface_registry;
pub mod window_manager;
