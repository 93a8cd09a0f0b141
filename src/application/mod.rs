pub mod alert;
pub mod catalog_service;
pub mod desk;
pub mod desk_runtime;
pub mod order_service;
pub mod pending_queue;
pub mod session;
