//! Background Tasks Module
//!
//! Periodic work run alongside the HTTP service.

mod maintenance;

pub use maintenance::spawn_maintenance_task;
