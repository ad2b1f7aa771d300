//! Framework-free bindings of cached values for long-lived application code.

mod events;
mod resource;
mod state;

pub use events::{EventBus, RevalidationEvent, Subscription};
pub use resource::{
    CachedResource, FetchOutcome, ResourceOptions, ResourceSnapshot, ResourceStatus,
    DEFAULT_DEDUPING_INTERVAL,
};
pub use state::CachedState;
