#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! A registry of object pools that recycle expensive-to-construct objects.
//!
//! Instead of building and tearing down heavyweight objects (sprites, scene nodes, buffers,
//! connections) every time they are needed, a pool keeps a working set of instances and hands
//! them out on demand. When a caller is done with an object, it releases it back to the pool,
//! which scrubs its per-use state and keeps it for the next caller.
//!
//! This crate provides [`PoolManager`], which owns any number of independently configured
//! pools. Each pool is defined by:
//!
//! * a **construct** callback that builds one object from the pool parameters (required),
//! * a **reset** callback that scrubs an object when it is released (optional),
//! * a **destroy** callback that disposes of an object when the pool is torn down (optional),
//! * an opt-in call to [`Cancellable::cancel_pending()`] on release, for objects that own
//!   timers or scheduled transitions.
//!
//! The parameters of a pool are a caller-defined value supplied at population time and handed
//! unchanged to every callback, which lets one pool definition serve many variants that share
//! the same pooling mechanics.
//!
//! # Capacity
//!
//! A pool is either fixed in size, in which case acquisition from an empty free list returns
//! `Ok(None)`, or auto-expanding, in which case it constructs a batch of new objects on demand.
//! Objects are only ever destroyed when the pool is torn down.
//!
//! # Example
//!
//! ```
//! use recycle_pool::{PoolManager, PopulateOptions};
//!
//! #[derive(Debug)]
//! struct Bullet {
//!     kind: &'static str,
//!     position: (f32, f32),
//! }
//!
//! let mut manager = PoolManager::new();
//!
//! let bullets = manager
//!     .register::<Bullet, &'static str>()
//!     .construct(|ctx| Bullet {
//!         kind: *ctx.params(),
//!         position: (0.0, 0.0),
//!     })
//!     .reset(|bullet, kind| {
//!         bullet.kind = *kind;
//!         bullet.position = (0.0, 0.0);
//!     })
//!     .build()?;
//!
//! manager.populate(
//!     bullets,
//!     PopulateOptions::new()
//!         .initial_size(4)
//!         .auto_expand(true)
//!         .expand_step(2),
//!     "plasma",
//! )?;
//!
//! let lease = manager.acquire(bullets)?.expect("pool can expand");
//! manager.object_mut(bullets, lease).expect("leased").position = (10.0, 3.5);
//!
//! manager.release(bullets, lease)?;
//!
//! // Releasing twice is a bookkeeping bug and is reported as such.
//! assert!(manager.release(bullets, lease).is_err());
//!
//! manager.teardown(bullets)?;
//! # Ok::<(), recycle_pool::Error>(())
//! ```
//!
//! # Diagnostics
//!
//! [`PoolManager::set_debug_mode()`] turns on `tracing` events at debug level for every pool
//! operation. Install any `tracing` subscriber to see them.

mod builder;
mod context;
mod drop_policy;
mod error;
mod handle;
mod manager;
mod pool;
mod populate;
mod stats;

pub use builder::*;
pub use context::*;
pub use drop_policy::*;
pub use error::*;
pub use handle::*;
pub use manager::*;
pub use pool::Pool;
pub use populate::*;
pub use stats::*;
