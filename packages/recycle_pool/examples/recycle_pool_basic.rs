//! Basic usage of the `recycle_pool` crate:
//!
//! * Registering and populating a pool.
//! * Acquiring and releasing objects.
//! * Growing an auto-expanding pool.
//! * Tearing the pool down.
//!
//! Run with `RUST_LOG=debug` to see the diagnostics emitted in debug mode.

use recycle_pool::{Cancellable, PoolManager, PopulateOptions};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
struct Particle {
    color: &'static str,
    position: (f32, f32),
    pending_fades: Vec<u32>,
}

impl Cancellable for Particle {
    fn cancel_pending(&mut self) {
        self.pending_fades.clear();
    }
}

fn main() -> Result<(), recycle_pool::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut manager = PoolManager::new();
    manager.set_debug_mode(true);

    let sparks = manager
        .register::<Particle, &'static str>()
        .construct(|ctx| Particle {
            color: *ctx.params(),
            position: (0.0, 0.0),
            pending_fades: Vec::new(),
        })
        .reset(|particle, color| {
            particle.color = *color;
            particle.position = (0.0, 0.0);
        })
        .cancel_pending()
        .build()?;

    manager.populate(
        sparks,
        PopulateOptions::new()
            .initial_size(2)
            .auto_expand(true)
            .expand_step(4),
        "orange",
    )?;

    // Leasing more objects than were pre-filled makes the pool grow by a batch of four.
    let mut leases = Vec::new();

    for index in 0_u8..3 {
        let lease = manager.acquire(sparks)?.expect("the pool expands on demand");

        let particle = manager.object_mut(sparks, lease).expect("lease is live");
        particle.position = (f32::from(index), 1.0);
        particle.pending_fades.push(u32::from(index));

        leases.push(lease);
    }

    let stats = manager.stats(sparks).expect("pool is registered");
    println!(
        "{} particles leased, {} free, {} constructed in total",
        stats.in_use, stats.free, stats.constructed
    );

    for lease in leases {
        manager.release(sparks, lease)?;
    }

    // The most recently released particle comes back first, already scrubbed.
    let lease = manager.acquire(sparks)?.expect("free particles are available");
    println!(
        "Recycled particle: {:?}",
        manager.object(sparks, lease).expect("lease is live")
    );

    let destroyed = manager.teardown(sparks)?;
    println!("Teardown destroyed {destroyed} particles");

    Ok(())
}
