use container_alloc::{Box, SlabAllocator};

fn main() {
    alloc_demo::init_logging();

    log::info!("creating a slab allocator for at least 10 i64s per cache");
    let slab = match SlabAllocator::<i64>::new(10) {
        Ok(slab) => slab,
        Err(e) => {
            log::error!("could not create slab allocator: {e}");
            std::process::exit(1);
        }
    };

    log::info!("adding numbers to the list...");
    let mut list = Vec::new();
    for i in 0..600 {
        match Box::new(i, &slab) {
            Ok(value) => list.push(value),
            Err(e) => {
                log::error!("allocation {i} failed: {e}");
                std::process::exit(1);
            }
        }
    }
    log::info!(
        "{} objects live in {} caches of {} slabs",
        slab.allocated(),
        slab.cache_count(),
        slab.cache_size()
    );

    log::info!("deleting even numbers from the list...");
    list.retain(|value| **value % 2 != 0);
    log::info!(
        "{} objects live in {} caches",
        slab.allocated(),
        slab.cache_count()
    );

    if let Err(e) = Box::from_fn(10, &slab, |i| i as i64) {
        log::info!("couldn't allocate a contiguous buffer: {e}");
    };
}
