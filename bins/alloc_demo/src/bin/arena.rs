use container_alloc::{ArenaAllocator, Box};

fn main() -> Result<(), std::boxed::Box<dyn std::error::Error>> {
    alloc_demo::init_logging();

    log::info!("creating an arena for at least 10 i64s");
    let arena = ArenaAllocator::<i64>::new(10)?;

    log::info!("adding numbers to the list...");
    let mut list = Vec::new();
    for i in 0.. {
        match Box::new(i, &arena) {
            Ok(value) => list.push(value),
            Err(e) => {
                log::info!("ran out of space in the arena after {i} i64s: {e}");
                break;
            }
        }
    }

    log::info!(
        "arena capacity {} (requested {}), used {}",
        arena.capacity(),
        arena.min_capacity(),
        arena.used()
    );
    Ok(())
}
