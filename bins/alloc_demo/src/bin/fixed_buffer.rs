use container_alloc::{Box, FixedBufferAllocator};

fn main() {
    alloc_demo::init_logging();

    let alloc = FixedBufferAllocator::<i32, 10>::new();
    let values = match Box::from_fn(10, &alloc, |i| i as i32) {
        Ok(values) => values,
        Err(e) => {
            log::error!("could not fill the buffer: {e}");
            std::process::exit(1);
        }
    };
    log::info!("buffer contents: {:?}", &*values);

    if let Err(e) = Box::new(10, &alloc) {
        log::info!("out of space as expected: {e}");
    };
}
