//! Integration tests for the permission algebra: inclusion, merging, diffing and planning.

mod calls;
mod plan;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .without_time()
        .with_test_writer()
        .try_init();
}
