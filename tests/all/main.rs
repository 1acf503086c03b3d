mod evaluator;
mod pipeline;
mod properties;

use hlo_ir::{ElementType, Shape};

/// Route pass logging to the test output; set `RUST_LOG=debug` to see it.
pub(crate) fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub(crate) fn f32(dims: &[u64]) -> Shape {
    Shape::array(ElementType::F32, dims)
}
