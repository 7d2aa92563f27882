pub mod antic;
pub mod gtia;
pub mod postprocessor;

pub use antic::Antic;
pub use gtia::Gtia;
pub use postprocessor::Postprocessor;
