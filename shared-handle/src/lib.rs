pub mod shared_handle;
pub use shared_handle::*;
