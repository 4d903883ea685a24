//! Utility re-exports and helper macros for the drive layer.
//!
//! - `config`: pin tables and the build-time backend selection
//! - `controllers`: the motor driver, its backends and command dispatch
//!
//! The `mk_static!` macro simplifies static initialization in no-std contexts.

pub mod config;
pub mod controllers;

pub use config::ACTIVE;
pub use controllers::{MotorChannel, MotorController, MotorDriver, Speed};
#[doc(hidden)]
pub use static_cell;

#[macro_export]
/// Initialize a no-std static cell and write the given value into it.
///
/// This macro creates a `static_cell::StaticCell` for type `$t` and initializes
/// it with `$val`, returning a mutable reference to the stored value.
macro_rules! mk_static {
    ($t:ty, $val:expr) => {{
        static STATIC_CELL: $crate::utils::static_cell::StaticCell<$t> =
            $crate::utils::static_cell::StaticCell::new();
        STATIC_CELL.uninit().write($val)
    }};
}
