// This is free and unencumbered software released into the public domain.

mod catalog;
pub use catalog::*;

mod config;
pub use config::*;

mod driver;
pub use driver::*;

pub mod drivers {
    #[cfg(all(feature = "android", target_os = "android"))]
    #[allow(unsafe_code)]
    pub mod camera2;
}

mod error;
pub use error::*;

mod fps;
pub use fps::*;

mod frame;
pub use frame::*;

mod open;
pub use open::*;

mod platform;
pub use platform::*;

mod pool;
pub use pool::*;

mod session;
pub use session::*;

mod size;
pub use size::*;

mod yuv;
pub use yuv::*;
