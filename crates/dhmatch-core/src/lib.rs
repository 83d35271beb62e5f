pub mod config;
pub mod consts;
pub mod coords;
pub mod correlate;
pub mod error;
pub mod matcher;
pub mod patch;
pub mod peak;
pub mod spectral;
pub mod subpixel;
pub mod synthetic;
pub mod template;
