pub mod autofocus;
pub mod consts;
pub mod device;
pub mod error;
pub mod filters;
pub mod frame;
pub mod io;
pub mod quality;
pub mod search;
pub mod sim;
pub mod transform;
