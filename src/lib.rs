// img-sizer library
// On-the-fly image resizing and cropping served over Pingora

pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod proxy;
pub mod rate_limit;
pub mod service;
pub mod sizer;
pub mod source;
pub mod storage;
