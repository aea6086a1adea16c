pub mod archive;
pub mod config;
pub mod error;
pub mod host;
pub mod hostmap;
pub mod http;
pub mod hugepages;
pub mod installer;
pub mod logging;
pub mod release;
pub mod retry;
