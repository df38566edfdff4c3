//! Command Buffer Protocol Definitions
//!
//! This crate contains the actual protocol definitions that use the
//! primitives from `cmdbuf-define`. Each protocol lives in its own module
//! together with its signature file.
//!
//! ## Available Protocols
//!
//! - [`raster`] - Raster command buffer protocol
//!
//! ## Examples
//!
//! ```
//! use cmdbuf_definitions::raster::define_raster_protocol;
//!
//! let protocol = define_raster_protocol().unwrap();
//! assert_eq!(protocol.prefix, "raster");
//! ```

pub mod prelude;
pub mod raster;

// Re-export protocol definition functions for convenience
pub use raster::define_raster_protocol;
