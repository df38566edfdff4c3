//! Convenient re-exports for working with protocol definitions.
//!
//! ## Examples
//!
//! ```
//! use cmdbuf_definitions::prelude::*;
//!
//! let protocol = define_raster_protocol().unwrap();
//! assert_eq!(protocol.name, "Raster");
//! ```

pub use crate::raster::{RASTER_FUNCTIONS, define_raster_protocol, raster_named_types, raster_overrides};
