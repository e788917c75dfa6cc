//! BlendLab: interactive layer compositing.
//!
//! The pipeline modules ([`buffer`], [`resample`], [`blend`], [`compose`],
//! [`curve`], [`histogram`]) are UI-free; [`app`] and [`components`] wrap
//! them in an eframe shell, and [`io`] is the codec seam around the `image`
//! crate.

#[macro_use]
pub mod logger;

pub mod app;
pub mod blend;
pub mod buffer;
pub mod components;
pub mod compose;
pub mod curve;
pub mod histogram;
pub mod io;
pub mod resample;
