//! Foundational primitives for weld-gap inspection.
//!
//! ## Image Views and Stride
//! Images use element stride (not byte stride). `stride` is the distance, in
//! elements, between adjacent row starts and may be greater than `width`.
//! Detectors accept borrowed views so a caller can hand in a region of
//! interest cut out of a larger frame without copying.
//!
//! ## Pixel Boxes
//! [`PixelBox`] uses inclusive integer corners, matching how box sums and
//! candidate boxes are reported. Coordinates may be negative while a box is
//! being computed; [`PixelBox::clamped`] brings it back inside an image.
//!
//! ## Running Statistics
//! [`RingBuffer`], [`BucketHistogram`] and [`LineRegression`] are small
//! accumulators shared by the scanning, chaining and feature stages.

mod boxsum;
mod error;
mod geom;
mod histogram;
mod image;
mod overlay;
mod regression;
mod ring;

pub use boxsum::{BoxSummer, box_sum};
pub use error::Error;
pub use geom::PixelBox;
pub use histogram::BucketHistogram;
pub use image::{Image, ImageView};
pub use overlay::{Color, NullOverlay, OverlayLayer, OverlaySink, Primitive};
pub use regression::{LineFit, LineRegression};
pub use ring::RingBuffer;
