#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

#[doc(inline)]
pub use facewarp_image as image;

#[doc(inline)]
pub use facewarp_imgwarp as imgwarp;
