//! Default capability implementations.
//!
//! Pure-Rust backends built on the `image` and `webp` crates:
//! - [`NativeProbe`]: header-only dimension measurement
//! - [`NativeCodec`]: decode/draw/encode primitives
//! - [`NativeCompressor`]: descending-quality compression toward a byte budget

mod codec;
mod compressor;
mod probe;

pub use codec::NativeCodec;
pub use compressor::NativeCompressor;
pub use probe::NativeProbe;
