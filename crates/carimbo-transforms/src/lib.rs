#![forbid(unsafe_code)]

//! Transform pipeline engine for the carimbo signature library.
//!
//! Implements the transform chain model from XML-DSig: each reference
//! contains a sequence of transforms that are applied in order. The fiscal
//! profile uses exactly two: enveloped-signature followed by inclusive C14N.

pub mod enveloped;
pub mod pipeline;

pub use enveloped::EnvelopedSignatureTransform;
pub use pipeline::{C14nTransform, Transform, TransformData, TransformPipeline};
