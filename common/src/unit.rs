//! Marker types distinguishing kinds of [`DateTimeOf`].
//!
//! [`DateTimeOf`]: crate::DateTimeOf

/// Marker type describing an entity creation.
#[derive(Clone, Copy, Debug)]
pub struct Creation;

/// Marker type describing a payment deadline.
#[derive(Clone, Copy, Debug)]
pub struct Due;

/// Marker type describing an entity expiration.
#[derive(Clone, Copy, Debug)]
pub struct Expiration;
