//! Read entities definitions.

pub mod contract;
pub mod invoice;
pub mod promotion;
pub mod settings;
