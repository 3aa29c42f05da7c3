//! This module finds the sequence of character modes with the shortest encoding.
//!
//! It is decoupled from the bit writing, the result is a list of
//! [segments](crate::encodation::Segment) for one version. The version
//! matters because the character count indicators grow with the symbol size.
mod frac;
mod shortest_path;

pub(crate) use shortest_path::optimize;
