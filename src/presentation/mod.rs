//! Template contexts and render helpers.

pub mod views;
