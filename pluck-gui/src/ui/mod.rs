//! # UI Module
//!
//! This module contains all UI components for the Pluck tuner application.

pub mod cent_meter;
pub mod main_display;
