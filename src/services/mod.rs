//! Business logic services
//!
//! Services are plain functions, independent of the view layer.

pub mod onboarding;
