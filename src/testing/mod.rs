//! Testing utilities for camtex
//!
//! An in-process camera service and GPU backend, so discovery and session
//! control can be exercised offline without camera hardware.

pub mod simulated;

pub use simulated::{
    SimulatedCamera, SimulatedCameraService, SimulatedFaults, SimulatedGraphics, SimulatedRig,
    SubmittedRequest,
};
