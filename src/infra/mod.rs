//! Timing helpers independent from the controller.
pub mod deadline;
