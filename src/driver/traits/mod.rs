//! Abstraction traits the firmware implements for the driver: CAN controller,
//! status indicators, and time base.
pub mod peripheral;
pub mod status_panel;
pub mod timebase;
