//! Two binary status indicators (typically LEDs) shared by the error handler,
//! the self-test harness and the application loop.

/// Which indicator to drive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Indicator {
    /// Traffic and passed tests.
    Activity,
    /// Bus errors and failed tests.
    Error,
}

/// Output surface for the two indicators. The implementation decides which
/// pin backs each [`Indicator`].
pub trait StatusPanel {
    fn set(&mut self, indicator: Indicator, on: bool);
    fn toggle(&mut self, indicator: Indicator);
}

/// Panel for boards without indicators.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoPanel;

impl StatusPanel for NoPanel {
    fn set(&mut self, _indicator: Indicator, _on: bool) {}
    fn toggle(&mut self, _indicator: Indicator) {}
}
