//! Append-only record of test outcomes with running totals.

/// Number of cases in the battery.
pub const CASE_COUNT: usize = 6;

/// Cases of the self-test battery, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TestCase {
    Initialization,
    SingleTransmit,
    SingleReceive,
    DataIntegrity,
    SequentialBurst,
    ErrorFree,
}

impl TestCase {
    /// Battery order.
    pub const ALL: [TestCase; CASE_COUNT] = [
        TestCase::Initialization,
        TestCase::SingleTransmit,
        TestCase::SingleReceive,
        TestCase::DataIntegrity,
        TestCase::SequentialBurst,
        TestCase::ErrorFree,
    ];

    /// 1-based number, as shown on the status indicators.
    pub fn number(self) -> u8 {
        self as u8 + 1
    }

    pub fn name(self) -> &'static str {
        match self {
            TestCase::Initialization => "initialization",
            TestCase::SingleTransmit => "single transmit",
            TestCase::SingleReceive => "single receive",
            TestCase::DataIntegrity => "data integrity",
            TestCase::SequentialBurst => "sequential burst",
            TestCase::ErrorFree => "error-free operation",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
    Pass,
    Fail,
}

impl From<bool> for Outcome {
    fn from(passed: bool) -> Self {
        if passed {
            Outcome::Pass
        } else {
            Outcome::Fail
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TestRecord {
    pub case: TestCase,
    pub outcome: Outcome,
}

/// Ordered outcomes of one battery run.
///
/// Entries can only be appended; totals are updated with each entry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TestLedger {
    records: [Option<TestRecord>; CASE_COUNT],
    len: usize,
    passed: u32,
    failed: u32,
}

impl TestLedger {
    pub const fn new() -> Self {
        Self {
            records: [None; CASE_COUNT],
            len: 0,
            passed: 0,
            failed: 0,
        }
    }

    /// Append an outcome. Returns `false` (and records nothing) once full.
    pub(crate) fn record(&mut self, case: TestCase, outcome: Outcome) -> bool {
        if self.len == CASE_COUNT {
            return false;
        }
        self.records[self.len] = Some(TestRecord { case, outcome });
        self.len += 1;
        match outcome {
            Outcome::Pass => self.passed += 1,
            Outcome::Fail => self.failed += 1,
        }
        true
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn passed(&self) -> u32 {
        self.passed
    }

    pub fn failed(&self) -> u32 {
        self.failed
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0 && self.len > 0
    }

    /// Outcome of `case`, if it ran.
    pub fn outcome(&self, case: TestCase) -> Option<Outcome> {
        self.iter().find(|r| r.case == case).map(|r| r.outcome)
    }

    /// Records in execution order.
    pub fn iter(&self) -> impl Iterator<Item = TestRecord> + '_ {
        self.records[..self.len].iter().flatten().copied()
    }
}
