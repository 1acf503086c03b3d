//! Pass timing.
//!
//! Every pass run by a [`PassPipeline`](crate::PassPipeline) holds a [`TimingToken`] while it
//! runs. Elapsed wall time and run counts are accumulated per thread, and [`take_current`] hands
//! them out as a [`PassTimes`] report.

use core::fmt;
use std::cell::RefCell;
use std::time::{Duration, Instant};

/// Something timed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pass {
    /// A whole pipeline run, including verification.
    Pipeline,
    /// The module verifier.
    VerifyModule,
    /// All-gather canonicalization.
    CanonicalizeAllGather,
}

const NUM_PASSES: usize = 3;

impl Pass {
    /// Every pass, in report order.
    pub const ALL: [Pass; NUM_PASSES] = [
        Pass::Pipeline,
        Pass::VerifyModule,
        Pass::CanonicalizeAllGather,
    ];

    fn slot(self) -> usize {
        self as usize
    }

    /// Human readable name, used in the report.
    pub fn description(self) -> &'static str {
        match self {
            Pass::Pipeline => "Pass pipeline",
            Pass::VerifyModule => "Verify HLO module",
            Pass::CanonicalizeAllGather => "Canonicalize all-gathers for CSE",
        }
    }
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Time and run count of every pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PassTimes {
    elapsed: [Duration; NUM_PASSES],
    runs: [u32; NUM_PASSES],
}

impl PassTimes {
    /// Wall time spent in `pass`, including anything it ran.
    pub fn get(&self, pass: Pass) -> Duration {
        self.elapsed[pass.slot()]
    }

    /// Number of completed runs of `pass`.
    pub fn runs(&self, pass: Pass) -> u32 {
        self.runs[pass.slot()]
    }

    fn record(&mut self, pass: Pass, elapsed: Duration) {
        self.elapsed[pass.slot()] += elapsed;
        self.runs[pass.slot()] += 1;
    }
}

impl fmt::Display for PassTimes {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{:<34} {:>5} {:>12}", "pass", "runs", "time (ms)")?;
        for pass in Pass::ALL {
            let runs = self.runs(pass);
            if runs == 0 {
                continue;
            }
            let ms = self.get(pass).as_secs_f64() * 1e3;
            writeln!(f, "{:<34} {runs:>5} {ms:>12.3}", pass.description())?;
        }
        Ok(())
    }
}

thread_local! {
    static TIMES: RefCell<PassTimes> = RefCell::default();
}

/// Measures one run of a pass; the time is recorded when the token is dropped.
#[must_use]
pub struct TimingToken {
    pass: Pass,
    start: Instant,
}

/// Start timing a run of `pass`.
pub fn start(pass: Pass) -> TimingToken {
    log::debug!("timing: {pass} started");
    TimingToken {
        pass,
        start: Instant::now(),
    }
}

impl Drop for TimingToken {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        log::debug!("timing: {} took {elapsed:?}", self.pass);
        TIMES.with(|times| times.borrow_mut().record(self.pass, elapsed));
    }
}

/// Return the times accumulated on this thread, and start over.
pub fn take_current() -> PassTimes {
    TIMES.with(|times| times.take())
}
