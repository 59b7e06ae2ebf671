//! Shared session handle
//!
//! Wraps a [`SpinOrchestrator`] for hosts that drive it from more than one
//! place (UI thread plus an autoplay thread). At most one step runs at a
//! time; a second request while one is in flight is rejected, not queued.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;

use crate::config::BonusConfig;
use crate::effects::{EffectRecord, NullPresenter, Presenter};
use crate::error::{BonusError, BonusResult};
use crate::orchestrator::{
    RoundPhase, RoundReport, RoundSnapshot, SessionStats, SpinOrchestrator, StepReport,
};

#[derive(Debug, Default)]
struct SessionFlags {
    in_flight: AtomicBool,
    autoplay: AtomicBool,
    steps: AtomicU64,
}

/// Clears the in-flight flag however the step exits
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Cloneable, thread-safe bonus session
#[derive(Clone)]
pub struct BonusSession {
    orchestrator: Arc<Mutex<SpinOrchestrator>>,
    flags: Arc<SessionFlags>,
    stats: Arc<Mutex<SessionStats>>,
}

impl BonusSession {
    pub fn new(orchestrator: SpinOrchestrator) -> Self {
        Self {
            orchestrator: Arc::new(Mutex::new(orchestrator)),
            flags: Arc::new(SessionFlags::default()),
            stats: Arc::new(Mutex::new(SessionStats::default())),
        }
    }

    pub fn from_config(config: BonusConfig) -> BonusResult<Self> {
        Ok(Self::new(SpinOrchestrator::with_config(config)?))
    }

    /// Run `f` against the orchestrator under the lock
    pub fn with<T>(&self, f: impl FnOnce(&mut SpinOrchestrator) -> T) -> T {
        f(&mut self.orchestrator.lock())
    }

    /// Current phase; `Stepping` while a step is in flight
    pub fn phase(&self) -> RoundPhase {
        if self.is_stepping() {
            return RoundPhase::Stepping;
        }
        self.orchestrator.lock().phase()
    }

    pub fn snapshot(&self) -> RoundSnapshot {
        self.orchestrator.lock().snapshot()
    }

    pub fn stats(&self) -> SessionStats {
        self.stats.lock().clone()
    }

    /// Steps executed over the session lifetime
    pub fn total_steps(&self) -> u64 {
        self.flags.steps.load(Ordering::Relaxed)
    }

    pub fn is_stepping(&self) -> bool {
        self.flags.in_flight.load(Ordering::SeqCst)
    }

    pub fn is_autoplay(&self) -> bool {
        self.flags.autoplay.load(Ordering::SeqCst)
    }

    pub fn start_bonus(&self) -> BonusResult<()> {
        self.orchestrator.lock().start_bonus()
    }

    pub fn spin_step(&self) -> BonusResult<StepReport> {
        self.spin_step_with(&mut NullPresenter)
    }

    /// Run one step unless another is already in flight
    pub fn spin_step_with(&self, presenter: &mut dyn Presenter) -> BonusResult<StepReport> {
        if self
            .flags
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            log::debug!("Step requested while another is running");
            return Err(BonusError::StepInProgress);
        }
        let _guard = InFlightGuard(&self.flags.in_flight);

        let report = self.orchestrator.lock().spin_step_with(presenter)?;
        self.flags.steps.fetch_add(1, Ordering::Relaxed);
        if let Some(outcome) = &report.outcome {
            self.stats.lock().record(outcome);
        }
        Ok(report)
    }

    pub fn click_cell(&self, col: usize, row: usize) -> BonusResult<Option<EffectRecord>> {
        if self.is_stepping() {
            return Err(BonusError::StepInProgress);
        }
        self.orchestrator.lock().click_cell(col, row)
    }

    /// Stop autoplay and clear the board
    pub fn reset_board(&self) -> BonusResult<()> {
        self.stop_autoplay();
        self.orchestrator.lock().reset_board()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // AUTOPLAY
    // ═══════════════════════════════════════════════════════════════════════

    /// Play the current round to its end, pausing between steps.
    ///
    /// `pacing` overrides the delay of the active timing profile. Returns
    /// `None` when [`stop_autoplay`](Self::stop_autoplay) cut the round short.
    pub fn run_autoplay(&self, pacing: Option<Duration>) -> BonusResult<Option<RoundReport>> {
        self.flags.autoplay.store(true, Ordering::SeqCst);
        self.autoplay_loop(pacing)
    }

    /// [`run_autoplay`](Self::run_autoplay) on a background thread
    pub fn spawn_autoplay(
        &self,
        pacing: Option<Duration>,
    ) -> JoinHandle<BonusResult<Option<RoundReport>>> {
        self.flags.autoplay.store(true, Ordering::SeqCst);
        let session = self.clone();
        thread::spawn(move || session.autoplay_loop(pacing))
    }

    pub fn stop_autoplay(&self) {
        if self.flags.autoplay.swap(false, Ordering::SeqCst) {
            log::info!("Autoplay stopped");
        }
    }

    fn autoplay_loop(&self, pacing: Option<Duration>) -> BonusResult<Option<RoundReport>> {
        let pacing = {
            let mut orch = self.orchestrator.lock();
            if matches!(orch.phase(), RoundPhase::Idle | RoundPhase::Ended(_)) {
                orch.start_bonus()?;
            }
            orch.set_autoplay(true);
            pacing.unwrap_or_else(|| {
                Duration::from_secs_f64(orch.timing().autoplay_pacing_ms / 1000.0)
            })
        };

        let result = self.autoplay_steps(pacing);

        self.flags.autoplay.store(false, Ordering::SeqCst);
        self.orchestrator.lock().set_autoplay(false);
        result
    }

    fn autoplay_steps(&self, pacing: Duration) -> BonusResult<Option<RoundReport>> {
        loop {
            if !self.is_autoplay() {
                return Ok(None);
            }
            match self.spin_step() {
                Ok(report) => {
                    if let Some(outcome) = report.outcome {
                        return Ok(Some(outcome));
                    }
                }
                Err(e) => match self.recover(e)? {
                    Recovery::Retry => {}
                    Recovery::Stop => return Ok(None),
                },
            }
            if pacing.is_zero() {
                thread::yield_now();
            } else {
                thread::sleep(pacing);
            }
        }
    }

    /// Decide how autoplay continues after a rejected step
    fn recover(&self, err: BonusError) -> BonusResult<Recovery> {
        // stopped or reset while the step was being requested
        if !self.is_autoplay() {
            log::debug!("Autoplay step failed after cancel: {err}");
            return Ok(Recovery::Stop);
        }
        match err {
            BonusError::StepInProgress => {
                log::debug!("Autoplay waiting on a step in flight");
                Ok(Recovery::Retry)
            }
            other => Err(other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Recovery {
    Retry,
    Stop,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::TimingProfile;

    fn session() -> BonusSession {
        let config = BonusConfig::default().with_timing(TimingProfile::Studio);
        let session = BonusSession::from_config(config).unwrap();
        session.with(|orch| orch.seed(42));
        session
    }

    #[test]
    fn test_step_rejected_while_in_flight() {
        let session = session();
        session.start_bonus().unwrap();

        session.flags.in_flight.store(true, Ordering::SeqCst);
        assert_eq!(session.phase(), RoundPhase::Stepping);
        assert!(matches!(session.spin_step(), Err(BonusError::StepInProgress)));
        assert!(matches!(session.click_cell(0, 2), Err(BonusError::StepInProgress)));

        session.flags.in_flight.store(false, Ordering::SeqCst);
        assert!(session.spin_step().is_ok());
        assert!(!session.is_stepping());
        assert_ne!(session.phase(), RoundPhase::Stepping);
    }

    #[test]
    fn test_failed_step_releases_flag() {
        let session = session();
        assert!(matches!(session.spin_step(), Err(BonusError::NotArmed)));
        assert!(!session.is_stepping());
    }

    #[test]
    fn test_autoplay_plays_round_out() {
        let session = session();
        let report = session
            .run_autoplay(Some(Duration::ZERO))
            .unwrap()
            .expect("round completed");

        assert!(session.phase().is_ended());
        assert!(!session.is_autoplay());
        assert_eq!(session.stats().rounds, 1);
        assert_eq!(session.total_steps(), report.steps as u64);
        assert!(!session.with(|orch| orch.state().autoplay));
    }

    #[test]
    fn test_stop_autoplay_from_other_thread() {
        let session = session();
        let handle = session.spawn_autoplay(Some(Duration::from_millis(200)));
        session.stop_autoplay();

        let result = handle.join().unwrap();
        assert!(result.is_ok());
        assert!(!session.is_autoplay());
        assert!(session.stats().rounds <= 1);
    }

    #[test]
    fn test_autoplay_waits_out_overlapping_step() {
        let session = session();
        session.flags.in_flight.store(true, Ordering::SeqCst);
        let handle = session.spawn_autoplay(Some(Duration::from_millis(1)));

        thread::sleep(Duration::from_millis(30));
        assert!(session.is_autoplay(), "autoplay survives a rejected step");
        assert_eq!(session.total_steps(), 0);
        assert_eq!(session.phase(), RoundPhase::Stepping);
        assert_eq!(session.with(|orch| orch.phase()), RoundPhase::Armed);

        session.flags.in_flight.store(false, Ordering::SeqCst);
        let report = handle.join().unwrap().unwrap();
        assert!(report.is_some());
        assert!(session.phase().is_ended());
        assert!(!session.is_autoplay());
    }

    #[test]
    fn test_recover_after_cancel_stops_quietly() {
        let session = session();
        session.flags.autoplay.store(false, Ordering::SeqCst);
        assert_eq!(session.recover(BonusError::NotArmed).unwrap(), Recovery::Stop);
        assert_eq!(
            session.recover(BonusError::StepInProgress).unwrap(),
            Recovery::Stop
        );
    }

    #[test]
    fn test_recover_while_running() {
        let session = session();
        session.flags.autoplay.store(true, Ordering::SeqCst);
        assert_eq!(
            session.recover(BonusError::StepInProgress).unwrap(),
            Recovery::Retry
        );
        assert!(matches!(
            session.recover(BonusError::NotArmed),
            Err(BonusError::NotArmed)
        ));
    }

    #[test]
    fn test_reset_during_autoplay_is_not_an_error() {
        let session = session();
        let handle = session.spawn_autoplay(Some(Duration::from_millis(2)));
        thread::sleep(Duration::from_millis(3));
        session.reset_board().unwrap();

        assert!(handle.join().unwrap().is_ok());
        assert!(!session.is_autoplay());
    }

    #[test]
    fn test_reset_stops_autoplay() {
        let session = session();
        session.run_autoplay(Some(Duration::ZERO)).unwrap();
        session.reset_board().unwrap();
        assert_eq!(session.phase(), RoundPhase::Idle);
        assert_eq!(session.snapshot().total, 0);
    }
}
