//! Step hooks: the single suspension point of the execution loop.
//!
//! A hook runs before every token is evaluated and before every step of a
//! loop-bracket scan. It may sleep (throttling) or block (single-stepping).
//! If it returns an error the machine stops right there, before the
//! instruction body runs.
//!
//! [`Stepper`] is the stock controller: a cloneable handle that switches
//! its hook between throttling and single-stepping at any time, from any
//! thread.

use crate::config::DEFAULT_STEP_DELAY;
use crate::error::StepError;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

/// Called before each machine transition.
pub trait StepHook: Send {
    fn before_step(&mut self) -> Result<(), StepError>;
}

impl<F> StepHook for F
where
    F: FnMut() -> Result<(), StepError> + Send,
{
    fn before_step(&mut self) -> Result<(), StepError> {
        self()
    }
}

/// How a [`Stepper`]'s hook paces execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepMode {
    /// Sleep for the current delay, then continue.
    Throttle,
    /// Block until [`Stepper::step`] releases one step.
    SingleStep,
}

#[derive(Debug)]
struct Control {
    mode: StepMode,
    delay: Duration,
    permits: usize,
    cancelled: bool,
    controllers: usize,
}

#[derive(Debug)]
struct Shared {
    control: Mutex<Control>,
    changed: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Control> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Live pacing control for a running machine.
///
/// Every clone controls the same hook. When the last clone is dropped, a
/// hook blocked in single-step mode fails with
/// [`StepError::Disconnected`] instead of waiting forever.
#[derive(Debug)]
pub struct Stepper {
    shared: Arc<Shared>,
}

impl Stepper {
    /// A running stepper that sleeps for `delay` before each step.
    pub fn new(delay: Duration) -> Self {
        Self {
            shared: Arc::new(Shared {
                control: Mutex::new(Control {
                    mode: StepMode::Throttle,
                    delay,
                    permits: 0,
                    cancelled: false,
                    controllers: 1,
                }),
                changed: Condvar::new(),
            }),
        }
    }

    /// A hook driven by this stepper, to install on a machine.
    pub fn hook(&self) -> StepperHook {
        StepperHook {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn mode(&self) -> StepMode {
        self.shared.lock().mode
    }

    /// True while throttling, false while single-stepping.
    pub fn is_running(&self) -> bool {
        self.mode() == StepMode::Throttle
    }

    pub fn delay(&self) -> Duration {
        self.shared.lock().delay
    }

    /// Change the throttle delay. Takes effect from the next step.
    pub fn set_delay(&self, delay: Duration) {
        self.shared.lock().delay = delay;
    }

    /// Add `delta_ms` to the delay, clamping at zero.
    pub fn change_speed(&self, delta_ms: i64) {
        let mut control = self.shared.lock();
        let current = control.delay.as_millis() as i64;
        let next = current.saturating_add(delta_ms).max(0);
        control.delay = Duration::from_millis(next as u64);
    }

    /// Switch to single-step mode. Steps released earlier are discarded.
    pub fn pause(&self) {
        let mut control = self.shared.lock();
        control.mode = StepMode::SingleStep;
        control.permits = 0;
    }

    /// Switch back to throttling and wake a blocked hook.
    pub fn resume(&self) {
        let mut control = self.shared.lock();
        control.mode = StepMode::Throttle;
        control.permits = 0;
        self.shared.changed.notify_all();
    }

    /// Release one step. Returns false (and does nothing) while running.
    pub fn step(&self) -> bool {
        let mut control = self.shared.lock();
        if control.mode != StepMode::SingleStep {
            return false;
        }
        control.permits += 1;
        self.shared.changed.notify_all();
        true
    }

    /// Make the hook fail with [`StepError::Cancelled`] at its next call,
    /// waking it if it is blocked.
    pub fn cancel(&self) {
        self.shared.lock().cancelled = true;
        self.shared.changed.notify_all();
    }

    /// Clear a previous cancellation and any released steps.
    pub fn reset(&self) {
        let mut control = self.shared.lock();
        control.cancelled = false;
        control.permits = 0;
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.lock().cancelled
    }
}

impl Default for Stepper {
    fn default() -> Self {
        Self::new(DEFAULT_STEP_DELAY)
    }
}

impl Clone for Stepper {
    fn clone(&self) -> Self {
        self.shared.lock().controllers += 1;
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl Drop for Stepper {
    fn drop(&mut self) {
        let mut control = self.shared.lock();
        control.controllers -= 1;
        if control.controllers == 0 {
            self.shared.changed.notify_all();
        }
    }
}

/// The hook side of a [`Stepper`].
#[derive(Debug)]
pub struct StepperHook {
    shared: Arc<Shared>,
}

impl StepHook for StepperHook {
    fn before_step(&mut self) -> Result<(), StepError> {
        let mut control = self.shared.lock();
        loop {
            if control.cancelled {
                return Err(StepError::Cancelled);
            }
            match control.mode {
                StepMode::Throttle => {
                    let delay = control.delay;
                    drop(control);
                    if !delay.is_zero() {
                        thread::sleep(delay);
                    }
                    return Ok(());
                }
                StepMode::SingleStep if control.permits > 0 => {
                    control.permits -= 1;
                    return Ok(());
                }
                StepMode::SingleStep if control.controllers == 0 => {
                    return Err(StepError::Disconnected);
                }
                StepMode::SingleStep => {
                    control = self
                        .shared
                        .changed
                        .wait(control)
                        .unwrap_or_else(PoisonError::into_inner);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Instant;

    #[test]
    fn closures_are_hooks() {
        let mut calls = 0;
        {
            let mut hook = || {
                calls += 1;
                Ok::<(), StepError>(())
            };
            hook.before_step().unwrap();
            hook.before_step().unwrap();
        }
        assert_eq!(calls, 2);
    }

    #[test]
    fn throttle_sleeps_for_the_current_delay() {
        let stepper = Stepper::new(Duration::from_millis(5));
        let mut hook = stepper.hook();
        let started = Instant::now();
        assert_eq!(hook.before_step(), Ok(()));
        assert!(started.elapsed() >= Duration::from_millis(5));

        stepper.set_delay(Duration::ZERO);
        for _ in 0..100 {
            assert_eq!(hook.before_step(), Ok(()));
        }
    }

    #[test]
    fn change_speed_clamps_at_zero() {
        let stepper = Stepper::new(Duration::from_millis(4));
        stepper.change_speed(2);
        assert_eq!(stepper.delay(), Duration::from_millis(6));
        stepper.change_speed(-100);
        assert_eq!(stepper.delay(), Duration::ZERO);
    }

    #[test]
    fn step_is_ignored_while_running() {
        let stepper = Stepper::new(Duration::ZERO);
        assert!(stepper.is_running());
        assert!(!stepper.step());
        stepper.pause();
        assert!(!stepper.is_running());
        assert!(stepper.step());
    }

    #[test]
    fn released_steps_are_consumed_one_at_a_time() {
        let stepper = Stepper::new(Duration::ZERO);
        let mut hook = stepper.hook();
        stepper.pause();
        stepper.step();
        stepper.step();
        assert_eq!(hook.before_step(), Ok(()));
        assert_eq!(hook.before_step(), Ok(()));
        stepper.cancel();
        assert_eq!(hook.before_step(), Err(StepError::Cancelled));
    }

    #[test]
    fn pause_discards_pending_steps() {
        let stepper = Stepper::new(Duration::ZERO);
        stepper.pause();
        stepper.step();
        stepper.pause();
        stepper.cancel();
        assert_eq!(stepper.hook().before_step(), Err(StepError::Cancelled));
    }

    #[test]
    fn reset_clears_cancellation() {
        let stepper = Stepper::new(Duration::ZERO);
        let mut hook = stepper.hook();
        stepper.cancel();
        assert!(stepper.is_cancelled());
        assert_eq!(hook.before_step(), Err(StepError::Cancelled));
        stepper.reset();
        assert_eq!(hook.before_step(), Ok(()));
    }

    #[test]
    fn blocked_hook_wakes_on_step() {
        let stepper = Stepper::new(Duration::ZERO);
        stepper.pause();
        let mut hook = stepper.hook();
        let (tx, rx) = mpsc::channel();
        let worker = thread::spawn(move || {
            let result = hook.before_step();
            tx.send(()).unwrap();
            result
        });
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
        stepper.step();
        assert_eq!(worker.join().unwrap(), Ok(()));
    }

    #[test]
    fn blocked_hook_wakes_on_resume() {
        let stepper = Stepper::new(Duration::ZERO);
        stepper.pause();
        let mut hook = stepper.hook();
        let worker = thread::spawn(move || hook.before_step());
        thread::sleep(Duration::from_millis(20));
        stepper.resume();
        assert_eq!(worker.join().unwrap(), Ok(()));
    }

    #[test]
    fn dropping_last_controller_disconnects() {
        let stepper = Stepper::new(Duration::ZERO);
        stepper.pause();
        let mut hook = stepper.hook();
        let second = stepper.clone();
        drop(stepper);
        let worker = thread::spawn(move || hook.before_step());
        thread::sleep(Duration::from_millis(20));
        drop(second);
        assert_eq!(worker.join().unwrap(), Err(StepError::Disconnected));
    }
}
