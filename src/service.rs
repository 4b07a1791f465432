//! Dedicated periodic worker (std only).
//!
//! The worker thread owns the axis. Callers talk to it through an
//! [`AxisHandle`], which queues [`MotionCommand`]s on a channel. Each worker
//! iteration drains the queue, applies the commands, ticks once and publishes
//! an [`AxisStatus`] snapshot, then sleeps for whatever is left of the period.
//! The snapshot lock is only ever `try_lock`ed by the worker, so a slow reader
//! delays the snapshot, never the tick.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use embedded_hal::digital::OutputPin;

use crate::clock::Clock;
use crate::config::ServiceConfig;
use crate::error::{Error, Result, ServiceError};
use crate::events::MotionEvents;
use crate::motion::{direction_sign, MotionPhase};
use crate::motor::{Length, Mode, MotionCommand, StepperAxis};

/// Snapshot of an axis published by the worker after every tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisStatus {
    /// Current position in steps.
    pub position: i64,
    /// Target position in steps.
    pub target: i64,
    /// Signed velocity in steps/s.
    pub velocity: f32,
    /// Operating mode.
    pub mode: Mode,
    /// Phase of the current move.
    pub phase: MotionPhase,
    /// Whether the axis has been homed.
    pub is_homed: bool,
    /// Whether the brake is engaged.
    pub brake_active: bool,
    /// Whether an emergency stop is in effect.
    pub emergency_stop_active: bool,
    /// Direction refused by a limit switch: `-1`, `0` or `1`.
    pub disallowed_direction: i8,
    /// Whether the axis is at rest on its target.
    pub motion_complete: bool,
    /// Commands applied by the worker so far.
    pub commands_applied: u64,
}

impl Default for AxisStatus {
    fn default() -> Self {
        Self {
            position: 0,
            target: 0,
            velocity: 0.0,
            mode: Mode::Idle,
            phase: MotionPhase::Complete,
            is_homed: false,
            brake_active: false,
            emergency_stop_active: false,
            disallowed_direction: 0,
            motion_complete: true,
            commands_applied: 0,
        }
    }
}

/// An axis the worker can drive.
pub trait ServiceAxis: Send + 'static {
    /// Apply one queued command; `Ok(false)` if the axis rejected it.
    fn apply(&mut self, command: MotionCommand) -> Result<bool>;
    /// Run one tick.
    fn tick(&mut self) -> Result<bool>;
    /// Current state, for publishing.
    fn status(&self) -> AxisStatus;
}

impl<STEP, DIR, CLK, BRAKE, EV> ServiceAxis for StepperAxis<STEP, DIR, CLK, BRAKE, EV>
where
    STEP: OutputPin + Send + 'static,
    DIR: OutputPin + Send + 'static,
    CLK: Clock + Send + 'static,
    BRAKE: OutputPin + Send + 'static,
    EV: MotionEvents + Send + 'static,
{
    fn apply(&mut self, command: MotionCommand) -> Result<bool> {
        StepperAxis::apply(self, command)
    }

    fn tick(&mut self) -> Result<bool> {
        StepperAxis::tick(self)
    }

    fn status(&self) -> AxisStatus {
        AxisStatus {
            position: self.current_position_in_steps(),
            target: self.target_position_in_steps(),
            velocity: self.current_velocity_in_steps_per_second(),
            mode: self.mode(),
            phase: self.phase(),
            is_homed: self.is_homed(),
            brake_active: self.is_brake_active(),
            emergency_stop_active: self.is_emergency_stop_active(),
            disallowed_direction: direction_sign(self.safety().disallowed_direction()),
            motion_complete: self.motion_complete(),
            commands_applied: 0,
        }
    }
}

/// State shared between the worker and its handles.
struct Shared {
    running: AtomicBool,
    /// Smallest slack seen, in microseconds; `u64::MAX` before the first iteration.
    headroom_us: AtomicU64,
    commands_sent: AtomicU64,
    status: Mutex<AxisStatus>,
    last_error: Mutex<Option<Error>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Caller-side access to an axis owned by a worker.
#[derive(Clone)]
pub struct AxisHandle {
    tx: Sender<MotionCommand>,
    shared: Arc<Shared>,
}

impl AxisHandle {
    /// Queue a command for the next tick.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotRunning`] once the worker has stopped.
    pub fn send(&self, command: MotionCommand) -> Result<()> {
        if !self.shared.running.load(Ordering::Acquire) {
            return Err(ServiceError::NotRunning.into());
        }
        self.tx
            .send(command)
            .map_err(|_| Error::Service(ServiceError::NotRunning))?;
        self.shared.commands_sent.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    /// Queue a move to an absolute position in steps.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotRunning`] once the worker has stopped.
    pub fn set_target_position_in_steps(&self, target: i64) -> Result<()> {
        self.send(MotionCommand::SetTargetPosition(Length::Steps(target)))
    }

    /// Queue an emergency stop.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotRunning`] once the worker has stopped.
    pub fn emergency_stop(&self, hold_until_release: bool) -> Result<()> {
        self.send(MotionCommand::EmergencyStop { hold_until_release })
    }

    /// Queue the release of a held emergency stop.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotRunning`] once the worker has stopped.
    pub fn release_emergency_stop(&self) -> Result<()> {
        self.send(MotionCommand::ReleaseEmergencyStop)
    }

    /// Latest published snapshot.
    pub fn status(&self) -> AxisStatus {
        *lock(&self.shared.status)
    }

    /// Wait until every command sent so far is applied and the axis has settled.
    ///
    /// Returns `Ok(false)` on timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::NotRunning`] if the worker stops while waiting.
    pub fn wait_until_settled(&self, timeout: Duration) -> Result<bool> {
        let deadline = Instant::now() + timeout;
        loop {
            let sent = self.shared.commands_sent.load(Ordering::Acquire);
            let status = self.status();
            if status.commands_applied >= sent && status.motion_complete {
                return Ok(true);
            }
            if !self.shared.running.load(Ordering::Acquire) {
                return Err(ServiceError::NotRunning.into());
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            thread::sleep(Duration::from_micros(500));
        }
    }
}

/// A worker thread ticking one axis at a fixed period.
pub struct ServiceRunner<A: ServiceAxis> {
    handle: AxisHandle,
    worker: Option<JoinHandle<A>>,
}

impl<A: ServiceAxis> ServiceRunner<A> {
    /// Move `axis` onto a new worker thread and start ticking.
    ///
    /// # Errors
    ///
    /// Returns an error if the period is zero or the thread cannot be spawned.
    pub fn start(axis: A, config: &ServiceConfig) -> Result<Self> {
        Self::start_with(axis, config, |_| {})
    }

    /// Like [`Self::start`], running `on_start` on the worker thread first.
    ///
    /// The hook receives the configuration, so it can apply
    /// [`ServiceConfig::affinity_hint`] or a priority with a platform API.
    ///
    /// # Errors
    ///
    /// Returns an error if the period is zero or the thread cannot be spawned.
    pub fn start_with<F>(axis: A, config: &ServiceConfig, on_start: F) -> Result<Self>
    where
        F: FnOnce(&ServiceConfig) + Send + 'static,
    {
        if config.period_us == 0 {
            return Err(crate::error::ConfigError::InvalidServicePeriod(0).into());
        }

        let (tx, rx) = mpsc::channel();
        let shared = Arc::new(Shared {
            running: AtomicBool::new(true),
            headroom_us: AtomicU64::new(u64::MAX),
            commands_sent: AtomicU64::new(0),
            status: Mutex::new(axis.status()),
            last_error: Mutex::new(None),
        });

        let mut builder = thread::Builder::new().name(config.name.as_str().to_owned());
        if let Some(stack_size) = config.stack_size {
            builder = builder.stack_size(stack_size);
        }

        let worker_shared = Arc::clone(&shared);
        let worker_config = config.clone();
        let worker = builder
            .spawn(move || {
                on_start(&worker_config);
                run(axis, rx, &worker_shared, &worker_config)
            })
            .map_err(|e| {
                shared.running.store(false, Ordering::Release);
                let mut msg = heapless::String::new();
                for c in e.to_string().chars() {
                    if msg.push(c).is_err() {
                        break;
                    }
                }
                Error::Service(ServiceError::SpawnFailed(msg))
            })?;

        Ok(Self {
            handle: AxisHandle { tx, shared },
            worker: Some(worker),
        })
    }

    /// A handle for sending commands and reading status.
    pub fn handle(&self) -> AxisHandle {
        self.handle.clone()
    }

    /// Whether the worker is still ticking.
    pub fn is_running(&self) -> bool {
        self.handle.shared.running.load(Ordering::Acquire)
            && self.worker.as_ref().is_some_and(|w| !w.is_finished())
    }

    /// Smallest slack seen between the tick period and an iteration's run time.
    ///
    /// `None` before the first iteration. Zero means an iteration overran.
    pub fn headroom(&self) -> Option<Duration> {
        match self.handle.shared.headroom_us.load(Ordering::Relaxed) {
            u64::MAX => None,
            us => Some(Duration::from_micros(us)),
        }
    }

    /// The error that stopped the worker, if any.
    pub fn last_error(&self) -> Option<Error> {
        lock(&self.handle.shared.last_error).clone()
    }

    /// Stop the worker and take the axis back.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::WorkerPanicked`] if the worker thread panicked.
    pub fn stop(mut self) -> Result<A> {
        self.handle.shared.running.store(false, Ordering::Release);
        let worker = self
            .worker
            .take()
            .ok_or(Error::Service(ServiceError::NotRunning))?;
        worker
            .join()
            .map_err(|_| Error::Service(ServiceError::WorkerPanicked))
    }
}

impl<A: ServiceAxis> Drop for ServiceRunner<A> {
    fn drop(&mut self) {
        self.handle.shared.running.store(false, Ordering::Release);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn run<A: ServiceAxis>(
    mut axis: A,
    rx: Receiver<MotionCommand>,
    shared: &Shared,
    config: &ServiceConfig,
) -> A {
    let period = Duration::from_micros(config.period_us as u64);
    let mut applied: u64 = 0;
    info!("{}: worker started, period {} us", config.name.as_str(), config.period_us);

    while shared.running.load(Ordering::Acquire) {
        let started = Instant::now();

        if let Err(e) = iterate(&mut axis, &rx, &mut applied) {
            error!("{}: tick failed, worker stopping", config.name.as_str());
            *lock(&shared.last_error) = Some(e);
            break;
        }

        if let Ok(mut status) = shared.status.try_lock() {
            *status = AxisStatus {
                commands_applied: applied,
                ..axis.status()
            };
        }

        let slack = period.saturating_sub(started.elapsed());
        shared
            .headroom_us
            .fetch_min(slack.as_micros() as u64, Ordering::Relaxed);
        if !slack.is_zero() {
            thread::sleep(slack);
        }
    }

    shared.running.store(false, Ordering::Release);
    info!("{}: worker stopped", config.name.as_str());
    axis
}

/// Drain queued commands, then tick once.
fn iterate<A: ServiceAxis>(
    axis: &mut A,
    rx: &Receiver<MotionCommand>,
    applied: &mut u64,
) -> Result<()> {
    loop {
        match rx.try_recv() {
            Ok(command) => {
                if !axis.apply(command)? {
                    debug!("worker: command {} rejected", *applied);
                }
                *applied += 1;
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
        }
    }
    axis.tick()?;
    Ok(())
}
