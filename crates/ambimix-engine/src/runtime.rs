//! Async runtime around a [`Session`].
//!
//! The runtime task owns the session and serializes everything that touches
//! it: commands from handles, one-second timer ticks, and the outcomes of
//! play requests. Handles are cheap to clone and talk to the task over
//! channels.

use std::sync::Arc;
use std::time::Duration;

use ambimix_core::{Command, Notification, SessionSnapshot};
use arc_swap::ArcSwap;
use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, Interval};
use tracing::{debug, info, warn};

use crate::error::{EngineError, EngineResult};
use crate::output::PlayError;
use crate::session::{PendingPlay, Reply, Session};

/// Capacity of the command queue.
const COMMAND_CAPACITY: usize = 64;

/// Timer resolution.
const TICK_PERIOD: Duration = Duration::from_secs(1);

type PlayOutcome = (String, u64, Result<(), PlayError>);

struct Request {
    command: Command,
    reply: oneshot::Sender<EngineResult<Reply>>,
}

/// Handle to a running session.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<Request>,
    events: broadcast::Sender<Notification>,
    snapshot: Arc<ArcSwap<SessionSnapshot>>,
}

impl SessionHandle {
    /// Send a command and wait for its outcome.
    ///
    /// # Errors
    /// Returns the command's own error, or `SessionClosed` if the runtime has stopped.
    pub async fn send(&self, command: Command) -> EngineResult<Reply> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Request { command, reply })
            .await
            .map_err(|_| EngineError::SessionClosed)?;
        rx.await.map_err(|_| EngineError::SessionClosed)?
    }

    /// Subscribe to session notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.events.subscribe()
    }

    /// Latest published session state.
    #[must_use]
    pub fn snapshot(&self) -> Arc<SessionSnapshot> {
        self.snapshot.load_full()
    }

    /// Stop the runtime after silencing the output.
    ///
    /// # Errors
    /// Returns `SessionClosed` if the runtime has already stopped.
    pub async fn shutdown(&self) -> EngineResult<()> {
        self.send(Command::Shutdown).await.map(|_| ())
    }
}

/// Task state of a running session.
pub struct SessionRuntime {
    session: Session,
    commands: mpsc::Receiver<Request>,
    snapshot: Arc<ArcSwap<SessionSnapshot>>,
    /// Present while the countdown runs
    ticker: Option<Interval>,
    /// Countdown run the ticker belongs to
    ticker_run: u64,
    plays: FuturesUnordered<BoxFuture<'static, PlayOutcome>>,
}

impl SessionRuntime {
    /// Move the session onto a new task and return a handle to it.
    pub fn spawn(session: Session) -> (SessionHandle, JoinHandle<()>) {
        let (tx, commands) = mpsc::channel(COMMAND_CAPACITY);
        let snapshot = Arc::new(ArcSwap::from_pointee(session.snapshot()));

        let handle = SessionHandle { tx, events: session.notifier(), snapshot: Arc::clone(&snapshot) };

        let mut runtime =
            Self { session, commands, snapshot, ticker: None, ticker_run: 0, plays: FuturesUnordered::new() };
        // Plays issued before spawning, e.g. by a startup preset
        runtime.after_step();

        let task = tokio::spawn(runtime.run());
        (handle, task)
    }

    async fn run(mut self) {
        info!("Session runtime started");

        loop {
            tokio::select! {
                request = self.commands.recv() => {
                    let Some(Request { command, reply }) = request else {
                        debug!("All session handles dropped");
                        self.session.shutdown();
                        break;
                    };

                    let shutdown = matches!(command, Command::Shutdown);
                    let result = self.session.execute(command);
                    if let Err(e) = &result {
                        warn!(error = %e, "Command failed");
                    }
                    self.after_step();

                    // Caller may have given up waiting
                    let _ = reply.send(result);
                    if shutdown {
                        break;
                    }
                }
                () = next_tick(&mut self.ticker) => {
                    self.session.tick_timer();
                    self.after_step();
                }
                Some((channel, ticket, outcome)) = self.plays.next(), if !self.plays.is_empty() => {
                    if let Err(e) = self.session.resolve_play(&channel, ticket, outcome) {
                        warn!(channel = %channel, error = %e, "Play request failed");
                    }
                    self.after_step();
                }
            }
        }

        info!("Session runtime stopped");
    }

    /// Collect new play requests, follow the countdown, and publish state.
    fn after_step(&mut self) {
        for PendingPlay { channel, ticket, future } in self.session.take_pending_plays() {
            self.plays.push(future.map(move |outcome| (channel, ticket, outcome)).boxed());
        }

        self.sync_ticker();
        self.snapshot.store(Arc::new(self.session.snapshot()));
    }

    /// Keep exactly one tick source alive for the current countdown run.
    fn sync_ticker(&mut self) {
        let timer = self.session.timer();

        if !timer.is_running() {
            if self.ticker.take().is_some() {
                debug!(run = self.ticker_run, "Tick source stopped");
            }
            return;
        }

        if self.ticker.is_none() || self.ticker_run != timer.run_id() {
            self.ticker = Some(time::interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD));
            self.ticker_run = timer.run_id();
            debug!(run = self.ticker_run, "Tick source started");
        }
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use ambimix_core::Catalog;
    use ambimix_store::{MemoryStore, PresetStore};
    use assert_matches::assert_matches;

    use super::*;
    use crate::input::SliderLevels;
    use crate::output::AudioOutput;
    use crate::testing::FakeOutput;

    fn spawn_with(output: FakeOutput) -> (SessionHandle, JoinHandle<()>) {
        let presets = PresetStore::open(Box::new(MemoryStore::new())).unwrap();
        let mut session = Session::new(Catalog::default(), presets, output, SliderLevels::new());
        session.load_catalog("audio");
        SessionRuntime::spawn(session)
    }

    /// Collect notifications up to and including the first match.
    async fn collect_until(
        rx: &mut broadcast::Receiver<Notification>,
        done: impl Fn(&Notification) -> bool,
    ) -> Vec<Notification> {
        let mut seen = Vec::new();
        loop {
            let notification = rx.recv().await.unwrap();
            let finished = done(&notification);
            seen.push(notification);
            if finished {
                return seen;
            }
        }
    }

    fn count_ticks(notifications: &[Notification]) -> usize {
        notifications.iter().filter(|n| matches!(n, Notification::TimerTick { .. })).count()
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_counts_down_and_pauses() {
        let (handle, _task) = spawn_with(FakeOutput::new());
        let mut rx = handle.subscribe();

        handle.send(Command::ToggleChannel { channel: "rain".into() }).await.unwrap();
        let started = Instant::now();
        handle.send(Command::StartTimer { minutes: 1 }).await.unwrap();

        let seen = collect_until(&mut rx, |n| *n == Notification::TimerCompleted).await;

        assert_eq!(count_ticks(&seen), 61);
        assert_eq!(started.elapsed().as_secs(), 60);

        handle.send(Command::StopTimer).await.unwrap();
        let snapshot = handle.snapshot();
        let rain = snapshot.channels.iter().find(|c| c.id == "rain").unwrap();
        assert!(!rain.playing);
        assert_eq!(rain.volume, 50);
        assert!(!snapshot.any_playing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_replaces_running_countdown() {
        let (handle, _task) = spawn_with(FakeOutput::new());
        let mut rx = handle.subscribe();

        handle.send(Command::StartTimer { minutes: 1 }).await.unwrap();
        time::sleep(Duration::from_secs(30)).await;
        handle.send(Command::StartTimer { minutes: 2 }).await.unwrap();

        collect_until(&mut rx, |n| *n == Notification::TimerTick { minutes: 2, seconds: 0 }).await;
        let restarted = Instant::now();
        let seen = collect_until(&mut rx, |n| *n == Notification::TimerCompleted).await;

        // One tick per second of the new run, none left over from the old one
        assert_eq!(count_ticks(&seen), 120);
        assert_eq!(restarted.elapsed().as_secs(), 120);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopped_timer_stays_quiet() {
        let (handle, _task) = spawn_with(FakeOutput::new());
        let mut rx = handle.subscribe();

        handle.send(Command::StartTimer { minutes: 1 }).await.unwrap();
        handle.send(Command::StopTimer).await.unwrap();
        time::sleep(Duration::from_secs(120)).await;

        let seen: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
        assert_eq!(
            seen,
            vec![
                Notification::TimerTick { minutes: 1, seconds: 0 },
                Notification::TimerTick { minutes: 0, seconds: 0 },
            ]
        );
    }

    #[tokio::test]
    async fn test_rejected_play_is_rolled_back() {
        let output = FakeOutput::new();
        output.reject_play("thunder");
        let (handle, _task) = spawn_with(output);
        let mut rx = handle.subscribe();

        let reply = handle.send(Command::ToggleChannel { channel: "thunder".into() }).await.unwrap();
        assert_eq!(reply, Reply::Playing(true));

        collect_until(&mut rx, |n| {
            *n == Notification::ChannelPlayStateChanged { channel: "thunder".into(), playing: false }
        })
        .await;

        handle.send(Command::StopTimer).await.unwrap();
        let snapshot = handle.snapshot();
        let thunder = snapshot.channels.iter().find(|c| c.id == "thunder").unwrap();
        assert!(!thunder.playing);
        assert_eq!(thunder.volume, 0);
    }

    #[tokio::test]
    async fn test_command_errors_reach_caller() {
        let (handle, _task) = spawn_with(FakeOutput::new());

        let result = handle.send(Command::SaveCurrentMix { name: "Silence".into() }).await;

        assert_matches!(result, Err(EngineError::Core(ambimix_core::Error::EmptyMix)));
    }

    #[tokio::test]
    async fn test_snapshot_published_after_command() {
        let (handle, _task) = spawn_with(FakeOutput::new());
        assert_eq!(handle.snapshot().master_volume, 100);
        assert_eq!(handle.snapshot().presets.len(), 3);

        handle.send(Command::SetMasterVolume { volume: 40 }).await.unwrap();

        assert_eq!(handle.snapshot().master_volume, 40);
    }

    #[tokio::test]
    async fn test_shutdown_closes_session() {
        let output = FakeOutput::new();
        let (handle, task) = spawn_with(output.clone());
        handle.send(Command::ToggleChannel { channel: "wind".into() }).await.unwrap();

        handle.shutdown().await.unwrap();
        task.await.unwrap();

        assert!(!output.is_playing("wind"));
        assert_matches!(handle.send(Command::ToggleAll).await, Err(EngineError::SessionClosed));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_resume_after_set_volume_is_ordered() {
        let (handle, _task) = spawn_with(FakeOutput::new());

        for _ in 0..50 {
            handle.send(Command::SetChannelVolume { channel: "rain".into(), volume: 70 }).await.unwrap();
            handle.send(Command::ToggleChannel { channel: "rain".into() }).await.unwrap();

            let snapshot = handle.snapshot();
            let rain = snapshot.channels.iter().find(|c| c.id == "rain").unwrap();
            assert!(rain.playing);
            assert_eq!(rain.volume, 70);

            handle.send(Command::ToggleChannel { channel: "rain".into() }).await.unwrap();
        }
    }
}
