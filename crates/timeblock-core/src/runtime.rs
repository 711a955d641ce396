//! Async host for a [`BlockEngine`].
//!
//! One actor task owns the engine, so ticks, user commands and block edits
//! are serialized without locks. The 1 Hz interval only exists while the
//! engine's countdown is running. Persistence runs on a separate writer task
//! that performs each batch on the blocking pool, in order, and reports
//! failed documents back so they are retried on the next debounce cycle.

use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::{Instant, Interval, MissedTickBehavior};

use crate::control::ControlCommand;
use crate::error::{CoreError, Result};
use crate::events::Event;
use crate::sinks::NotificationAction;
use crate::storage::{Document, DocumentStore, PendingWrite};
use crate::timer::BlockEngine;

const TICK_PERIOD: Duration = Duration::from_secs(1);
const FLUSH_POLL: Duration = Duration::from_millis(250);
const COMMAND_CAPACITY: usize = 32;
const EVENT_CAPACITY: usize = 128;

type Job = Box<dyn FnOnce(&mut BlockEngine) -> Vec<Event> + Send>;

enum Command {
    Run(Job),
    Shutdown(oneshot::Sender<()>),
}

struct Batch {
    writes: Vec<PendingWrite>,
    done: Option<oneshot::Sender<()>>,
}

/// Cloneable handle to a running engine actor.
#[derive(Clone)]
pub struct EngineHandle {
    commands: mpsc::Sender<Command>,
    events: broadcast::Sender<Event>,
}

/// Start the actor and its writer on the current tokio runtime.
pub fn spawn(engine: BlockEngine, store: Box<dyn DocumentStore>) -> EngineHandle {
    let (command_tx, command_rx) = mpsc::channel(COMMAND_CAPACITY);
    let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);
    let (batch_tx, batch_rx) = mpsc::unbounded_channel();
    let (failed_tx, failed_rx) = mpsc::unbounded_channel();

    tokio::spawn(write_loop(store, batch_rx, failed_tx));
    tokio::spawn(run(engine, command_rx, event_tx.clone(), batch_tx, failed_rx));

    EngineHandle {
        commands: command_tx,
        events: event_tx,
    }
}

impl EngineHandle {
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    /// Run `f` against the engine and return its result. Nothing is
    /// broadcast.
    pub async fn with<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut BlockEngine) -> T + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let job: Job = Box::new(move |engine| {
            let _ = tx.send(f(engine));
            Vec::new()
        });
        self.send(Command::Run(job)).await?;
        rx.await.map_err(|_| CoreError::RuntimeClosed)
    }

    /// Run an event-producing command; its events are also broadcast.
    pub async fn command<F>(&self, f: F) -> Result<Vec<Event>>
    where
        F: FnOnce(&mut BlockEngine) -> Vec<Event> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let job: Job = Box::new(move |engine| {
            let events = f(engine);
            let _ = tx.send(events.clone());
            events
        });
        self.send(Command::Run(job)).await?;
        rx.await.map_err(|_| CoreError::RuntimeClosed)
    }

    pub async fn start(&self, index: usize) -> Result<Vec<Event>> {
        self.command(move |e| e.start(index)).await
    }

    pub async fn pause(&self) -> Result<Vec<Event>> {
        self.command(BlockEngine::pause).await
    }

    pub async fn resume(&self) -> Result<Vec<Event>> {
        self.command(BlockEngine::resume).await
    }

    pub async fn skip(&self) -> Result<Vec<Event>> {
        self.command(BlockEngine::skip).await
    }

    pub async fn stop(&self) -> Result<Vec<Event>> {
        self.command(BlockEngine::stop).await
    }

    pub async fn reset(&self) -> Result<Vec<Event>> {
        self.command(BlockEngine::reset).await
    }

    pub async fn toggle(&self) -> Result<Vec<Event>> {
        self.command(BlockEngine::toggle).await
    }

    pub async fn refresh_all(&self) -> Result<Vec<Event>> {
        self.command(BlockEngine::refresh_all).await
    }

    pub async fn notification_action(&self, action: NotificationAction) -> Result<Vec<Event>> {
        self.command(move |e| e.handle_notification_action(action)).await
    }

    pub async fn control(&self, command: ControlCommand) -> Result<Vec<Event>> {
        self.command(move |e| e.apply_control(command)).await
    }

    pub async fn snapshot(&self) -> Result<Event> {
        self.with(|e| e.snapshot()).await
    }

    /// Stop the current block, flush every dirty document and end the actor.
    pub async fn shutdown(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Shutdown(tx)).await?;
        rx.await.map_err(|_| CoreError::RuntimeClosed)
    }

    async fn send(&self, command: Command) -> Result<()> {
        self.commands.send(command).await.map_err(|_| CoreError::RuntimeClosed)
    }
}

async fn run(
    mut engine: BlockEngine,
    mut commands: mpsc::Receiver<Command>,
    events: broadcast::Sender<Event>,
    writer: mpsc::UnboundedSender<Batch>,
    mut failed: mpsc::UnboundedReceiver<Document>,
) {
    let mut ticker: Option<Interval> = None;
    let mut flush = tokio::time::interval(FLUSH_POLL);
    flush.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let publish = |batch: Vec<Event>| {
        for event in batch {
            // No subscribers is fine.
            let _ = events.send(event);
        }
    };

    loop {
        sync_ticker(&engine, &mut ticker);

        tokio::select! {
            command = commands.recv() => match command {
                Some(Command::Run(job)) => publish(job(&mut engine)),
                Some(Command::Shutdown(reply)) => {
                    publish(engine.stop());
                    flush_everything(&mut engine, &writer).await;
                    let _ = reply.send(());
                    break;
                }
                None => {
                    flush_everything(&mut engine, &writer).await;
                    break;
                }
            },
            _ = tick_or_pending(&mut ticker) => publish(engine.tick()),
            _ = flush.tick() => {
                let writes = engine.take_due_writes(Instant::now().into_std());
                if !writes.is_empty() && writer.send(Batch { writes, done: None }).is_err() {
                    tracing::error!("document writer has stopped");
                }
            }
            Some(document) = failed.recv() => {
                tracing::warn!(document = document.key(), "retrying failed write on next cycle");
                engine.mark_dirty(document);
            }
        }
    }
    tracing::info!("engine runtime stopped");
}

/// Keep exactly one interval alive while the countdown runs.
fn sync_ticker(engine: &BlockEngine, ticker: &mut Option<Interval>) {
    match (engine.countdown_running(), ticker.is_some()) {
        (true, false) => {
            let mut interval = tokio::time::interval_at(Instant::now() + TICK_PERIOD, TICK_PERIOD);
            interval.set_missed_tick_behavior(MissedTickBehavior::Burst);
            *ticker = Some(interval);
        }
        (false, true) => *ticker = None,
        _ => {}
    }
}

async fn tick_or_pending(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

async fn flush_everything(engine: &mut BlockEngine, writer: &mpsc::UnboundedSender<Batch>) {
    let writes = engine.flush_all();
    if writes.is_empty() {
        return;
    }
    let (done, wait) = oneshot::channel();
    if writer.send(Batch { writes, done: Some(done) }).is_err() {
        tracing::error!("document writer has stopped; final state not saved");
        return;
    }
    let _ = wait.await;
}

async fn write_loop(
    mut store: Box<dyn DocumentStore>,
    mut batches: mpsc::UnboundedReceiver<Batch>,
    failed: mpsc::UnboundedSender<Document>,
) {
    while let Some(Batch { writes, done }) = batches.recv().await {
        let result = tokio::task::spawn_blocking(move || {
            let failures: Vec<Document> = writes
                .iter()
                .filter_map(|write| match write.write_to(&*store) {
                    Ok(()) => None,
                    Err(e) => {
                        tracing::error!(document = write.document.key(), error = %e, "failed to write document");
                        Some(write.document)
                    }
                })
                .collect();
            (store, failures)
        })
        .await;

        match result {
            Ok((returned, failures)) => {
                store = returned;
                for document in failures {
                    let _ = failed.send(document);
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "document writer panicked");
                return;
            }
        }
        if let Some(done) = done {
            let _ = done.send(());
        }
    }
}
