//! Single-writer state machine runtime.
//!
//! One worker task owns event processing. Callers enqueue events with
//! [`StateMachine::on_event`] and never block; [`StateMachine::await_idle`]
//! resolves once the queue is drained and no side effect is running.
//!
//! Queue discipline: external events are appended to the back. The worker
//! takes events from the front, one at a time. A follow-up event returned by
//! a side effect is pushed to the front, so emission chains are fully
//! drained before any external event that was already waiting.

use crate::graph::StateGraph;
use crate::name::{EventName, StateName};
use parking_lot::{Mutex, RwLock};
use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, watch, Notify};
use tokio::task::JoinHandle;

/// Capacity of the transition broadcast channel.
const TRANSITION_CHANNEL_CAPACITY: usize = 256;

/// Formats a transition log entry: `{from}_{event}_{to}`.
pub fn transition_entry(from: &str, event: &str, to: &str) -> String {
    format!("{}_{}_{}", from, event, to)
}

/// Lifecycle phase of the runtime itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimePhase {
    /// Queue empty, no work scheduled.
    Idle,
    /// Worker is draining the queue.
    Processing,
    /// Runtime stopped. Terminal.
    Closed,
}

/// An applied transition, as seen by subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRecord {
    pub from_state: String,
    pub event: String,
    pub to_state: String,
    /// Same string that was appended to the transition log.
    pub entry: String,
}

/// Counters describing work done by the runtime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RuntimeStats {
    pub events_processed: u64,
    pub transitions_applied: u64,
    pub unhandled_events: u64,
    pub failed_callbacks: u64,
}

#[derive(Default)]
struct Counters {
    events_processed: AtomicU64,
    transitions_applied: AtomicU64,
    unhandled_events: AtomicU64,
    failed_callbacks: AtomicU64,
}

/// State shared between the handle and the worker task.
struct Shared<S, E> {
    graph: Arc<StateGraph<S, E>>,
    queue: Mutex<VecDeque<E>>,
    current: RwLock<S>,
    log: Mutex<Vec<String>>,
    phase: watch::Sender<RuntimePhase>,
    wake: Notify,
    transitions: broadcast::Sender<TransitionRecord>,
    counters: Counters,
}

impl<S, E> Shared<S, E>
where
    S: StateName + Clone + Send + Sync + 'static,
    E: EventName + Send + 'static,
{
    fn is_closed(&self) -> bool {
        *self.phase.borrow() == RuntimePhase::Closed
    }

    /// Worker loop. Exits once the runtime is closed.
    async fn run(self: Arc<Self>) {
        tracing::debug!(
            "State machine worker started in state {}",
            self.current.read().name()
        );

        loop {
            let next = {
                let mut queue = self.queue.lock();
                if self.is_closed() {
                    break;
                }
                let next = queue.pop_front();
                if next.is_none() {
                    // Publish idle while holding the queue lock so that a
                    // concurrent enqueue cannot be overwritten.
                    self.phase.send_if_modified(|phase| {
                        if *phase == RuntimePhase::Processing {
                            *phase = RuntimePhase::Idle;
                            true
                        } else {
                            false
                        }
                    });
                }
                next
            };

            match next {
                Some(event) => self.process(event),
                None => self.wake.notified().await,
            }
        }

        tracing::debug!("State machine worker stopped");
    }

    /// Processes a single event taken from the front of the queue.
    fn process(&self, event: E) {
        self.counters.events_processed.fetch_add(1, Ordering::Relaxed);

        let current = self.current.read().clone();
        let Some(transition) = self.graph.event_transition(&current, &event) else {
            self.counters.unhandled_events.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(
                "Unhandled event '{}' in state '{}'",
                event.name(),
                current.name()
            );
            return;
        };

        let selected = catch_unwind(AssertUnwindSafe(|| transition.select(&current, &event)));
        let branch = match selected {
            Ok(Some(branch)) => branch,
            Ok(None) => {
                self.counters.unhandled_events.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    "Unhandled event '{}' in state '{}': no guard matched",
                    event.name(),
                    current.name()
                );
                return;
            }
            Err(_) => {
                self.counters.failed_callbacks.fetch_add(1, Ordering::Relaxed);
                tracing::error!(
                    "Guard panicked while handling '{}' in state '{}'; event dropped",
                    event.name(),
                    current.name()
                );
                return;
            }
        };

        let next = branch.directive().resolve(&current).clone();
        let record = TransitionRecord {
            from_state: current.name().to_string(),
            event: event.name().to_string(),
            to_state: next.name().to_string(),
            entry: transition_entry(current.name(), event.name(), next.name()),
        };

        {
            let mut log = self.log.lock();
            *self.current.write() = next.clone();
            log.push(record.entry.clone());
        }
        self.counters
            .transitions_applied
            .fetch_add(1, Ordering::Relaxed);
        tracing::debug!("Applied transition {}", record.entry);
        // No subscribers is fine.
        let _ = self.transitions.send(record);

        if !branch.has_side_effect() {
            return;
        }

        match catch_unwind(AssertUnwindSafe(|| branch.run_side_effect(&next, &event))) {
            Ok(Some(follow_up)) => {
                tracing::debug!(
                    "Side effect of '{}' emitted '{}'",
                    event.name(),
                    follow_up.name()
                );
                self.queue.lock().push_front(follow_up);
            }
            Ok(None) => {}
            Err(_) => {
                self.counters.failed_callbacks.fetch_add(1, Ordering::Relaxed);
                tracing::error!(
                    "Side effect panicked after '{}' in state '{}'",
                    event.name(),
                    next.name()
                );
            }
        }
    }
}

/// Handle to a running state machine.
///
/// Must be created from within a Tokio runtime. Dropping the handle closes
/// the machine.
pub struct StateMachine<S, E>
where
    S: StateName + Clone + Send + Sync + 'static,
    E: EventName + Send + 'static,
{
    shared: Arc<Shared<S, E>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl<S, E> StateMachine<S, E>
where
    S: StateName + Clone + Send + Sync + 'static,
    E: EventName + Send + 'static,
{
    /// Starts a machine in the graph's initial state.
    pub fn new(graph: impl Into<Arc<StateGraph<S, E>>>) -> Self {
        let graph = graph.into();
        let initial = graph.initial().clone();
        Self::starting_at(graph, initial)
    }

    /// Starts a machine in an explicit state.
    pub fn starting_at(graph: impl Into<Arc<StateGraph<S, E>>>, initial: S) -> Self {
        let (phase, _) = watch::channel(RuntimePhase::Idle);
        let (transitions, _) = broadcast::channel(TRANSITION_CHANNEL_CAPACITY);

        let shared = Arc::new(Shared {
            graph: graph.into(),
            queue: Mutex::new(VecDeque::new()),
            current: RwLock::new(initial),
            log: Mutex::new(Vec::new()),
            phase,
            wake: Notify::new(),
            transitions,
            counters: Counters::default(),
        });

        let worker = tokio::spawn(Arc::clone(&shared).run());

        Self {
            shared,
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Enqueues an event at the back of the queue and returns immediately.
    ///
    /// Has no effect once the machine is closed. In debug builds, panics if
    /// the event's name is missing from its enum's declared variants.
    pub fn on_event(&self, event: E) {
        debug_assert!(
            event.is_declared(),
            "event name '{}' is not listed in variants()",
            event.name()
        );
        {
            let mut queue = self.shared.queue.lock();
            if self.shared.is_closed() {
                tracing::debug!("Ignoring event '{}' on closed machine", event.name());
                return;
            }
            queue.push_back(event);
            self.shared.phase.send_if_modified(|phase| {
                if *phase == RuntimePhase::Idle {
                    *phase = RuntimePhase::Processing;
                    true
                } else {
                    false
                }
            });
        }
        self.shared.wake.notify_one();
    }

    /// Waits until the queue is empty and no side effect is running.
    ///
    /// Returns immediately if the machine is idle or closed.
    pub async fn await_idle(&self) {
        let mut phase = self.shared.phase.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = phase
            .wait_for(|phase| *phase != RuntimePhase::Processing)
            .await;
    }

    /// Last committed state.
    pub fn current_state(&self) -> S {
        self.shared.current.read().clone()
    }

    /// Applied transitions in order, formatted as `{from}_{event}_{to}`.
    pub fn transition_log(&self) -> Vec<String> {
        self.shared.log.lock().clone()
    }

    /// Clears the transition log.
    pub fn clear_transition_log(&self) {
        self.shared.log.lock().clear();
    }

    /// Subscribes to applied transitions.
    pub fn subscribe(&self) -> broadcast::Receiver<TransitionRecord> {
        self.shared.transitions.subscribe()
    }

    pub fn phase(&self) -> RuntimePhase {
        *self.shared.phase.borrow()
    }

    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    /// Returns the graph this machine runs.
    pub fn graph(&self) -> &Arc<StateGraph<S, E>> {
        &self.shared.graph
    }

    pub fn stats(&self) -> RuntimeStats {
        let c = &self.shared.counters;
        RuntimeStats {
            events_processed: c.events_processed.load(Ordering::Relaxed),
            transitions_applied: c.transitions_applied.load(Ordering::Relaxed),
            unhandled_events: c.unhandled_events.load(Ordering::Relaxed),
            failed_callbacks: c.failed_callbacks.load(Ordering::Relaxed),
        }
    }

    /// Stops the worker and abandons queued events.
    ///
    /// A side effect already running completes, but its follow-up event is
    /// never processed. Calling `close` more than once is harmless.
    pub fn close(&self) {
        let abandoned = {
            let mut queue = self.shared.queue.lock();
            if self.shared.is_closed() {
                return;
            }
            let abandoned = queue.len();
            queue.clear();
            self.shared.phase.send_replace(RuntimePhase::Closed);
            abandoned
        };
        self.shared.wake.notify_one();

        if abandoned > 0 {
            tracing::info!("State machine closed, {} queued events abandoned", abandoned);
        } else {
            tracing::debug!("State machine closed");
        }
    }

    /// Closes the machine and waits for the worker task to exit.
    pub async fn shutdown(&self) {
        self.close();
        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            if let Err(e) = worker.await {
                tracing::error!("State machine worker failed: {}", e);
            }
        }
    }
}

impl<S, E> Drop for StateMachine<S, E>
where
    S: StateName + Clone + Send + Sync + 'static,
    E: EventName + Send + 'static,
{
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[derive(Clone, Debug, PartialEq)]
    enum Flow {
        Initial,
        Processing,
        Intermediate,
        Final,
    }

    impl StateName for Flow {
        fn name(&self) -> &str {
            match self {
                Self::Initial => "Initial",
                Self::Processing => "Processing",
                Self::Intermediate => "Intermediate",
                Self::Final => "Final",
            }
        }
    }

    #[derive(Clone, Debug, PartialEq)]
    enum FlowEvent {
        Start,
        Continue,
        Finish,
        External,
        Ping,
    }

    impl EventName for FlowEvent {
        fn name(&self) -> &str {
            match self {
                Self::Start => "Start",
                Self::Continue => "Continue",
                Self::Finish => "Finish",
                Self::External => "External",
                Self::Ping => "Ping",
            }
        }

        fn variants() -> &'static [&'static str] {
            &["Start", "Continue", "Finish", "External", "Ping"]
        }
    }

    fn priority_graph() -> StateGraph<Flow, FlowEvent> {
        StateGraph::builder()
            .initial(Flow::Initial)
            .state(Flow::Initial, |s| {
                s.on("Start", |t| {
                    t.branch(|b| {
                        b.transition_to(Flow::Processing)
                            .side_effect(|_, _| Some(FlowEvent::Continue))
                            .emits("begin", "Continue")
                    })
                })
            })
            .state(Flow::Processing, |s| {
                s.transition("Continue", Flow::Intermediate)
            })
            .state(Flow::Intermediate, |s| {
                s.transition("External", Flow::Final)
            })
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_side_effect_event_takes_priority() {
        let machine = StateMachine::new(priority_graph());

        machine.on_event(FlowEvent::Start);
        machine.on_event(FlowEvent::External);
        machine.await_idle().await;

        assert_eq!(
            machine.transition_log(),
            vec![
                "Initial_Start_Processing",
                "Processing_Continue_Intermediate",
                "Intermediate_External_Final",
            ]
        );
        assert_eq!(machine.current_state(), Flow::Final);
        assert_eq!(machine.phase(), RuntimePhase::Idle);
    }

    #[tokio::test]
    async fn test_transitive_emission_chain() {
        let graph = StateGraph::builder()
            .initial(Flow::Initial)
            .state(Flow::Initial, |s| {
                s.on("Start", |t| {
                    t.branch(|b| {
                        b.transition_to(Flow::Processing)
                            .side_effect(|_, _| Some(FlowEvent::Continue))
                    })
                })
            })
            .state(Flow::Processing, |s| {
                s.on("Continue", |t| {
                    t.branch(|b| {
                        b.transition_to(Flow::Intermediate)
                            .side_effect(|_, _| Some(FlowEvent::Finish))
                    })
                })
            })
            .state(Flow::Intermediate, |s| {
                s.transition("Finish", Flow::Final)
            })
            .state(Flow::Final, |s| s.stay("External"))
            .build()
            .unwrap();
        let machine = StateMachine::new(graph);

        machine.on_event(FlowEvent::Start);
        machine.on_event(FlowEvent::External);
        machine.await_idle().await;

        assert_eq!(
            machine.transition_log(),
            vec![
                "Initial_Start_Processing",
                "Processing_Continue_Intermediate",
                "Intermediate_Finish_Final",
                "Final_External_Final",
            ]
        );
    }

    #[tokio::test]
    async fn test_invalid_event_after_transition_is_skipped() {
        let machine = StateMachine::new(priority_graph());

        machine.on_event(FlowEvent::Start);
        machine.on_event(FlowEvent::Start);
        machine.await_idle().await;

        // Second Start is not defined in Intermediate.
        assert_eq!(machine.current_state(), Flow::Intermediate);
        assert_eq!(machine.transition_log().len(), 2);
        assert_eq!(machine.stats().unhandled_events, 1);
        assert_eq!(machine.stats().events_processed, 3);
    }

    #[tokio::test]
    async fn test_do_not_transition_is_logged() {
        let graph = StateGraph::builder()
            .initial(Flow::Initial)
            .state(Flow::Initial, |s| s.stay("Ping"))
            .build()
            .unwrap();
        let machine = StateMachine::new(graph);

        machine.on_event(FlowEvent::Ping);
        machine.on_event(FlowEvent::Ping);
        machine.await_idle().await;

        assert_eq!(
            machine.transition_log(),
            vec!["Initial_Ping_Initial", "Initial_Ping_Initial"]
        );
        assert_eq!(machine.current_state(), Flow::Initial);
    }

    #[tokio::test]
    async fn test_side_effect_sees_post_transition_state() {
        let graph = StateGraph::builder()
            .initial(Flow::Initial)
            .state(Flow::Initial, |s| {
                s.on("Start", |t| {
                    t.branch(|b| {
                        b.transition_to(Flow::Processing).side_effect(|state, _| {
                            (*state == Flow::Processing).then_some(FlowEvent::Continue)
                        })
                    })
                })
            })
            .state(Flow::Processing, |s| {
                s.transition("Continue", Flow::Final)
            })
            .build()
            .unwrap();
        let machine = StateMachine::new(graph);

        machine.on_event(FlowEvent::Start);
        machine.await_idle().await;

        assert_eq!(machine.current_state(), Flow::Final);
    }

    #[tokio::test]
    async fn test_guard_selection_and_fallthrough() {
        let graph = StateGraph::builder()
            .initial(Flow::Initial)
            .state(Flow::Initial, |s| {
                s.on("Start", |t| {
                    t.branch(|b| b.guard("never", |_, _| false).transition_to(Flow::Final))
                        .branch(|b| {
                            b.guard("always", |_, _| true)
                                .transition_to(Flow::Processing)
                        })
                })
            })
            .state(Flow::Processing, |s| {
                s.on("Continue", |t| {
                    t.branch(|b| b.guard("closed", |_, _| false).transition_to(Flow::Final))
                })
            })
            .build()
            .unwrap();
        let machine = StateMachine::new(graph);

        machine.on_event(FlowEvent::Start);
        machine.on_event(FlowEvent::Continue);
        machine.await_idle().await;

        assert_eq!(machine.transition_log(), vec!["Initial_Start_Processing"]);
        assert_eq!(machine.current_state(), Flow::Processing);
        assert_eq!(machine.stats().unhandled_events, 1);
    }

    #[tokio::test]
    async fn test_panicking_guard_does_not_stop_drain() {
        let graph = StateGraph::builder()
            .initial(Flow::Initial)
            .state(Flow::Initial, |s| {
                s.on("Ping", |t| {
                    t.branch(|b| {
                        b.guard("explodes", |_, _| panic!("guard failure"))
                            .do_not_transition()
                    })
                })
                .transition("Start", Flow::Processing)
            })
            .build()
            .unwrap();
        let machine = StateMachine::new(graph);

        machine.on_event(FlowEvent::Ping);
        machine.on_event(FlowEvent::Start);
        machine.await_idle().await;

        assert_eq!(machine.transition_log(), vec!["Initial_Start_Processing"]);
        assert_eq!(machine.current_state(), Flow::Processing);
        assert_eq!(machine.stats().failed_callbacks, 1);
    }

    #[tokio::test]
    async fn test_panicking_side_effect_keeps_transition() {
        let graph = StateGraph::builder()
            .initial(Flow::Initial)
            .state(Flow::Initial, |s| {
                s.on("Start", |t| {
                    t.branch(|b| {
                        b.transition_to(Flow::Processing)
                            .side_effect(|_, _| panic!("side effect failure"))
                    })
                })
            })
            .state(Flow::Processing, |s| {
                s.transition("Finish", Flow::Final)
            })
            .build()
            .unwrap();
        let machine = StateMachine::new(graph);

        machine.on_event(FlowEvent::Start);
        machine.on_event(FlowEvent::Finish);
        machine.await_idle().await;

        assert_eq!(
            machine.transition_log(),
            vec!["Initial_Start_Processing", "Processing_Finish_Final"]
        );
        assert_eq!(machine.stats().failed_callbacks, 1);
    }

    /// Ping carries (producer, sequence number) so delivery order is observable.
    #[derive(Clone, Debug, PartialEq)]
    enum Traffic {
        Ping(usize, usize),
        Start,
        Continue,
    }

    impl EventName for Traffic {
        fn name(&self) -> &str {
            match self {
                Self::Ping(..) => "Ping",
                Self::Start => "Start",
                Self::Continue => "Continue",
            }
        }

        fn variants() -> &'static [&'static str] {
            &["Ping", "Start", "Continue"]
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_producers_keep_fifo_and_follow_up_priority() {
        const PRODUCERS: usize = 4;
        const PINGS: usize = 100;

        let delivered: Arc<Mutex<Vec<(usize, usize)>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&delivered);
        let graph = StateGraph::builder()
            .initial(Flow::Initial)
            .state(Flow::Initial, |s| {
                s.on("Ping", move |t| {
                    t.branch(move |b| {
                        b.do_not_transition().side_effect(move |_, event| {
                            if let Traffic::Ping(producer, seq) = event {
                                sink.lock().push((*producer, *seq));
                            }
                            None
                        })
                    })
                })
                .on("Start", |t| {
                    t.branch(|b| {
                        b.transition_to(Flow::Processing)
                            .side_effect(|_, _| Some(Traffic::Continue))
                            .emits("resume", "Continue")
                    })
                })
            })
            .state(Flow::Processing, |s| {
                s.transition("Continue", Flow::Initial).stay("Ping")
            })
            .build()
            .unwrap();
        let machine = Arc::new(StateMachine::new(graph));

        let mut handles = Vec::new();
        for producer in 0..PRODUCERS {
            let machine = Arc::clone(&machine);
            handles.push(tokio::spawn(async move {
                for seq in 0..PINGS {
                    if producer == 0 && seq == PINGS / 2 {
                        machine.on_event(Traffic::Start);
                    }
                    machine.on_event(Traffic::Ping(producer, seq));
                    if seq % 10 == 0 {
                        tokio::task::yield_now().await;
                    }
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        machine.await_idle().await;

        // Each producer's events arrive in the order it sent them.
        let delivered = delivered.lock().clone();
        assert_eq!(delivered.len(), PRODUCERS * PINGS);
        for producer in 0..PRODUCERS {
            let seqs: Vec<usize> = delivered
                .iter()
                .filter(|(p, _)| *p == producer)
                .map(|(_, seq)| *seq)
                .collect();
            assert_eq!(seqs, (0..PINGS).collect::<Vec<_>>());
        }

        // The emitted Continue runs before any Ping queued behind Start.
        let log = machine.transition_log();
        assert_eq!(log.len(), PRODUCERS * PINGS + 2);
        let start = log
            .iter()
            .position(|entry| entry == "Initial_Start_Processing")
            .unwrap();
        assert_eq!(log[start + 1], "Processing_Continue_Initial");
        assert!(!log.iter().any(|entry| entry == "Processing_Ping_Processing"));
        assert_eq!(machine.current_state(), Flow::Initial);
        assert_eq!(
            machine.stats().transitions_applied,
            (PRODUCERS * PINGS + 2) as u64
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_close_during_side_effect_drops_follow_up() {
        let (entered_tx, entered_rx) = std::sync::mpsc::channel::<()>();
        let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();
        let entered_tx = Mutex::new(entered_tx);
        let release_rx = Mutex::new(release_rx);

        let graph = StateGraph::builder()
            .initial(Flow::Initial)
            .state(Flow::Initial, |s| {
                s.on("Start", move |t| {
                    t.branch(move |b| {
                        b.transition_to(Flow::Processing)
                            .side_effect(move |_, _| {
                                let _ = entered_tx.lock().send(());
                                let _ = release_rx
                                    .lock()
                                    .recv_timeout(std::time::Duration::from_secs(5));
                                Some(FlowEvent::Continue)
                            })
                            .emits("resume", "Continue")
                    })
                })
            })
            .state(Flow::Processing, |s| {
                s.transition("Continue", Flow::Final)
            })
            .build()
            .unwrap();
        let machine = StateMachine::new(graph);

        machine.on_event(FlowEvent::Start);
        tokio::task::spawn_blocking(move || {
            entered_rx
                .recv_timeout(std::time::Duration::from_secs(5))
                .unwrap()
        })
        .await
        .unwrap();

        machine.close();
        release_tx.send(()).unwrap();
        machine.shutdown().await;

        assert_eq!(machine.transition_log(), vec!["Initial_Start_Processing"]);
        assert_eq!(machine.current_state(), Flow::Processing);
        assert_eq!(machine.phase(), RuntimePhase::Closed);
        assert_eq!(machine.stats().events_processed, 1);
    }

    #[test]
    fn test_event_enums_declare_their_names() {
        for event in [
            FlowEvent::Start,
            FlowEvent::Continue,
            FlowEvent::Finish,
            FlowEvent::External,
            FlowEvent::Ping,
        ] {
            assert!(event.is_declared(), "{:?}", event);
        }
        for event in [Traffic::Ping(0, 0), Traffic::Start, Traffic::Continue] {
            assert!(event.is_declared(), "{:?}", event);
        }
    }

    #[derive(Clone, Debug, PartialEq)]
    enum Drifted {
        Renamed,
    }

    impl EventName for Drifted {
        fn name(&self) -> &str {
            "NewName"
        }

        fn variants() -> &'static [&'static str] {
            &["Renamed"]
        }
    }

    #[cfg(debug_assertions)]
    #[tokio::test]
    #[should_panic(expected = "not listed in variants()")]
    async fn test_undeclared_event_name_is_rejected() {
        let graph: StateGraph<Flow, Drifted> = StateGraph::builder()
            .initial(Flow::Initial)
            .state(Flow::Initial, |s| s.stay("Renamed"))
            .build()
            .unwrap();
        let machine = StateMachine::new(graph);

        machine.on_event(Drifted::Renamed);
    }

    #[tokio::test]
    async fn test_await_idle_waits_for_slow_side_effect() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let graph = StateGraph::builder()
            .initial(Flow::Initial)
            .state(Flow::Initial, |s| {
                s.on("Start", |t| {
                    t.branch(move |b| {
                        b.transition_to(Flow::Final).side_effect(move |_, _| {
                            std::thread::sleep(std::time::Duration::from_millis(50));
                            seen.fetch_add(1, Ordering::SeqCst);
                            None
                        })
                    })
                })
            })
            .build()
            .unwrap();
        let machine = StateMachine::new(graph);

        machine.on_event(FlowEvent::Start);
        machine.await_idle().await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_close_ignores_further_events() {
        let machine = StateMachine::new(priority_graph());

        machine.on_event(FlowEvent::Start);
        machine.await_idle().await;
        machine.shutdown().await;

        assert!(machine.is_closed());
        machine.on_event(FlowEvent::External);
        machine.await_idle().await;

        assert_eq!(machine.current_state(), Flow::Intermediate);
        assert_eq!(machine.transition_log().len(), 2);
        assert_eq!(machine.phase(), RuntimePhase::Closed);
    }

    #[tokio::test]
    async fn test_clear_transition_log() {
        let machine = StateMachine::new(priority_graph());

        machine.on_event(FlowEvent::Start);
        machine.await_idle().await;
        machine.clear_transition_log();

        assert!(machine.transition_log().is_empty());
        assert_eq!(machine.current_state(), Flow::Intermediate);
    }

    #[tokio::test]
    async fn test_subscribe_observes_transitions() {
        let machine = StateMachine::new(priority_graph());
        let mut rx = machine.subscribe();

        machine.on_event(FlowEvent::Start);
        machine.await_idle().await;

        let first = rx.recv().await.unwrap();
        assert_eq!(first.from_state, "Initial");
        assert_eq!(first.event, "Start");
        assert_eq!(first.to_state, "Processing");
        assert_eq!(first.entry, "Initial_Start_Processing");

        let second = rx.recv().await.unwrap();
        assert_eq!(second.entry, "Processing_Continue_Intermediate");
    }

    #[tokio::test]
    async fn test_starting_at_explicit_state() {
        let machine = StateMachine::starting_at(priority_graph(), Flow::Intermediate);

        machine.on_event(FlowEvent::External);
        machine.await_idle().await;

        assert_eq!(machine.transition_log(), vec!["Intermediate_External_Final"]);
    }

    #[test]
    fn test_transition_entry_format() {
        assert_eq!(transition_entry("A", "Go", "B"), "A_Go_B");
    }
}
