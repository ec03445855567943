use async_trait::async_trait;
use keystone_events::{
    CancellationToken, DispatchMode, DomainEvent, EventBus, EventBusConfig, EventHandler,
    PublishError, SubscribeError,
};
use keystone_model::{Entity, EventKind};
use keystone_types::EntityId;
use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone)]
struct Todo {
    id: EntityId,
    title: String,
}

impl Entity for Todo {
    const TYPE_NAME: &'static str = "Todo";

    fn id(&self) -> EntityId {
        self.id
    }
}

#[derive(Debug, Clone)]
struct Note {
    id: EntityId,
}

impl Entity for Note {
    const TYPE_NAME: &'static str = "Note";

    fn id(&self) -> EntityId {
        self.id
    }
}

fn todo(title: &str) -> Todo {
    Todo {
        id: EntityId::new(),
        title: title.into(),
    }
}

type Log = Arc<Mutex<Vec<String>>>;

fn new_log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

#[derive(Clone, Copy)]
enum Behaviour {
    Succeed,
    Fail,
    CancelThenSucceed,
    Hang,
}

struct Recorder {
    name: String,
    log: Log,
    behaviour: Behaviour,
    cancel: Option<CancellationToken>,
}

impl Recorder {
    fn new(name: &str, log: &Log, behaviour: Behaviour) -> Self {
        Self {
            name: name.into(),
            log: Arc::clone(log),
            behaviour,
            cancel: None,
        }
    }

    fn cancelling(name: &str, log: &Log, token: &CancellationToken) -> Self {
        Self {
            cancel: Some(token.clone()),
            ..Self::new(name, log, Behaviour::CancelThenSucceed)
        }
    }
}

#[async_trait]
impl EventHandler<Todo> for Recorder {
    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, event: &DomainEvent<Todo>, _cancel: &CancellationToken) -> anyhow::Result<()> {
        self.log
            .lock()
            .unwrap()
            .push(format!("{}:{}:{}", self.name, event.event_type(), event.payload().title));
        match self.behaviour {
            Behaviour::Succeed => Ok(()),
            Behaviour::Fail => anyhow::bail!("{} refused {}", self.name, event.event_type()),
            Behaviour::CancelThenSucceed => {
                if let Some(token) = &self.cancel {
                    token.cancel();
                }
                Ok(())
            }
            Behaviour::Hang => {
                std::future::pending::<()>().await;
                Ok(())
            }
        }
    }
}

struct NoteRecorder {
    log: Log,
}

#[async_trait]
impl EventHandler<Note> for NoteRecorder {
    async fn handle(&self, event: &DomainEvent<Note>, _cancel: &CancellationToken) -> anyhow::Result<()> {
        self.log.lock().unwrap().push(format!("note:{}", event.event_type()));
        Ok(())
    }
}

fn bus(mode: DispatchMode) -> EventBus {
    EventBus::new(EventBusConfig { dispatch: mode })
}

// ================================================================
// Fan-out and aggregation
// ================================================================

#[tokio::test]
async fn publish_without_subscribers_succeeds() {
    let bus = EventBus::default();
    let result = bus.publish(&DomainEvent::added(todo("a")), &CancellationToken::new()).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn every_subscriber_receives_the_event() {
    let log = new_log();
    let bus = EventBus::default();
    bus.subscribe(Recorder::new("audit", &log, Behaviour::Succeed)).unwrap();
    bus.subscribe(Recorder::new("search", &log, Behaviour::Succeed)).unwrap();

    bus.publish(&DomainEvent::added(todo("milk")), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        entries(&log),
        vec!["audit:Todo.Added:milk".to_string(), "search:Todo.Added:milk".to_string()]
    );
}

#[tokio::test]
async fn failing_handler_does_not_block_siblings() {
    let log = new_log();
    let bus = EventBus::default();
    bus.subscribe(Recorder::new("first", &log, Behaviour::Fail)).unwrap();
    bus.subscribe(Recorder::new("second", &log, Behaviour::Succeed)).unwrap();
    bus.subscribe(Recorder::new("third", &log, Behaviour::Fail)).unwrap();

    let err = bus
        .publish(&DomainEvent::updated(todo("x")), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(entries(&log).len(), 3);
    assert!(!err.is_cancelled());
    assert_eq!(err.event_type(), "Todo.Updated");
    let names: Vec<&str> = err.failures().iter().map(|f| f.handler.as_str()).collect();
    assert_eq!(names, vec!["first", "third"]);
    match err {
        PublishError::HandlersFailed { dispatched, .. } => assert_eq!(dispatched, 3),
        other => panic!("expected HandlersFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn aggregated_error_contains_exactly_the_failures() {
    for (k, f) in [(1usize, 0usize), (4, 1), (5, 5), (6, 3)] {
        let log = new_log();
        let bus = EventBus::default();
        for i in 0..k {
            let behaviour = if i < f { Behaviour::Fail } else { Behaviour::Succeed };
            bus.subscribe(Recorder::new(&format!("h{i}"), &log, behaviour)).unwrap();
        }

        let result = bus
            .publish(&DomainEvent::removed(todo("t")), &CancellationToken::new())
            .await;

        assert_eq!(entries(&log).len(), k);
        match result {
            Ok(()) => assert_eq!(f, 0),
            Err(e) => assert_eq!(e.failures().len(), f),
        }
    }
}

#[tokio::test]
async fn error_message_names_the_handler() {
    let log = new_log();
    let bus = EventBus::default();
    bus.subscribe(Recorder::new("indexer", &log, Behaviour::Fail)).unwrap();

    let err = bus
        .publish(&DomainEvent::added(todo("x")), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "1 of 1 handler(s) failed for Todo.Added");
    assert!(err.failures()[0].to_string().contains("indexer"));
}

// ================================================================
// Routing
// ================================================================

#[tokio::test]
async fn handlers_are_keyed_by_entity_type() {
    let log = new_log();
    let bus = EventBus::default();
    bus.subscribe(Recorder::new("todo", &log, Behaviour::Succeed)).unwrap();
    bus.subscribe(NoteRecorder { log: Arc::clone(&log) }).unwrap();

    bus.publish(&DomainEvent::added(Note { id: EntityId::new() }), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(entries(&log), vec!["note:Note.Added".to_string()]);
    assert_eq!(bus.subscriber_count::<Todo>(), 1);
    assert_eq!(bus.subscriber_count::<Note>(), 1);
}

#[tokio::test]
async fn non_canonical_tags_are_still_delivered() {
    let log = new_log();
    let bus = EventBus::default();
    bus.subscribe(Recorder::new("h", &log, Behaviour::Succeed)).unwrap();

    let event = DomainEvent::with_event_type(todo("x"), "Todo.Archived");
    assert_eq!(event.kind(), None);
    bus.publish(&event, &CancellationToken::new()).await.unwrap();

    assert_eq!(entries(&log), vec!["h:Todo.Archived:x".to_string()]);
}

#[tokio::test]
async fn distinct_events_keep_program_order() {
    let log = new_log();
    let bus = EventBus::default();
    bus.subscribe(Recorder::new("h", &log, Behaviour::Fail)).unwrap();
    let cancel = CancellationToken::new();

    let item = todo("x");
    assert!(bus.publish(&DomainEvent::added(item.clone()), &cancel).await.is_err());
    assert!(bus.publish(&DomainEvent::updated(item.clone()), &cancel).await.is_err());
    assert!(bus.publish(&DomainEvent::removed(item), &cancel).await.is_err());

    assert_eq!(
        entries(&log),
        vec![
            "h:Todo.Added:x".to_string(),
            "h:Todo.Updated:x".to_string(),
            "h:Todo.Removed:x".to_string(),
        ]
    );
}

#[test]
fn event_constructors_use_canonical_tags() {
    let item = todo("x");
    assert_eq!(DomainEvent::added(item.clone()).kind(), Some(EventKind::Added));
    assert_eq!(DomainEvent::updated(item.clone()).event_type(), "Todo.Updated");
    assert_eq!(DomainEvent::new(item, EventKind::Removed).event_type(), "Todo.Removed");
}

// ================================================================
// Sealing
// ================================================================

#[test]
fn subscribe_after_seal_is_rejected() {
    let log = new_log();
    let bus = EventBus::default();
    bus.subscribe(Recorder::new("early", &log, Behaviour::Succeed)).unwrap();
    bus.seal();
    bus.seal();

    let err = bus
        .subscribe(Recorder::new("late", &log, Behaviour::Succeed))
        .unwrap_err();
    assert_eq!(err, SubscribeError::Sealed { entity_type: "Todo" });
    assert_eq!(bus.subscriber_count::<Todo>(), 1);
}

#[test]
fn subscription_ids_are_unique_and_ordered() {
    let log = new_log();
    let bus = EventBus::default();
    let a = bus.subscribe(Recorder::new("a", &log, Behaviour::Succeed)).unwrap();
    let b = bus.subscribe(Recorder::new("b", &log, Behaviour::Succeed)).unwrap();
    assert_ne!(a, b);
    assert_eq!(bus.subscriptions::<Todo>(), vec![a, b]);
}

// ================================================================
// Cancellation
// ================================================================

#[tokio::test]
async fn already_cancelled_publish_runs_nothing() {
    let log = new_log();
    let bus = EventBus::default();
    bus.subscribe(Recorder::new("h", &log, Behaviour::Succeed)).unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = bus.publish(&DomainEvent::added(todo("x")), &cancel).await.unwrap_err();

    assert!(err.is_cancelled());
    assert!(entries(&log).is_empty());
}

#[tokio::test]
async fn cancellation_between_handlers_stops_dispatch_and_keeps_failures() {
    let log = new_log();
    let cancel = CancellationToken::new();
    let bus = EventBus::default();
    bus.subscribe(Recorder::new("failing", &log, Behaviour::Fail)).unwrap();
    bus.subscribe(Recorder::cancelling("canceller", &log, &cancel)).unwrap();
    bus.subscribe(Recorder::new("never", &log, Behaviour::Succeed)).unwrap();

    let err = bus.publish(&DomainEvent::added(todo("x")), &cancel).await.unwrap_err();

    assert_eq!(entries(&log).len(), 2);
    match err {
        PublishError::Cancelled { completed, failures, .. } => {
            assert_eq!(completed, 2);
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].handler, "failing");
        }
        other => panic!("expected Cancelled, got {other:?}"),
    }
}

#[tokio::test]
async fn cancellation_during_handler_aborts_the_publish() {
    let log = new_log();
    let cancel = CancellationToken::new();
    let bus = EventBus::default();
    bus.subscribe(Recorder::new("failing", &log, Behaviour::Fail)).unwrap();
    bus.subscribe(Recorder::new("hanging", &log, Behaviour::Hang)).unwrap();
    bus.subscribe(Recorder::new("never", &log, Behaviour::Succeed)).unwrap();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let err = bus.publish(&DomainEvent::added(todo("x")), &cancel).await.unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(err.failures().len(), 1);
    let seen = entries(&log);
    assert!(!seen.iter().any(|e| e.starts_with("never")));
}

// ================================================================
// Concurrent dispatch
// ================================================================

#[tokio::test]
async fn concurrent_dispatch_invokes_all_and_aggregates() {
    let log = new_log();
    let bus = bus(DispatchMode::Concurrent);
    bus.subscribe(Recorder::new("a", &log, Behaviour::Fail)).unwrap();
    bus.subscribe(Recorder::new("b", &log, Behaviour::Succeed)).unwrap();
    bus.subscribe(Recorder::new("c", &log, Behaviour::Fail)).unwrap();

    let err = bus
        .publish(&DomainEvent::added(todo("x")), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(entries(&log).len(), 3);
    assert_eq!(err.failures().len(), 2);
}

#[tokio::test]
async fn concurrent_dispatch_stops_on_cancellation() {
    let log = new_log();
    let cancel = CancellationToken::new();
    let bus = bus(DispatchMode::Concurrent);
    bus.subscribe(Recorder::new("hanging", &log, Behaviour::Hang)).unwrap();
    bus.subscribe(Recorder::new("failing", &log, Behaviour::Fail)).unwrap();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let err = bus.publish(&DomainEvent::added(todo("x")), &cancel).await.unwrap_err();

    match err {
        PublishError::Cancelled { completed, failures, .. } => {
            assert_eq!(completed, 1);
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].handler, "failing");
        }
        other => panic!("expected Cancelled, got {other:?}"),
    }
}

#[tokio::test]
async fn concurrent_publishers_share_one_bus() {
    let log = new_log();
    let bus = Arc::new(EventBus::default());
    bus.subscribe(Recorder::new("h", &log, Behaviour::Succeed)).unwrap();
    bus.seal();

    let mut tasks = Vec::new();
    for i in 0..8 {
        let bus = Arc::clone(&bus);
        tasks.push(tokio::spawn(async move {
            bus.publish(&DomainEvent::added(todo(&format!("t{i}"))), &CancellationToken::new())
                .await
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(entries(&log).len(), 8);
}
