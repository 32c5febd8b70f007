use async_trait::async_trait;
use hospital_records::registry::{Registry, TableDescriptor};
use hospital_records::service::{Attempt, Dispatcher, Executor, OperationOutcome, Projection};
use hospital_records::sql::QueryBuf;
use hospital_records::{AppError, Gateway, GatewayOptions};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

enum Behaviour {
    Unavailable,
    Fails,
    Serves,
}

struct FakeExecutor {
    behaviour: Behaviour,
    calls: AtomicUsize,
    audited_deletes: AtomicUsize,
}

impl FakeExecutor {
    fn new(behaviour: Behaviour) -> Arc<Self> {
        Arc::new(FakeExecutor {
            behaviour,
            calls: AtomicUsize::new(0),
            audited_deletes: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn answer<T>(&self, value: T) -> Result<Attempt<T>, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behaviour {
            Behaviour::Unavailable => Ok(Attempt::Unavailable),
            Behaviour::Fails => Err(AppError::Internal("permission denied".into())),
            Behaviour::Serves => Ok(Attempt::Done(value)),
        }
    }
}

#[async_trait]
impl Executor for FakeExecutor {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn list(&self, _table: &TableDescriptor) -> Result<Attempt<Vec<Value>>, AppError> {
        self.answer(vec![json!({"ID": 1})])
    }

    async fn read(&self, _table: &TableDescriptor, id: i64) -> Result<Attempt<Option<Value>>, AppError> {
        self.answer((id == 1).then(|| json!({"ID": 1})))
    }

    async fn create(
        &self,
        _table: &TableDescriptor,
        fields: &Projection,
    ) -> Result<Attempt<Value>, AppError> {
        let mut row = serde_json::Map::new();
        row.insert("ID".into(), json!(7));
        for (k, v) in fields.fields() {
            row.insert(k.clone(), v.clone());
        }
        self.answer(Value::Object(row))
    }

    async fn update(
        &self,
        _table: &TableDescriptor,
        _id: i64,
        _fields: &Projection,
    ) -> Result<Attempt<Option<Value>>, AppError> {
        self.answer(None)
    }

    async fn delete(
        &self,
        _table: &TableDescriptor,
        _id: i64,
        audit: Option<&QueryBuf>,
    ) -> Result<Attempt<u64>, AppError> {
        if audit.is_some() {
            self.audited_deletes.fetch_add(1, Ordering::SeqCst);
        }
        self.answer(1)
    }
}

/// Gateway that is never connected: any SQL issued by the dispatcher itself would fail.
fn dispatcher_with(executors: Vec<Arc<dyn Executor>>, audit_deletes: bool) -> Dispatcher {
    let mut options = GatewayOptions::new("sqlite:///nonexistent-dir/hospital.db");
    options.connect_attempts = 1;
    let gateway = Arc::new(Gateway::new(options).unwrap());
    let registry = Arc::new(Registry::hospital().unwrap());
    Dispatcher::with_executors(registry, gateway, executors, audit_deletes)
}

fn dispatcher(executors: Vec<Arc<dyn Executor>>) -> Dispatcher {
    dispatcher_with(executors, false)
}

#[tokio::test]
async fn unavailable_falls_through_to_next_executor() {
    let first = FakeExecutor::new(Behaviour::Unavailable);
    let second = FakeExecutor::new(Behaviour::Serves);
    let d = dispatcher(vec![first.clone() as Arc<dyn Executor>, second.clone()]);

    let created = d
        .create("Doctores", &json!({"nombre": "Dr. X", "extra": 1}))
        .await
        .unwrap();
    assert_eq!(
        created,
        OperationOutcome::Rows(vec![json!({"ID": 7, "nombre": "Dr. X"})])
    );
    assert_eq!(d.list("Doctores").await.unwrap().affected(), 1);
    assert_eq!(d.remove("Doctores", "3").await.unwrap().affected(), 1);
    assert_eq!(first.calls(), 3);
    assert_eq!(second.calls(), 3);
}

#[tokio::test]
async fn failing_executor_is_not_retried_elsewhere() {
    let first = FakeExecutor::new(Behaviour::Fails);
    let second = FakeExecutor::new(Behaviour::Serves);
    let d = dispatcher(vec![first.clone() as Arc<dyn Executor>, second.clone()]);

    assert!(matches!(
        d.create("Doctores", &json!({"nombre": "Dr. X"})).await,
        Err(AppError::Internal(_))
    ));
    assert!(d.remove("Doctores", "1").await.is_err());
    assert_eq!(first.calls(), 2);
    assert_eq!(second.calls(), 0);
}

#[tokio::test]
async fn empty_results_become_not_found() {
    let d = dispatcher(vec![FakeExecutor::new(Behaviour::Serves) as Arc<dyn Executor>]);
    assert!(matches!(d.get_by_id("Doctores", "2").await, Err(AppError::NotFound)));
    assert!(matches!(
        d.update("Doctores", "1", &json!({"nombre": "Y"})).await,
        Err(AppError::NotFound)
    ));
    assert!(d.get_by_id("Doctores", "1").await.is_ok());
}

#[tokio::test]
async fn validation_happens_before_any_executor() {
    let only = FakeExecutor::new(Behaviour::Serves);
    let d = dispatcher(vec![only.clone() as Arc<dyn Executor>]);
    assert!(matches!(
        d.list("Usuarios").await,
        Err(AppError::UnknownTable { .. })
    ));
    assert!(matches!(
        d.get_by_id("Doctores", "uno").await,
        Err(AppError::Validation(_))
    ));
    assert!(matches!(
        d.create("Doctores", &json!({})).await,
        Err(AppError::Validation(_))
    ));
    assert_eq!(only.calls(), 0);
}

#[tokio::test]
async fn exhausted_chain_is_an_internal_error() {
    let d = dispatcher(vec![FakeExecutor::new(Behaviour::Unavailable) as Arc<dyn Executor>]);
    assert!(matches!(d.list("Pacientes").await, Err(AppError::Internal(_))));
}

#[tokio::test]
async fn audit_statement_is_handed_to_the_deleting_executor() {
    let first = FakeExecutor::new(Behaviour::Unavailable);
    let second = FakeExecutor::new(Behaviour::Serves);
    let d = dispatcher_with(vec![first.clone() as Arc<dyn Executor>, second.clone()], true);
    assert_eq!(d.remove("Citas", "4").await.unwrap().affected(), 1);
    assert_eq!(first.audited_deletes.load(Ordering::SeqCst), 1);
    assert_eq!(second.audited_deletes.load(Ordering::SeqCst), 1);

    let quiet = FakeExecutor::new(Behaviour::Serves);
    let d = dispatcher_with(vec![quiet.clone() as Arc<dyn Executor>], false);
    d.remove("Citas", "4").await.unwrap();
    assert_eq!(quiet.audited_deletes.load(Ordering::SeqCst), 0);
}
