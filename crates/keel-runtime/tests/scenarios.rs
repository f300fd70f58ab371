//! End-to-end scenarios exercising container, bus, store, and modules
//! together through the runtime.

use async_trait::async_trait;
use keel_runtime::{
    kinds, ContainerError, ErrorCode, Lifecycle, Module, ModuleCtx, ModuleError, ModuleHost,
    Registration, RuntimeBuilder, ServiceInstance, StateStore, StoreOptions,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

type Log = Arc<Mutex<Vec<String>>>;

fn log() -> Log {
    init_tracing();
    Arc::new(Mutex::new(Vec::new()))
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// --- scenario 1: document edits flow from the store onto the bus ----

struct EditorModule;

#[async_trait]
impl Module for EditorModule {
    fn name(&self) -> &str {
        "editor"
    }

    fn dependencies(&self) -> &[&str] {
        &["store"]
    }

    async fn on_initialize(&mut self, ctx: &mut ModuleCtx<'_>) -> Result<(), ModuleError> {
        let store = ctx.service::<StateStore>("store")?;
        let bus = ctx.bus().clone();
        store.watch("document.title", move |new, _old| {
            let bus = bus.clone();
            let title = new.cloned().unwrap_or(Value::Null);
            tokio::spawn(async move {
                bus.publish("doc:title-changed", title).await;
            });
        });
        Ok(())
    }
}

#[tokio::test]
async fn document_edits_flow_from_store_to_bus_and_undo() {
    init_tracing();
    let mut runtime = RuntimeBuilder::new()
        .with_store(
            "store",
            json!({"document": {"title": "untitled", "body": ""}}),
            StoreOptions::default(),
        )
        .with_module(ModuleHost::new(EditorModule))
        .build();
    runtime.boot().await.unwrap();

    let bus = runtime.bus().clone();
    let waiter = tokio::spawn(async move {
        bus.wait_for("doc:title-changed", Duration::from_secs(5)).await
    });
    tokio::task::yield_now().await;

    let store = runtime.container().resolve::<StateStore>("store").unwrap();
    store.dispatch(
        kinds::SET_PROPERTY,
        json!({"path": "document.title", "value": "draft"}),
    );

    assert_eq!(waiter.await.unwrap().unwrap(), json!("draft"));

    assert!(store.undo());
    assert_eq!(store.state_at("document.title"), Some(json!("untitled")));

    runtime.shutdown().await;
}

// --- scenario 2: service wiring with lifecycle hooks ----------------

struct Database {
    log: Log,
}

impl Database {
    fn query(&self) -> &'static str {
        "42 rows"
    }
}

impl Lifecycle for Database {
    fn boot(&self) -> Result<(), ContainerError> {
        self.log.lock().push("db:boot".into());
        Ok(())
    }

    fn shutdown(&self) {
        self.log.lock().push("db:shutdown".into());
    }
}

struct ReportModule {
    log: Log,
}

#[async_trait]
impl Module for ReportModule {
    fn name(&self) -> &str {
        "report"
    }

    fn dependencies(&self) -> &[&str] {
        &["db"]
    }

    async fn on_initialize(&mut self, ctx: &mut ModuleCtx<'_>) -> Result<(), ModuleError> {
        // resolve through the alias; must be the same cached singleton
        let db = ctx.service::<Database>("database")?;
        self.log.lock().push(format!("report:{}", db.query()));
        Ok(())
    }
}

#[tokio::test]
async fn services_boot_before_modules_and_shut_down_after() {
    let events = log();
    let db_log = Arc::clone(&events);
    let mut runtime = RuntimeBuilder::new()
        .register("config", Registration::instance(json!({"dsn": "mem://"})))
        .register(
            "db",
            Registration::build(move |deps| {
                let config = deps[0].downcast::<Value>().unwrap();
                assert_eq!(config["dsn"], json!("mem://"));
                Ok(ServiceInstance::with_lifecycle(Arc::new(Database {
                    log: Arc::clone(&db_log),
                })))
            })
            .with_dependencies(&["config"])
            .with_alias("database")
            .eager(),
        )
        .with_module(ModuleHost::new(ReportModule {
            log: Arc::clone(&events),
        }))
        .build();

    runtime.boot().await.unwrap();
    runtime.shutdown().await;

    assert_eq!(
        *events.lock(),
        vec!["db:boot", "report:42 rows", "db:shutdown"]
    );
}

// --- scenario 3: event-driven workflow across modules ---------------

struct AuditModule {
    log: Log,
}

#[async_trait]
impl Module for AuditModule {
    fn name(&self) -> &str {
        "audit"
    }

    async fn on_initialize(&mut self, ctx: &mut ModuleCtx<'_>) -> Result<(), ModuleError> {
        let log = Arc::clone(&self.log);
        ctx.subscribe_with(
            "order:submitted",
            move |payload| {
                log.lock().push(format!("audit:{}", payload["id"]));
                async { Ok(()) }
            },
            keel_runtime::SubscribeOptions::with_priority(10),
        );
        Ok(())
    }
}

struct FulfillModule {
    log: Log,
}

#[async_trait]
impl Module for FulfillModule {
    fn name(&self) -> &str {
        "fulfill"
    }

    async fn on_initialize(&mut self, ctx: &mut ModuleCtx<'_>) -> Result<(), ModuleError> {
        let log = Arc::clone(&self.log);
        let bus = ctx.bus().clone();
        ctx.subscribe("order:submitted", move |payload| {
            log.lock().push(format!("fulfill:{}", payload["id"]));
            let bus = bus.clone();
            async move {
                bus.publish("order:done", payload).await;
                Ok(())
            }
        });
        Ok(())
    }
}

#[tokio::test]
async fn workflow_runs_audit_before_fulfillment() {
    let events = log();
    let mut runtime = RuntimeBuilder::new()
        .with_module(ModuleHost::new(AuditModule {
            log: Arc::clone(&events),
        }))
        .with_module(ModuleHost::new(FulfillModule {
            log: Arc::clone(&events),
        }))
        .build();
    runtime.boot().await.unwrap();

    // middleware stamps every order event before handlers see it
    runtime.bus().add_middleware(|event, mut payload| async move {
        if event.starts_with("order:") {
            payload["stamped"] = json!(true);
        }
        Ok(payload)
    });

    let bus = runtime.bus().clone();
    let waiter =
        tokio::spawn(async move { bus.wait_for("order:done", Duration::from_secs(5)).await });
    tokio::task::yield_now().await;

    runtime.bus().publish("order:submitted", json!({"id": 7})).await;

    let done = waiter.await.unwrap().unwrap();
    assert_eq!(done["id"], json!(7));
    assert_eq!(done["stamped"], json!(true));
    // audit has priority 10, fulfill defaults to 0
    assert_eq!(*events.lock(), vec!["audit:7", "fulfill:7"]);
}

// --- scenario 4: boot failure reverts and a fixed wiring retries ----

struct BillingReports;

#[async_trait]
impl Module for BillingReports {
    fn name(&self) -> &str {
        "billing-reports"
    }

    fn dependencies(&self) -> &[&str] {
        &["billing"]
    }
}

#[tokio::test]
async fn missing_service_fails_boot_and_fixed_wiring_recovers() {
    init_tracing();
    let mut broken = RuntimeBuilder::new()
        .with_module(ModuleHost::new(BillingReports))
        .build();

    let err = broken.boot().await.unwrap_err();
    assert_eq!(err.code(), "RUNTIME_MODULE_FAILED");
    assert_eq!(
        broken.module("billing-reports").unwrap().state(),
        keel_runtime::LifecycleState::Uninitialized
    );

    let mut fixed = RuntimeBuilder::new()
        .register("billing", Registration::instance(String::from("ledger")))
        .with_module(ModuleHost::new(BillingReports))
        .build();
    fixed.boot().await.unwrap();
    assert!(fixed.module("billing-reports").unwrap().state().is_active());
}

// --- scenario 5: module trees announce themselves over the bus ------

struct PlainModule {
    name: &'static str,
}

#[async_trait]
impl Module for PlainModule {
    fn name(&self) -> &str {
        self.name
    }
}

#[tokio::test]
async fn module_tree_initializes_top_down_and_announces() {
    init_tracing();
    let announced = Arc::new(Mutex::new(Vec::new()));
    let mut dashboard = ModuleHost::new(PlainModule { name: "dashboard" });
    dashboard
        .add_child(ModuleHost::new(PlainModule { name: "chart" }))
        .await
        .unwrap();
    dashboard
        .add_child(ModuleHost::new(PlainModule { name: "legend" }))
        .await
        .unwrap();

    let mut runtime = RuntimeBuilder::new().with_module(dashboard).build();
    let sink = Arc::clone(&announced);
    runtime.bus().subscribe(
        "module:initialized",
        move |payload| {
            sink.lock().push(payload["module"].clone());
            async { Ok(()) }
        },
        keel_runtime::SubscribeOptions::default(),
    );

    runtime.boot().await.unwrap();

    // parent completes last: it announces only after its children are up
    assert_eq!(
        *announced.lock(),
        vec![json!("chart"), json!("legend"), json!("dashboard")]
    );

    let info = runtime.module("dashboard").unwrap().info();
    assert_eq!(info.children, vec!["chart", "legend"]);

    runtime.shutdown().await;
}

// --- scenario 6: scoped container isolates test doubles -------------

#[tokio::test]
async fn scoped_container_overrides_without_touching_the_parent() {
    init_tracing();
    let mut runtime = RuntimeBuilder::new()
        .register("mailer", Registration::instance(String::from("smtp://real")))
        .build();
    runtime.boot().await.unwrap();

    let scope = runtime.container().create_scope(vec![(
        "mailer".to_string(),
        Registration::instance(String::from("mock://outbox")),
    )]);

    assert_eq!(*scope.resolve::<String>("mailer").unwrap(), "mock://outbox");
    assert_eq!(
        *runtime.container().resolve::<String>("mailer").unwrap(),
        "smtp://real"
    );
}
