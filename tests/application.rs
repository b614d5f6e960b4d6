use sen::prelude::*;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Notify;

#[derive(Debug, Error)]
#[error("random error")]
struct RandomError;

const WAIT: Duration = Duration::from_secs(5);

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

#[derive(Default)]
struct MockComponent {
    data: Option<Arc<i32>>,
}

impl Injectable for MockComponent {
    fn bindings(binder: &mut Binder<Self>) {
        binder.bind("data", |c: &mut Self, data: Arc<i32>| c.data = Some(data));
    }
}

#[derive(Default)]
struct DataPlugin {
    data: Option<Arc<i32>>,
}

impl Injectable for DataPlugin {
    fn bindings(binder: &mut Binder<Self>) {
        binder.bind("data", |p: &mut Self, data: Arc<i32>| p.data = Some(data));
    }
}

impl Plugin for DataPlugin {
    fn initialize(&mut self) -> Result<()> {
        Ok(())
    }
}

#[test]
fn test_injects_registered_value() {
    let app = Application::new().unwrap();
    app.apply(plugins![
        component("data", Component::new(10)),
        component("need-data", Component::injectable(MockComponent::default())),
    ])
    .unwrap();

    let component = app.retrieve::<MockComponent>("need-data").unwrap();
    assert_eq!(component.data.as_deref(), Some(&10));
}

#[test]
fn test_plugin_before_dependency_fails() {
    let app = Application::new().unwrap();
    let err = app
        .apply(plugins![
            DataPlugin::default(),
            component("data", Component::new(10)),
        ])
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotRegistered);
    assert_eq!(err.to_string(), "hub: data is not registered");
}

#[tokio::test]
async fn test_run_hooks_each_execute_once() {
    let app = Application::new().unwrap();
    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));

    let (a, b) = (Arc::clone(&first), Arc::clone(&second));
    app.apply(plugins![
        on_run(move |_| async move {
            a.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .and(move |_| async move {
            b.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }),
    ])
    .unwrap();

    tokio::time::timeout(WAIT, app.run(&CancellationToken::new()))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.load(Ordering::SeqCst), 1);
    assert_eq!(second.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_run_error_releases_blocked_hook() {
    init_tracing();
    let app = Application::new().unwrap();
    let release = Arc::new(Notify::new());
    let shutdown_fired = Arc::new(AtomicUsize::new(0));

    let blocked = Arc::clone(&release);
    let fired = Arc::clone(&shutdown_fired);
    app.apply(plugins![
        on_run(|_| async { Err(SenError::hook(RandomError)) }),
        on_run(move |_| async move {
            blocked.notified().await;
            Ok(())
        }),
        on_shutdown(move |_| async move {
            fired.fetch_add(1, Ordering::SeqCst);
            release.notify_one();
            Ok(())
        }),
    ])
    .unwrap();

    let err = tokio::time::timeout(WAIT, app.run(&CancellationToken::new()))
        .await
        .unwrap()
        .unwrap_err();
    assert!(err.downcast_ref::<RandomError>().is_some());
    assert_eq!(shutdown_fired.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_concurrent_shutdown_executes_once() {
    init_tracing();
    let app = Application::new().unwrap();
    let calls = Arc::new(AtomicUsize::new(0));
    let started = Arc::new(Notify::new());

    let running = Arc::clone(&started);
    app.on_run(move |token| async move {
        running.notify_one();
        token.cancelled().await;
        Ok(())
    });

    let counter = Arc::clone(&calls);
    app.on_shutdown(move |_| async move {
        counter.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        Ok(())
    });

    let run_token = CancellationToken::new();
    let runner = Arc::clone(&app);
    let token = run_token.clone();
    let run = tokio::spawn(async move { runner.run(&token).await });
    started.notified().await;

    let (first, second) = (Arc::clone(&app), Arc::clone(&app));
    let a = tokio::spawn(async move { first.shutdown(&CancellationToken::new()).await });
    let b = tokio::spawn(async move { second.shutdown(&CancellationToken::new()).await });

    // The shutdown sequence waits for the run phase, which ends with the run token.
    tokio::time::sleep(Duration::from_millis(50)).await;
    run_token.cancel();

    let a = tokio::time::timeout(WAIT, a).await.unwrap().unwrap();
    let b = tokio::time::timeout(WAIT, b).await.unwrap().unwrap();
    assert!(a.is_ok());
    assert!(b.is_ok());
    tokio::time::timeout(WAIT, run)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_post_run_follows_shutdown_exactly_once() {
    let app = Application::new().unwrap();
    let order = Arc::new(Mutex::new(Vec::new()));

    let (shutdown_log, post_log) = (Arc::clone(&order), Arc::clone(&order));
    app.apply(plugins![
        on_shutdown(move |_| async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            shutdown_log.lock().unwrap().push(Phase::Shutdown);
            Ok(())
        }),
        post_run(move |_| async move {
            post_log.lock().unwrap().push(Phase::PostRun);
            Ok(())
        }),
    ])
    .unwrap();

    app.run(&CancellationToken::new()).await.unwrap();
    app.shutdown(&CancellationToken::new()).await.unwrap();

    assert_eq!(*order.lock().unwrap(), vec![Phase::Shutdown, Phase::PostRun]);
    assert_eq!(app.lifecycle().state(), State::Stopped);
}

#[tokio::test]
async fn test_shutdown_ends_blocking_run() {
    let app = Application::new().unwrap();
    let started = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());

    let running = Arc::clone(&started);
    let blocked = Arc::clone(&release);
    app.on_run(move |_| async move {
        running.notify_one();
        blocked.notified().await;
        Ok(())
    });
    app.on_shutdown(move |_| async move {
        release.notify_one();
        Ok(())
    });

    let runner = Arc::clone(&app);
    let run = tokio::spawn(async move { runner.run(&CancellationToken::new()).await });
    started.notified().await;

    tokio::time::timeout(WAIT, app.shutdown(&CancellationToken::new()))
        .await
        .unwrap()
        .unwrap();
    tokio::time::timeout(WAIT, run)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_shutdown_right_after_spawning_run() {
    init_tracing();
    let app = Application::new().unwrap();
    let runs = Arc::new(AtomicUsize::new(0));
    let post_runs = Arc::new(AtomicUsize::new(0));

    let (counter, post_counter) = (Arc::clone(&runs), Arc::clone(&post_runs));
    app.apply(plugins![
        on_run(move |_| async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }),
        post_run(move |_| async move {
            post_counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }),
    ])
    .unwrap();

    let runner = Arc::clone(&app);
    let run = tokio::spawn(async move { runner.run(&CancellationToken::new()).await });
    tokio::time::timeout(WAIT, app.shutdown(&CancellationToken::new()))
        .await
        .unwrap()
        .unwrap();

    tokio::time::timeout(WAIT, run)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert_eq!(post_runs.load(Ordering::SeqCst), 1);
}

trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

struct FixedClock(u64);

impl Clock for FixedClock {
    fn now(&self) -> u64 {
        self.0
    }
}

#[derive(Default)]
struct Scheduler {
    clock: Option<Arc<dyn Clock>>,
}

impl Injectable for Scheduler {
    fn bindings(binder: &mut Binder<Self>) {
        binder.bind("*", |s: &mut Self, clock: Arc<dyn Clock>| s.clock = Some(clock));
    }
}

#[derive(Default)]
struct SchedulerFactory {
    settings: Option<Arc<Settings>>,
}

impl Injectable for SchedulerFactory {
    fn bindings(binder: &mut Binder<Self>) {
        binder.bind("settings", |f: &mut Self, settings: Arc<Settings>| {
            f.settings = Some(settings)
        });
    }
}

impl Factory for SchedulerFactory {
    type Output = Scheduler;

    fn create(&mut self) -> Result<Component<Scheduler>> {
        assert!(self.settings.is_some());
        Ok(Component::injectable(Scheduler::default()))
    }
}

#[test]
fn test_module_with_provider_and_trait_binding() {
    init_tracing();
    let app = Application::new().unwrap();
    let clock = module(plugins![component(
        "clock",
        Component::new(FixedClock(42)).provides::<dyn Clock>(|c| c as Arc<dyn Clock>),
    )]);

    app.apply(plugins![
        clock,
        bundle(plugins![provider("scheduler", SchedulerFactory::default())]),
    ])
    .unwrap();

    let scheduler = app.retrieve::<Scheduler>("scheduler").unwrap();
    assert_eq!(scheduler.clock.as_ref().unwrap().now(), 42);
    assert_eq!(app.retrieve::<dyn Clock>("clock").unwrap().now(), 42);
}

struct Server {
    served: AtomicUsize,
    stopped: Notify,
}

#[async_trait]
impl Service for Server {
    async fn run(&self, _token: CancellationToken) -> Result<()> {
        self.served.fetch_add(1, Ordering::SeqCst);
        self.stopped.notified().await;
        Ok(())
    }

    async fn shutdown(&self, _token: CancellationToken) -> Result<()> {
        self.stopped.notify_one();
        Ok(())
    }
}

struct ServerFactory;

impl Injectable for ServerFactory {}

impl Factory for ServerFactory {
    type Output = Server;

    fn create(&mut self) -> Result<Component<Server>> {
        Ok(Component::new(Server {
            served: AtomicUsize::new(0),
            stopped: Notify::new(),
        }))
    }
}

#[tokio::test]
async fn test_service_stops_on_shutdown() {
    init_tracing();
    let app = Application::builder()
        .settings(Settings::default().with_signal_handling(true))
        .plugin(service("server", ServerFactory))
        .build()
        .unwrap();

    let runner = Arc::clone(&app);
    let run = tokio::spawn(async move { runner.run(&CancellationToken::new()).await });
    tokio::time::sleep(Duration::from_millis(20)).await;

    tokio::time::timeout(WAIT, app.shutdown(&CancellationToken::new()))
        .await
        .unwrap()
        .unwrap();
    tokio::time::timeout(WAIT, run)
        .await
        .unwrap()
        .unwrap()
        .unwrap();

    let server = app.retrieve::<Server>("server").unwrap();
    assert_eq!(server.served.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_graceful_shutdown_exits_without_work() {
    let app = Application::new().unwrap();
    app.with(GracefulShutdown::default()).unwrap();

    tokio::time::timeout(WAIT, app.run(&CancellationToken::new()))
        .await
        .unwrap()
        .unwrap();
}
