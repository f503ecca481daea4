use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, AppResult, ManagerError};
use crate::protocol::send_string;

use super::{CommandRunner, HostPool, LaunchMode, WorkerLauncher, handle_connection,
            is_loopback_address};

/// Records invocations and pretends every process exits cleanly after a
/// short delay.
struct FakeRunner {
    delay: Duration,
    invocations: Mutex<Vec<Vec<String>>>,
    completed: AtomicUsize,
}

impl FakeRunner {
    fn new(delay: Duration) -> Self {
        Self {
            delay,
            invocations: Mutex::new(Vec::new()),
            completed: AtomicUsize::new(0),
        }
    }

    fn invocations(&self) -> Vec<Vec<String>> {
        self.invocations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, argv: &[String]) -> AppResult<Option<i32>> {
        {
            let mut guard = self
                .invocations
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            guard.push(argv.to_vec());
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.completed.fetch_add(1, Ordering::SeqCst);
        Ok(Some(0))
    }
}

fn local_launcher() -> WorkerLauncher {
    WorkerLauncher::new(
        "./worker".to_owned(),
        vec!["--threads".to_owned(), "4".to_owned()],
        LaunchMode::Local,
    )
}

fn remote_launcher(hosts: &[&str]) -> (WorkerLauncher, Arc<HostPool>) {
    let pool = Arc::new(HostPool::new(hosts.iter().map(|host| (*host).to_owned())));
    let launcher = WorkerLauncher::new(
        "./worker".to_owned(),
        Vec::new(),
        LaunchMode::Remote(pool.clone()),
    );
    (launcher, pool)
}

#[test]
fn host_pool_reserve_and_release_cycle() -> AppResult<()> {
    let pool = HostPool::new(["fast1".to_owned(), "fast2".to_owned()]);

    let first = pool
        .reserve()
        .ok_or_else(|| AppError::manager("Expected a first host"))?;
    let second = pool
        .reserve()
        .ok_or_else(|| AppError::manager("Expected a second host"))?;
    if first == second {
        return Err(AppError::manager(format!(
            "Reserved the same host twice: {}",
            first
        )));
    }
    if pool.reserve().is_some() {
        return Err(AppError::manager("Expected an empty pool"));
    }

    pool.release(first);
    if pool.reserve().is_none() {
        return Err(AppError::manager("Expected the released host back"));
    }
    Ok(())
}

#[test]
fn host_pool_never_grants_a_host_twice() -> AppResult<()> {
    let pool = Arc::new(HostPool::new([
        "fast1".to_owned(),
        "fast2".to_owned(),
        "fast3".to_owned(),
    ]));
    let held: Arc<Mutex<HashSet<String>>> = Arc::new(Mutex::new(HashSet::new()));
    let violations = Arc::new(AtomicUsize::new(0));

    let mut handles = Vec::new();
    for _ in 0..4 {
        let pool = pool.clone();
        let held = held.clone();
        let violations = violations.clone();
        handles.push(std::thread::spawn(move || {
            for _ in 0..200 {
                let Some(host) = pool.reserve() else {
                    continue;
                };
                {
                    let mut guard = held.lock().unwrap_or_else(PoisonError::into_inner);
                    if !guard.insert(host.clone()) {
                        violations.fetch_add(1, Ordering::SeqCst);
                    }
                }
                std::thread::yield_now();
                {
                    let mut guard = held.lock().unwrap_or_else(PoisonError::into_inner);
                    guard.remove(&host);
                }
                pool.release(host);
            }
        }));
    }
    for handle in handles {
        if handle.join().is_err() {
            return Err(AppError::manager("Worker thread panicked"));
        }
    }

    let seen = violations.load(Ordering::SeqCst);
    if seen > 0 {
        return Err(AppError::manager(format!(
            "Host granted to two callers {} time(s)",
            seen
        )));
    }
    if pool.len() != 3 {
        return Err(AppError::manager(format!(
            "Pool should end full, has {} host(s)",
            pool.len()
        )));
    }
    Ok(())
}

#[test]
fn host_pool_ignores_duplicate_release() -> AppResult<()> {
    let pool = HostPool::new(["fast1".to_owned()]);
    pool.release("fast1".to_owned());
    if pool.len() != 1 {
        return Err(AppError::manager(format!(
            "Expected one host after duplicate release, got {}",
            pool.len()
        )));
    }
    Ok(())
}

#[test]
fn invocation_places_callback_last() -> AppResult<()> {
    let launcher = local_launcher();
    let argv = launcher.build_invocation("10.0.0.5:15000", "n=65536");
    let expected = [
        "./worker".to_owned(),
        "--threads".to_owned(),
        "4".to_owned(),
        "--workerparams=n=65536".to_owned(),
        "10.0.0.5:15000".to_owned(),
    ];
    if argv != expected {
        return Err(AppError::manager(format!("Unexpected argv: {:?}", argv)));
    }
    Ok(())
}

#[test]
fn invocation_omits_empty_parameter_block() -> AppResult<()> {
    let launcher = local_launcher();
    let argv = launcher.build_invocation("10.0.0.5:15000", "");
    let expected = [
        "./worker".to_owned(),
        "--threads".to_owned(),
        "4".to_owned(),
        "10.0.0.5:15000".to_owned(),
    ];
    if argv != expected {
        return Err(AppError::manager(format!("Unexpected argv: {:?}", argv)));
    }
    Ok(())
}

#[test]
fn loopback_detection_covers_common_forms() -> AppResult<()> {
    for addr in [
        "localhost:15000",
        "127.0.0.1:15000",
        "::1:15000",
        "0:0:0:0:0:0:0:1:15000",
    ] {
        if !is_loopback_address(addr) {
            return Err(AppError::manager(format!(
                "Expected {} to be loopback",
                addr
            )));
        }
    }
    if is_loopback_address("fast1.cluster:15000") {
        return Err(AppError::manager("fast1.cluster should not be loopback"));
    }
    Ok(())
}

#[tokio::test]
async fn remote_loopback_fails_before_reserving() -> AppResult<()> {
    let (launcher, pool) = remote_launcher(&["fast1"]);
    let runner = FakeRunner::new(Duration::ZERO);

    match launcher.launch(&runner, "localhost:15000", "n=1").await {
        Err(AppError::Manager(ManagerError::LoopbackCallback { .. })) => {}
        Ok(()) => return Err(AppError::manager("Expected a loopback rejection")),
        Err(err) => {
            return Err(AppError::manager(format!("Unexpected error: {}", err)));
        }
    }
    if pool.len() != 1 {
        return Err(AppError::manager(format!(
            "Pool size changed to {}",
            pool.len()
        )));
    }
    if !runner.invocations().is_empty() {
        return Err(AppError::manager("No process should have been started"));
    }
    Ok(())
}

#[tokio::test]
async fn remote_launch_wraps_invocation_in_ssh_and_releases_host() -> AppResult<()> {
    let (launcher, pool) = remote_launcher(&["fast1"]);
    let runner = FakeRunner::new(Duration::ZERO);

    launcher.launch(&runner, "10.0.0.5:15000", "n=1").await?;

    let invocations = runner.invocations();
    let argv = invocations
        .first()
        .ok_or_else(|| AppError::manager("Expected one invocation"))?;
    let expected = [
        "ssh".to_owned(),
        "-o".to_owned(),
        "StrictHostKeyChecking=no".to_owned(),
        "fast1".to_owned(),
        "./worker".to_owned(),
        "--workerparams=n=1".to_owned(),
        "10.0.0.5:15000".to_owned(),
    ];
    if argv != &expected {
        return Err(AppError::manager(format!("Unexpected argv: {:?}", argv)));
    }
    if pool.len() != 1 {
        return Err(AppError::manager(format!(
            "Host not released, pool has {}",
            pool.len()
        )));
    }
    Ok(())
}

#[tokio::test]
async fn third_concurrent_remote_launch_is_dropped() -> AppResult<()> {
    // Two hosts, three concurrent launches: exactly two proceed, one fails
    // with NoHostAvailable. Queue-and-wait is the documented alternative
    // behavior; the drop is deliberate and observable.
    let (launcher, pool) = remote_launcher(&["fast1", "fast2"]);
    let runner = FakeRunner::new(Duration::from_millis(50));

    let (first, second, third) = tokio::join!(
        launcher.launch(&runner, "10.0.0.5:15000", "n=1"),
        launcher.launch(&runner, "10.0.0.5:15000", "n=2"),
        launcher.launch(&runner, "10.0.0.5:15000", "n=3"),
    );

    let outcomes = [first, second, third];
    let dropped = outcomes
        .iter()
        .filter(|outcome| {
            matches!(
                outcome,
                Err(AppError::Manager(ManagerError::NoHostAvailable))
            )
        })
        .count();
    let launched = outcomes.iter().filter(|outcome| outcome.is_ok()).count();
    if launched != 2 || dropped != 1 {
        return Err(AppError::manager(format!(
            "Expected 2 launches and 1 drop, got {} and {}",
            launched, dropped
        )));
    }
    if pool.len() != 2 {
        return Err(AppError::manager(format!(
            "Both hosts should be back, pool has {}",
            pool.len()
        )));
    }
    Ok(())
}

#[tokio::test]
async fn connection_joins_all_launches_before_returning() -> AppResult<()> {
    let launcher = Arc::new(local_launcher());
    let runner = Arc::new(FakeRunner::new(Duration::from_millis(20)));

    let (mut master, manager_side) = tokio::io::duplex(4096);
    send_string(&mut master, "10.0.0.5:15000").await?;
    send_string(&mut master, "n=1").await?;
    send_string(&mut master, "n=2").await?;
    master
        .shutdown()
        .await
        .map_err(|err| AppError::manager(format!("Shutdown failed: {}", err)))?;
    drop(master);

    handle_connection(manager_side, launcher, runner.clone()).await?;

    if runner.completed() != 2 {
        return Err(AppError::manager(format!(
            "Handler returned before launches finished: {} of 2",
            runner.completed()
        )));
    }
    Ok(())
}

#[tokio::test]
async fn connection_closed_before_address_is_graceful() -> AppResult<()> {
    let launcher = Arc::new(local_launcher());
    let runner = Arc::new(FakeRunner::new(Duration::ZERO));

    let (master, manager_side) = tokio::io::duplex(64);
    drop(master);

    handle_connection(manager_side, launcher, runner.clone()).await?;
    if !runner.invocations().is_empty() {
        return Err(AppError::manager("No worker should have launched"));
    }
    Ok(())
}
