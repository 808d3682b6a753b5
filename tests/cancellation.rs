use std::time::Duration;

use slurp::{Build, Context, Session, SlurpError};
use slurp_test_utils::{LogCapture, Recorder, init_tracing, session_config, task, with_timeout};
use tokio::time::{Instant, sleep};

/// Action that sleeps for `secs`, ignoring cancellation.
fn stubborn(rec: &Recorder, name: &str, secs: u64) -> impl slurp::Action + use<> {
    let rec = rec.clone();
    let name = name.to_string();
    move |_ctx: Context| {
        let rec = rec.clone();
        let name = name.clone();
        async move {
            rec.push(format!("{name} started"));
            sleep(Duration::from_secs(secs)).await;
            rec.push(format!("{name} finished"));
            anyhow::Ok(())
        }
    }
}

/// Action that sleeps for `secs` unless the session is cancelled first.
fn polite(rec: &Recorder, name: &str, secs: u64) -> impl slurp::Action + use<> {
    let rec = rec.clone();
    let name = name.to_string();
    move |ctx: Context| {
        let rec = rec.clone();
        let name = name.clone();
        async move {
            rec.push(format!("{name} started"));
            tokio::select! {
                () = ctx.cancelled() => rec.push(format!("{name} left")),
                () = sleep(Duration::from_secs(secs)) => rec.push(format!("{name} finished")),
            }
            anyhow::Ok(())
        }
    }
}

#[tokio::test(start_paused = true)]
async fn cancellation_while_waiting_skips_the_action() {
    init_tracing();
    let rec = Recorder::new();
    let mut b = Build::new();
    b.register([
        task("slow", &[], polite(&rec, "slow", 10)),
        task("after", &["slow"], rec.action("after")),
    ])
    .unwrap();
    let session = b.into_session();

    let waiter = session.start(&session.context(), ["after"]).unwrap();
    sleep(Duration::from_millis(100)).await;

    with_timeout(session.cancel()).await.unwrap();
    with_timeout(waiter.wait()).await.unwrap();

    assert_eq!(rec.events(), vec!["slow started", "slow left"]);
}

#[tokio::test]
async fn cancelled_session_runs_no_actions() {
    let rec = Recorder::new();
    let mut b = Build::new();
    b.register([
        task("a", &[], rec.action("a")),
        task("b", &["a"], rec.action("b")),
    ])
    .unwrap();
    let session = b.into_session();

    session.cancel().await.unwrap();
    session.run(&session.context(), ["b", "a"]).await.unwrap();

    assert!(session.is_cancelled());
    assert!(rec.events().is_empty());
}

#[tokio::test(start_paused = true)]
async fn stop_waits_for_running_action_then_cleans_up_once() {
    let rec = Recorder::new();
    let mut b = Build::new();
    b.register([task("busy", &[], stubborn(&rec, "busy", 3))])
        .unwrap();
    let cleanup_rec = rec.clone();
    b.defer(move || cleanup_rec.push("cleanup"));
    let session = b.into_session();

    let waiter = session.start(&session.context(), ["busy"]).unwrap();
    sleep(Duration::from_millis(10)).await;
    assert_eq!(session.registry().running_tasks(), vec!["busy"]);

    let started = Instant::now();
    with_timeout(session.stop()).await.unwrap();

    assert!(started.elapsed() >= Duration::from_millis(2900));
    assert_eq!(
        rec.events(),
        vec!["busy started", "busy finished", "cleanup"]
    );

    session.cleanup();
    assert!(matches!(
        session.stop().await,
        Err(SlurpError::AlreadyCancelled)
    ));
    assert_eq!(rec.count("cleanup"), 1);
    waiter.wait().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn stop_reports_tasks_that_outlive_the_timeout() {
    let rec = Recorder::new();
    let mut b = Build::with_config(session_config(2, 100));
    b.register([task("rabbit", &[], stubborn(&rec, "rabbit", 10))])
        .unwrap();
    let cleanup_rec = rec.clone();
    b.defer(move || cleanup_rec.push("cleanup"));
    let session = b.into_session();

    let _waiter = session.start(&session.context(), ["rabbit"]).unwrap();
    sleep(Duration::from_millis(10)).await;

    let started = Instant::now();
    let err = with_timeout(session.stop()).await.unwrap_err();
    let waited = started.elapsed();

    assert!(matches!(err, SlurpError::ShutdownTimeout(ref names) if names == &["rabbit"]));
    assert!(waited >= Duration::from_secs(2));
    assert!(waited < Duration::from_secs(3));
    assert_eq!(rec.count("cleanup"), 1);
    assert_eq!(rec.count("rabbit finished"), 0);
}

#[tokio::test(start_paused = true)]
async fn root_task_is_left_out_of_the_timeout_report() {
    let rec = Recorder::new();
    let mut b = Build::with_config(session_config(1, 100));
    b.register([task("default", &[], stubborn(&rec, "default", 10))])
        .unwrap();
    let session = b.into_session();

    let _waiter = session.start(&session.context(), ["default"]).unwrap();
    sleep(Duration::from_millis(10)).await;

    with_timeout(session.cancel()).await.unwrap();
}

fn turtle_and_rabbit(rec: &Recorder) -> Session {
    let mut b = Build::new();
    b.register([
        task("turtle", &[], polite(rec, "turtle", 4)),
        task("rabbit", &[], stubborn(rec, "rabbit", 4)),
        task("default", &["turtle", "rabbit"], rec.action("default")),
    ])
    .unwrap();
    b.into_session()
}

#[tokio::test(start_paused = true)]
async fn turtle_leaves_on_cancel_while_rabbit_holds_up_shutdown() {
    let logs = LogCapture::new();
    let _guard = logs.install();
    let rec = Recorder::new();
    let session = turtle_and_rabbit(&rec);

    let waiter = session.start(&session.context(), ["default"]).unwrap();
    sleep(Duration::from_millis(10)).await;
    let mut running = session.registry().running_tasks();
    running.sort();
    assert_eq!(running, vec!["rabbit", "turtle"]);

    let started = Instant::now();
    with_timeout(session.stop()).await.unwrap();
    let waited = started.elapsed();

    assert!(waited >= Duration::from_millis(3900));
    assert!(waited < Duration::from_secs(5));
    assert_eq!(rec.count("turtle left"), 1);
    assert_eq!(rec.count("turtle finished"), 0);
    assert_eq!(rec.count("rabbit finished"), 1);
    assert!(rec.position("turtle left") < rec.position("rabbit finished"));

    with_timeout(waiter.wait()).await.unwrap();
    assert_eq!(rec.count("default"), 0);

    // Rabbit is reported on every poll until it finishes; turtle never is.
    let waiting = logs.positions("Waiting for rabbit to finish.");
    let done = logs.positions("rabbit: Done.");
    assert!(waiting.len() >= 3, "expected repeated diagnostics, got {waiting:?}");
    assert_eq!(done.len(), 1);
    assert!(waiting.iter().all(|line| *line < done[0]));
    assert!(logs.positions("Waiting for turtle to finish.").is_empty());
    assert_eq!(
        logs.positions("Task cancelled. Reason: cancelled build.").len(),
        1
    );
}

#[tokio::test(start_paused = true)]
async fn turtle_and_rabbit_finish_when_left_alone() {
    let rec = Recorder::new();
    let session = turtle_and_rabbit(&rec);

    let started = Instant::now();
    with_timeout(session.run(&session.context(), ["default"]))
        .await
        .unwrap();

    assert!(started.elapsed() >= Duration::from_secs(4));
    assert_eq!(rec.count("turtle finished"), 1);
    assert_eq!(rec.count("rabbit finished"), 1);
    assert_eq!(rec.events().last().map(String::as_str), Some("default"));
}

#[tokio::test]
async fn second_cancel_is_rejected() {
    let session = Build::new().into_session();

    session.cancel().await.unwrap();
    let err = session.cancel().await.unwrap_err();

    assert!(matches!(err, SlurpError::AlreadyCancelled));
    assert!(!err.is_configuration());
}

#[tokio::test]
async fn cleanups_run_in_order_and_late_ones_run_immediately() {
    let rec = Recorder::new();
    let mut b = Build::new();
    for label in ["first", "second"] {
        let rec = rec.clone();
        b.defer(move || rec.push(label));
    }
    let session = b.into_session();
    let late = rec.clone();
    session.defer(move || late.push("third"));

    session.cleanup();
    session.cleanup();
    assert_eq!(rec.events(), vec!["first", "second", "third"]);

    let after = rec.clone();
    session.defer(move || after.push("after"));
    assert_eq!(rec.count("after"), 1);
}

#[tokio::test]
async fn child_contexts_share_the_session_signal() {
    let session = Build::new().into_session();
    let ctx = session.context();
    let child = ctx.child("build: ").child("assets: ");

    assert!(!child.is_cancelled());
    assert_eq!(child.log().prefix(), "build: assets: ");

    session.cancel().await.unwrap();

    assert!(ctx.is_cancelled());
    assert!(child.done().is_cancelled());
    with_timeout(child.cancelled()).await;
}
