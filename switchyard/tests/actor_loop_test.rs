mod test_helpers;

use std::time::{Duration, Instant};

use switchyard::{
    ActorError, ActorLoop, ActorState, AskError, DeliveryError, DispatchConfig, ExitReason,
    LoopConfig, SetupError, TickMode,
};
use test_helpers::{join, wait_for, within, Counter, CounterCmd};

fn quiet() -> LoopConfig {
    LoopConfig::default().without_tick()
}

#[tokio::test]
async fn test_ping_then_shutdown() {
    let actor_loop = ActorLoop::new(Counter::default(), &quiet()).unwrap();
    let handle = actor_loop.handle();
    let running = actor_loop.start().unwrap();

    within(handle.send("main", CounterCmd::Add(1))).await.unwrap();
    assert!(handle.shutdown());

    let report = join(running).await;
    assert_eq!(report.exit, ExitReason::Shutdown);
    assert_eq!(report.processed, 1);
    assert_eq!(handle.state(), ActorState::Stopped);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_delivered_message_survives_immediate_shutdown() {
    for round in 0..200 {
        let actor_loop = ActorLoop::new(Counter::default(), &quiet()).unwrap();
        let handle = actor_loop.handle();
        let running = actor_loop.start().unwrap();

        within(handle.send("main", CounterCmd::Add(1))).await.unwrap();
        handle.shutdown();

        let report = join(running).await;
        assert_eq!(report.processed, 1, "message lost in round {round}");
        assert_eq!(report.exit, ExitReason::Shutdown);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_buffered_messages_survive_shutdown() {
    for round in 0..50 {
        let config = quiet().with_mailbox_capacity(8);
        let actor_loop = ActorLoop::new(Counter::default(), &config).unwrap();
        let handle = actor_loop.handle();
        let running = actor_loop.start().unwrap();

        let mut accepted = 0;
        for n in 0..8 {
            if within(handle.send("main", CounterCmd::Add(n))).await.is_ok() {
                accepted += 1;
            }
        }
        handle.shutdown();

        let report = join(running).await;
        assert_eq!(accepted, 8);
        assert_eq!(report.processed, 8, "buffered messages lost in round {round}");
    }
}

#[tokio::test]
async fn test_buffered_messages_handled_before_start_then_shutdown() {
    let config = quiet().with_mailbox_capacity(4);
    let actor_loop = ActorLoop::new(Counter::default(), &config).unwrap();
    let handle = actor_loop.handle();

    for n in 1..=3 {
        within(handle.send("early", CounterCmd::Add(n))).await.unwrap();
    }
    // Fired before the loop ever runs: the queued messages still count.
    handle.shutdown();

    let report = join(actor_loop.start().unwrap()).await;
    assert_eq!(report.processed, 3);
    assert_eq!(report.exit, ExitReason::Shutdown);
}

#[tokio::test]
async fn test_send_after_shutdown_fails_fast() {
    let actor_loop = ActorLoop::new(Counter::default(), &quiet()).unwrap();
    let handle = actor_loop.handle();
    let running = actor_loop.start().unwrap();

    handle.shutdown();
    join(running).await;

    let started = Instant::now();
    let result = within(handle.send("late", CounterCmd::Add(1))).await;
    assert_eq!(result, Err(DeliveryError::Shutdown));
    assert!(started.elapsed() < Duration::from_secs(1));
    assert!(!handle.is_alive());
}

#[tokio::test]
async fn test_blocked_sender_released_by_shutdown() {
    // Never started, so a rendezvous send can only wait.
    let config = quiet().with_send_timeout(None);
    let actor_loop = ActorLoop::new(Counter::default(), &config).unwrap();
    let handle = actor_loop.handle();

    let sender = handle.clone();
    let blocked = tokio::spawn(async move { sender.send("blocked", CounterCmd::Add(1)).await });
    wait_for(50).await;
    assert!(!blocked.is_finished());

    handle.shutdown();
    let result = within(blocked).await.unwrap();
    assert_eq!(result, Err(DeliveryError::Shutdown));
    drop(actor_loop);
}

#[tokio::test]
async fn test_send_timeout_when_loop_is_not_receiving() {
    let config = quiet().with_send_timeout(Some(Duration::from_millis(50)));
    let actor_loop = ActorLoop::new(Counter::default(), &config).unwrap();
    let handle = actor_loop.handle();

    let result = within(handle.send("main", CounterCmd::Add(1))).await;
    assert_eq!(result, Err(DeliveryError::Timeout(Duration::from_millis(50))));
    drop(actor_loop);
}

#[tokio::test]
async fn test_ask_observes_previous_writes() {
    let actor_loop = ActorLoop::new(Counter::default(), &quiet()).unwrap();
    let handle = actor_loop.handle();
    let running = actor_loop.start().unwrap();

    for n in 1..=4 {
        within(handle.send("writer", CounterCmd::Add(n))).await.unwrap();
    }
    let total = within(handle.ask("reader", CounterCmd::Get)).await.unwrap();
    assert_eq!(total, 10);

    handle.shutdown();
    let report = join(running).await;
    assert_eq!(report.processed, 5);
}

#[tokio::test]
async fn test_handler_error_keeps_loop_running() {
    let actor_loop = ActorLoop::new(Counter::default(), &quiet()).unwrap();
    let handle = actor_loop.handle();
    let running = actor_loop.start().unwrap();

    let err = within(handle.ask("main", CounterCmd::Fail)).await.unwrap_err();
    assert!(matches!(err, AskError::Actor(ActorError::MessageHandlingError(_))));

    let total = within(handle.ask("main", CounterCmd::Add(3))).await.unwrap();
    assert_eq!(total, 3);

    handle.shutdown();
    let report = join(running).await;
    assert_eq!(report.processed, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.exit, ExitReason::Shutdown);
}

#[tokio::test]
async fn test_handler_panic_ends_loop() {
    let actor_loop = ActorLoop::new(Counter::default(), &quiet()).unwrap();
    let handle = actor_loop.handle();
    let running = actor_loop.start().unwrap();

    let err = within(handle.ask("main", CounterCmd::Panic)).await.unwrap_err();
    match err {
        AskError::Actor(ActorError::Panicked(reason)) => assert!(reason.contains("counter exploded")),
        other => panic!("unexpected error: {other:?}"),
    }

    let report = join(running).await;
    assert!(matches!(report.exit, ExitReason::Panicked(_)));
    assert_eq!(
        within(handle.send("main", CounterCmd::Add(1))).await,
        Err(DeliveryError::Shutdown)
    );
}

#[tokio::test]
async fn test_double_shutdown_is_noop() {
    let actor_loop = ActorLoop::new(Counter::default(), &quiet()).unwrap();
    let handle = actor_loop.handle();
    let running = actor_loop.start().unwrap();

    assert!(handle.shutdown());
    assert!(!handle.shutdown());
    assert!(!handle.clone().shutdown());

    let report = join(running).await;
    assert_eq!(report.exit, ExitReason::Shutdown);
}

#[tokio::test]
async fn test_actor_can_stop_itself() {
    let actor_loop = ActorLoop::new(Counter::default(), &quiet()).unwrap();
    let handle = actor_loop.handle();
    let running = actor_loop.start().unwrap();

    within(handle.send("main", CounterCmd::Stop)).await.unwrap();
    let report = join(running).await;
    assert_eq!(report.exit, ExitReason::Stopped);
    assert_eq!(
        within(handle.send("main", CounterCmd::Add(1))).await,
        Err(DeliveryError::Shutdown)
    );
}

#[tokio::test]
async fn test_dropping_every_handle_disconnects() {
    let actor_loop = ActorLoop::new(Counter::default(), &quiet()).unwrap();
    let handle = actor_loop.handle();
    let running = actor_loop.start().unwrap();

    within(handle.send("main", CounterCmd::Add(1))).await.unwrap();
    drop(handle);

    let report = join(running).await;
    assert_eq!(report.exit, ExitReason::Disconnected);
    assert_eq!(report.processed, 1);
}

#[tokio::test]
async fn test_lifecycle_states() {
    let actor_loop = ActorLoop::new(Counter::default(), &quiet()).unwrap();
    let handle = actor_loop.handle();
    assert_eq!(handle.state(), ActorState::Created);

    let running = actor_loop.start().unwrap();
    within(handle.ask("main", CounterCmd::Get)).await.unwrap();
    assert_eq!(handle.state(), ActorState::Running);
    assert!(handle.is_alive());

    handle.shutdown();
    join(running).await;
    assert_eq!(handle.state(), ActorState::Stopped);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_senders_are_serialized() {
    let actor_loop = ActorLoop::new(Counter::default(), &quiet()).unwrap();
    let handle = actor_loop.handle();
    let running = actor_loop.start().unwrap();

    let mut senders = Vec::new();
    for s in 0..10 {
        let handle = handle.clone();
        senders.push(tokio::spawn(async move {
            for _ in 0..10 {
                handle.send(format!("sender-{s}"), CounterCmd::Add(1)).await.unwrap();
            }
        }));
    }
    for sender in senders {
        within(sender).await.unwrap();
    }

    assert_eq!(within(handle.ask("main", CounterCmd::Get)).await.unwrap(), 100);
    handle.shutdown();
    let report = join(running).await;
    assert_eq!(report.processed, 101);
}

#[tokio::test]
async fn test_periodic_ticks_fire() {
    let config = LoopConfig::default().with_tick(Duration::from_millis(20), TickMode::Periodic);
    let actor_loop = ActorLoop::new(Counter::default(), &config).unwrap();
    let handle = actor_loop.handle();
    let running = actor_loop.start().unwrap();

    wait_for(150).await;
    handle.shutdown();
    let report = join(running).await;
    assert!(report.ticks >= 2, "only {} ticks", report.ticks);
}

#[tokio::test]
async fn test_idle_tick_waits_for_quiet_period() {
    let config = LoopConfig::default().with_tick(Duration::from_millis(200), TickMode::Idle);
    let actor_loop = ActorLoop::new(Counter::default(), &config).unwrap();
    let handle = actor_loop.handle();
    let running = actor_loop.start().unwrap();

    // Steady traffic keeps re-arming the idle timer.
    for _ in 0..10 {
        within(handle.send("busy", CounterCmd::Add(1))).await.unwrap();
        wait_for(20).await;
    }
    assert_eq!(within(handle.ask("main", CounterCmd::Get)).await.unwrap(), 10);

    handle.shutdown();
    let report = join(running).await;
    assert_eq!(report.ticks, 0);
}

#[tokio::test]
async fn test_system_defaults_apply_to_loop() {
    let system = DispatchConfig {
        default_mailbox_capacity: 16,
        ..Default::default()
    };
    let actor_loop = ActorLoop::with_defaults(Counter::default(), &quiet(), &system).unwrap();
    assert_eq!(actor_loop.handle().mailbox_capacity(), 16);

    let explicit = quiet().with_mailbox_capacity(2);
    let actor_loop = ActorLoop::with_defaults(Counter::default(), &explicit, &system).unwrap();
    assert_eq!(actor_loop.handle().mailbox_capacity(), 2);
}

#[tokio::test]
async fn test_invalid_system_defaults_rejected() {
    let system = DispatchConfig {
        default_send_timeout: Some(Duration::ZERO),
        ..Default::default()
    };
    let err = ActorLoop::with_defaults(Counter::default(), &quiet(), &system)
        .err()
        .unwrap();
    assert!(matches!(err, SetupError::InvalidConfig(_)));
}

#[tokio::test]
async fn test_zero_tick_interval_rejected() {
    let config = LoopConfig::default().with_tick(Duration::ZERO, TickMode::Idle);
    let err = ActorLoop::new(Counter::default(), &config).err().unwrap();
    assert!(matches!(err, SetupError::InvalidConfig(_)));
}

#[test]
fn test_start_without_runtime() {
    let actor_loop = ActorLoop::new(Counter::default(), &quiet()).unwrap();
    assert_eq!(actor_loop.start().err(), Some(SetupError::NoRuntime));
}
