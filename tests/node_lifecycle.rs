use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use shardvisor::services::actors::Attester;
use shardvisor::services::txpool::TxPool;
use shardvisor::{
    ActorRole, Config, Event, EventKind, Node, SHARD_CHAIN_DB_NAME, Service, Subscribe,
};
use tokio::sync::broadcast::error::TryRecvError;
use tokio::sync::{broadcast, mpsc};

fn config(actor: ActorRole) -> Config {
    Config {
        in_memory: true,
        actor,
        p2p_listen_addr: "127.0.0.1:0".into(),
        slot_duration: Duration::from_millis(10),
        tx_interval: Duration::from_millis(10),
        ..Config::default()
    }
}

/// Builds a node without log output whose exit hook only counts invocations.
fn node_with_exit_counter(cfg: Config) -> (Arc<Node>, Arc<AtomicUsize>) {
    let exits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&exits);
    let node = Node::builder(cfg)
        .with_subscribers(Vec::new())
        .with_exit_hook(Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }))
        .build();
    match node {
        Ok(node) => (node, exits),
        Err(e) => panic!("node build failed: {e}"),
    }
}

async fn collect_until(rx: &mut broadcast::Receiver<Event>, last: EventKind) -> Vec<Event> {
    let mut out = Vec::new();
    loop {
        let ev = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for events")
            .expect("bus closed");
        let done = ev.kind == last;
        out.push(ev);
        if done {
            return out;
        }
    }
}

fn count(events: &[Event], kind: EventKind) -> usize {
    events.iter().filter(|e| e.kind == kind).count()
}

#[tokio::test]
async fn start_blocks_until_close() {
    let (node, _exits) = node_with_exit_counter(config(ActorRole::Attester));
    let (_tx, rx) = mpsc::channel::<()>(1);

    let runner = {
        let node = Arc::clone(&node);
        tokio::spawn(async move { node.start_with(rx).await })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!runner.is_finished());
    assert!(!node.is_stopped());

    node.close().await;
    tokio::time::timeout(Duration::from_secs(5), runner)
        .await
        .expect("start did not return after close")
        .unwrap();
    assert!(node.is_stopped());
}

#[tokio::test]
async fn close_releases_storage_then_stops_services_in_reverse() {
    let (node, _exits) = node_with_exit_counter(config(ActorRole::Proposer));
    let mut rx = node.subscribe();
    let (_tx, signals) = mpsc::channel::<()>(1);

    let runner = {
        let node = Arc::clone(&node);
        tokio::spawn(async move { node.start_with(signals).await })
    };
    collect_until(&mut rx, EventKind::NodeStarted).await;

    node.close().await;
    runner.await.unwrap();
    let events = collect_until(&mut rx, EventKind::NodeStopped).await;

    assert_eq!(count(&events, EventKind::StorageClosed), 1);
    assert_eq!(events[0].kind, EventKind::StorageClosed);

    let stopped: Vec<&str> = events
        .iter()
        .filter(|e| e.kind == EventKind::ServiceStopped)
        .filter_map(|e| e.service.as_deref())
        .collect();
    assert_eq!(stopped, ["proposer", "beacon", "rpcclient", "txpool", "p2p"]);
    assert_eq!(count(&events, EventKind::ServiceStopFailed), 0);
}

#[tokio::test]
async fn second_close_is_a_no_op() {
    let (node, _exits) = node_with_exit_counter(config(ActorRole::None));
    node.close().await;

    let mut rx = node.subscribe();
    node.close().await;
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    assert!(node.is_stopped());
}

#[tokio::test]
async fn concurrent_closes_stop_services_once() {
    let (node, _exits) = node_with_exit_counter(config(ActorRole::Attester));
    let mut rx = node.subscribe();

    let closes: Vec<_> = (0..4)
        .map(|_| {
            let node = Arc::clone(&node);
            tokio::spawn(async move { node.close().await })
        })
        .collect();
    for close in closes {
        close.await.unwrap();
    }

    let events = collect_until(&mut rx, EventKind::NodeStopped).await;
    assert_eq!(count(&events, EventKind::StorageClosed), 1);
    assert_eq!(count(&events, EventKind::ServiceStopped), 4);
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn storage_open_failure_aborts_construction() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"file").unwrap();

    let cfg = Config {
        data_dir: blocker,
        in_memory: false,
        ..config(ActorRole::Attester)
    };
    let Err(err) = Node::builder(cfg).with_subscribers(Vec::new()).build() else {
        panic!("node built on top of a regular file");
    };
    assert_eq!(err.as_label(), "storage_open_failed");
}

#[tokio::test]
async fn on_disk_storage_lives_under_data_dir() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = Config {
        data_dir: dir.path().to_path_buf(),
        in_memory: false,
        ..config(ActorRole::None)
    };
    let (node, _exits) = node_with_exit_counter(cfg);
    assert!(dir.path().join(SHARD_CHAIN_DB_NAME).exists());
    node.close().await;
}

#[tokio::test]
async fn services_run_between_start_and_close() {
    let (node, _exits) = node_with_exit_counter(config(ActorRole::Proposer));
    let (_tx, signals) = mpsc::channel::<()>(1);

    let runner = {
        let node = Arc::clone(&node);
        tokio::spawn(async move { node.start_with(signals).await })
    };
    let pool = node.service::<TxPool>().await.unwrap();

    tokio::time::timeout(Duration::from_secs(5), async {
        while pool.relayed() == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("txpool never relayed a transaction");

    node.close().await;
    runner.await.unwrap();
    let relayed = pool.relayed();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(pool.relayed(), relayed);
}

#[tokio::test]
async fn tenth_interrupt_forces_exit_once() {
    let (node, exits) = node_with_exit_counter(config(ActorRole::Attester));
    let mut rx = node.subscribe();
    let (tx, signals) = mpsc::channel::<()>(16);

    let runner = {
        let node = Arc::clone(&node);
        tokio::spawn(async move { node.start_with(signals).await })
    };
    collect_until(&mut rx, EventKind::NodeStarted).await;

    tx.send(()).await.unwrap();
    tokio::time::timeout(Duration::from_secs(5), runner)
        .await
        .expect("first interrupt did not close the node")
        .unwrap();

    for _ in 0..9 {
        tx.send(()).await.unwrap();
    }
    let events = collect_until(&mut rx, EventKind::ForcedTermination).await;

    assert_eq!(count(&events, EventKind::ShutdownRequested), 1);
    assert_eq!(count(&events, EventKind::ShutdownEscalated), 8);
    assert_eq!(count(&events, EventKind::NodeStopped), 1);
    let remaining: Vec<u32> = events
        .iter()
        .filter(|e| e.kind == EventKind::ShutdownEscalated)
        .filter_map(|e| e.remaining)
        .collect();
    assert_eq!(remaining, [8, 7, 6, 5, 4, 3, 2, 1]);

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(exits.load(Ordering::SeqCst), 1);

    // Handler is gone; more interrupts change nothing.
    let _ = tx.send(()).await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(exits.load(Ordering::SeqCst), 1);
}

struct Counter {
    seen: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl Subscribe for Counter {
    async fn on_event(&self, ev: &Event) {
        if ev.kind == EventKind::ServiceRegistered {
            self.seen.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn name(&self) -> &'static str {
        "counter"
    }
}

#[tokio::test]
async fn subscribers_observe_build_phase_events() {
    let seen = Arc::new(AtomicUsize::new(0));
    let node = Node::builder(config(ActorRole::Attester))
        .with_subscribers(vec![Arc::new(Counter {
            seen: Arc::clone(&seen),
        })])
        .build()
        .unwrap_or_else(|e| panic!("node build failed: {e}"));

    tokio::time::timeout(Duration::from_secs(5), async {
        while seen.load(Ordering::SeqCst) < 4 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("subscriber missed registrations");

    let attester = node.service::<Attester>().await.unwrap();
    assert_eq!(attester.name(), "attester");
    node.close().await;
}
