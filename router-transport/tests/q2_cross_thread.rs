//! Cross-thread Q2 unblock: a producer connection actor on one tokio
//! worker thread is put to sleep by Q2, and a consumer on a different
//! worker thread drains the shared content enough to unblock it, waking
//! the producer through `ActivationRegistry` rather than anything
//! thread-local (spec §4.1 Q2, §5 "Weak references across threads").

use router_message::{DEFAULT_BUFFER_CAPACITY, MessageContent, Q2_UPPER};
use router_transport::{ActivationRegistry, ConnectionActor};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tokio::sync::Notify;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn consumer_drain_on_another_thread_wakes_the_producer() {
    let content = MessageContent::new();
    let registry: ActivationRegistry<ConnectionActor> = ActivationRegistry::new();

    let producer = Arc::new(ConnectionActor::new(false));
    let producer_handle = registry.register(producer.clone());
    content.set_producer_activation(producer_handle);

    let full_buffer = vec![b'x'; DEFAULT_BUFFER_CAPACITY];
    for _ in 0..Q2_UPPER {
        let signal = content.receive(&full_buffer);
        producer.apply_q2_signal_locally(signal);
    }
    assert!(!producer.on_read(), "producer must stop reading once Q2 blocks");

    let reader_id = content.register_consumer();
    let ready = Arc::new(Notify::new());

    let consumer_content = content.clone();
    let consumer_ready = ready.clone();
    let consumer_task = tokio::spawn(async move {
        consumer_ready.notified().await;
        let floor = consumer_content.total_available_bytes();
        consumer_content.report_consumer_position(reader_id, floor)
    });

    tokio::task::yield_now().await;
    ready.notify_one();
    let signal = consumer_task.await.expect("consumer task completes");

    let woken = router_transport::activation::wake_producer_on_unblock(signal, &content, &registry);
    assert!(woken, "the producer must still be registered and reachable");
    assert!(
        producer.flags.q2_restart.load(Ordering::Acquire),
        "WAKE should have something to clear"
    );
}
