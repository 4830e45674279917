//! Message loop tests driven by a mocked source.

use std::sync::{Arc, mpsc};
use std::thread;
use std::time::Duration;

use mockall::{Sequence, mock};
use napi_config::Config;
use rstest::rstest;
use serde_json::{Value, json};

use super::support::{Observed, Recorder};
use crate::{
    ChannelSource, Continuation, CorrelationRegistry, Dispatcher, ErrorKind, Exchange, Listener,
    ListenerError, MessageSource, Reply, SourceError, SourcePoll, Subscribers,
};

mock! {
    Source {}
    impl MessageSource for Source {
        fn poll(&mut self, timeout: Duration) -> Result<SourcePoll, SourceError>;
    }
}

fn malformed(raw: &str) -> SourceError {
    SourceError::Malformed {
        raw: raw.to_owned(),
        source: serde_json::from_str::<Value>(raw).expect_err("text should not parse"),
    }
}

fn recording_dispatcher(recorder: &Recorder) -> (Arc<CorrelationRegistry>, Dispatcher) {
    let registry = Arc::new(CorrelationRegistry::new());
    let dispatcher = Dispatcher::new(Arc::clone(&registry), recorder.subscribers());
    (registry, dispatcher)
}

fn panicking_error_subscriber() -> Subscribers {
    Subscribers::builder()
        .on_agreement(|_| {})
        .on_provision(|_| {})
        .on_error(|record| panic!("error subscriber failed on {record:?}"))
        .on_provision_list(|_| {})
        .on_provision_mode(|_| {})
        .on_found_change(|_| {})
        .on_presence_change(|_| {})
        .on_notifications(|_| {})
        .build()
        .expect("all subscribers bound")
}

#[rstest]
fn malformed_text_is_reported_and_loop_continues() {
    let recorder = Recorder::default();
    let (registry, dispatcher) = recording_dispatcher(&recorder);
    registry
        .register(Exchange::new("r-1"), recorder.continuation("random"))
        .expect("register continuation");

    let mut source = MockSource::new();
    let mut sequence = Sequence::new();
    source
        .expect_poll()
        .once()
        .in_sequence(&mut sequence)
        .returning(|_| Err(malformed("{")));
    source
        .expect_poll()
        .once()
        .in_sequence(&mut sequence)
        .returning(|_| {
            Ok(SourcePoll::Message(json!({
                "operation": ["random", "run"],
                "exchange": "r-1",
                "request": {"pid": "p1"},
                "response": {"pseudoRandomNumber": "4"}
            })))
        });
    source
        .expect_poll()
        .once()
        .in_sequence(&mut sequence)
        .returning(|_| Ok(SourcePoll::Stopped));

    Listener::new(source, dispatcher, &Config::default()).run();

    let events = recorder.events();
    assert_eq!(events.len(), 2, "unexpected deliveries: {events:?}");
    assert!(matches!(
        events.first(),
        Some(Observed::Error(record)) if record.kind() == ErrorKind::ProtocolMalformed
    ));
    assert_eq!(
        events.get(1),
        Some(&Observed::Random(Reply::ok("p1", "4".to_owned())))
    );
}

#[rstest]
fn stop_requested_before_run_skips_polling() {
    let recorder = Recorder::default();
    let (_registry, dispatcher) = recording_dispatcher(&recorder);
    let mut listener = Listener::new(MockSource::new(), dispatcher, &Config::default());

    listener.stop_handle().request_stop();
    listener.run();

    assert!(recorder.events().is_empty());
}

#[rstest]
#[case(25, Duration::from_millis(25))]
#[case(0, Duration::from_millis(1))]
fn polls_with_configured_interval(#[case] poll_interval_ms: u64, #[case] expected: Duration) {
    let recorder = Recorder::default();
    let (_registry, dispatcher) = recording_dispatcher(&recorder);
    let config = Config {
        poll_interval_ms,
        ..Config::default()
    };

    let mut source = MockSource::new();
    source
        .expect_poll()
        .withf(move |timeout| *timeout == expected)
        .once()
        .returning(|_| Ok(SourcePoll::Stopped));

    Listener::new(source, dispatcher, &config).run();
}

#[rstest]
fn spawned_listener_stops_on_shutdown() {
    let recorder = Recorder::default();
    let (_registry, dispatcher) = recording_dispatcher(&recorder);
    let mut source = MockSource::new();
    source.expect_poll().returning(|timeout| {
        thread::sleep(timeout);
        Ok(SourcePoll::Timeout)
    });

    let handle = Listener::new(source, dispatcher, &Config::default())
        .spawn()
        .expect("spawn listener");
    handle.shutdown();

    assert!(handle.stop_handle().is_stopped());
    handle.join().expect("listener exits cleanly");
}

#[rstest]
fn dropping_the_handle_requests_a_stop() {
    let recorder = Recorder::default();
    let (_registry, dispatcher) = recording_dispatcher(&recorder);
    let (sender, receiver) = mpsc::channel::<String>();

    let handle = Listener::new(ChannelSource::new(receiver), dispatcher, &Config::default())
        .spawn()
        .expect("spawn listener");
    let stop = handle.stop_handle();
    drop(handle);

    assert!(stop.is_stopped());
    drop(sender);
}

#[rstest]
fn channel_replies_complete_continuations_on_the_listener_thread() {
    let recorder = Recorder::default();
    let (registry, dispatcher) = recording_dispatcher(&recorder);
    let (sender, receiver) = mpsc::channel::<String>();
    let (reply_tx, reply_rx) = mpsc::channel();
    registry
        .register(
            Exchange::new("sym-1"),
            Continuation::symmetric_key(move |reply| {
                reply_tx.send(reply).expect("forward reply");
            }),
        )
        .expect("register continuation");

    let handle = Listener::new(ChannelSource::new(receiver), dispatcher, &Config::default())
        .spawn()
        .expect("spawn listener");
    sender
        .send(
            json!({
                "operation": ["symmetricKey", "get"],
                "exchange": "sym-1",
                "request": {"pid": "p1"},
                "response": {"key": "deadbeef"}
            })
            .to_string(),
        )
        .expect("send message");

    let reply = reply_rx
        .recv_timeout(Duration::from_secs(5))
        .expect("continuation should fire");
    assert_eq!(reply, Reply::ok("p1", "deadbeef".to_owned()));
    assert_eq!(registry.pending().expect("pending"), 0);

    handle.shutdown();
    handle.join().expect("listener exits cleanly");
}

#[rstest]
fn exhausted_channel_ends_the_loop() {
    let recorder = Recorder::default();
    let (_registry, dispatcher) = recording_dispatcher(&recorder);
    let (sender, receiver) = mpsc::channel::<String>();
    sender.send("not json".to_owned()).expect("send message");
    drop(sender);

    Listener::new(ChannelSource::new(receiver), dispatcher, &Config::default()).run();

    let errors = recorder.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors.iter().all(|record| record.description().contains("not json")));
}

#[rstest]
fn panicking_subscriber_surfaces_on_join() {
    let registry = Arc::new(CorrelationRegistry::new());
    let dispatcher = Dispatcher::new(registry, panicking_error_subscriber());
    let mut source = MockSource::new();
    source
        .expect_poll()
        .returning(|_| Ok(SourcePoll::Message(json!("not an envelope"))));

    let handle = Listener::new(source, dispatcher, &Config::default())
        .spawn()
        .expect("spawn listener");

    assert!(matches!(handle.join(), Err(ListenerError::ThreadPanic)));
}
