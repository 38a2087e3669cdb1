use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use courier::channel::InvocationRequest;
use courier::consts::{
    ARG_MESSAGE, ARG_SENDER, INVOCATION_BUFFER, METHOD_MESSAGE_RECEIVED, SMS_CHANNEL,
};
use courier::engine::cache::EngineCache;
use courier::engine::mock::{Inbox, MockFactory};
use courier::error::{DecodeError, DispatchError, Failure};
use courier::message::{InboundEvent, InboundMessage, JsonDecoder, PayloadDecoder};
use courier::receiver::{Delivery, SmsReceiver};

/// JSON payload exactly as the platform would deliver it.
fn payload(sender: &str, message: &str) -> Vec<u8> {
    serde_json::json!({ "sender": sender, "message": message })
        .to_string()
        .into_bytes()
}

fn receiver_with(factory: MockFactory) -> SmsReceiver {
    SmsReceiver::new(
        Box::new(JsonDecoder),
        Arc::new(EngineCache::new(Box::new(factory))),
    )
}

/// Poll until `cond` holds; fail the test after a second.
async fn eventually(cond: impl Fn() -> bool, what: &str) {
    tokio::time::timeout(Duration::from_secs(1), async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("timed out waiting for {what}"));
}

/// Wait until the engine has handled `n` requests, then return them.
async fn drained(inbox: &Inbox, n: usize) -> Vec<InvocationRequest> {
    tokio::time::timeout(Duration::from_secs(1), async {
        loop {
            let got = inbox.lock().await;
            if got.len() >= n {
                return got.clone();
            }
            drop(got);
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("engine never drained the expected requests")
}

// ── The happy path ────────────────────────────────────────────────

#[tokio::test]
async fn single_payload_reaches_the_engine() {
    let factory = MockFactory::default();
    let inbox = Arc::clone(&factory.inbox);
    let boots = Arc::clone(&factory.boots);
    let receiver = receiver_with(factory);

    let event = InboundEvent::sms(vec![payload("+15551234567", "Hello")]);
    let delivery = receiver.on_event(&event).await;

    assert!(matches!(delivery, Delivery::Dispatched));
    let got = drained(&inbox, 1).await;
    assert_eq!(got[0].method, METHOD_MESSAGE_RECEIVED);
    assert_eq!(got[0].args[ARG_SENDER], "+15551234567");
    assert_eq!(got[0].args[ARG_MESSAGE], "Hello");
    assert_eq!(boots.load(Ordering::SeqCst), 1);

    // And exactly once.
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(inbox.lock().await.len(), 1);
}

#[tokio::test]
async fn engine_boots_once_across_events() {
    let factory = MockFactory::default();
    let inbox = Arc::clone(&factory.inbox);
    let boots = Arc::clone(&factory.boots);
    let receiver = receiver_with(factory);

    for i in 0..3 {
        let event = InboundEvent::sms(vec![payload("+15551234567", &format!("msg {i}"))]);
        assert!(matches!(receiver.on_event(&event).await, Delivery::Dispatched));
    }

    drained(&inbox, 3).await;
    assert_eq!(boots.load(Ordering::SeqCst), 1);
}

// ── Payload policy ────────────────────────────────────────────────

#[tokio::test]
async fn first_decodable_payload_wins() {
    let factory = MockFactory::default();
    let inbox = Arc::clone(&factory.inbox);
    let receiver = receiver_with(factory);

    let event = InboundEvent::sms(vec![
        payload("+15550000001", "from the first"),
        payload("+15550000002", "from the second"),
    ]);

    assert!(matches!(receiver.on_event(&event).await, Delivery::Dispatched));

    let got = drained(&inbox, 1).await;
    assert_eq!(got[0].args[ARG_SENDER], "+15550000001");

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(inbox.lock().await.len(), 1);
}

#[tokio::test]
async fn undecodable_payload_is_skipped() {
    let factory = MockFactory::default();
    let inbox = Arc::clone(&factory.inbox);
    let receiver = receiver_with(factory);

    let event = InboundEvent::sms(vec![
        b"garbage".to_vec(),
        payload("+15550000002", "still delivered"),
    ]);

    assert!(matches!(receiver.on_event(&event).await, Delivery::Dispatched));

    let got = drained(&inbox, 1).await;
    assert_eq!(got[0].args[ARG_SENDER], "+15550000002");
}

#[tokio::test]
async fn event_with_only_garbage_fails_quietly() {
    let factory = MockFactory::default();
    let inbox = Arc::clone(&factory.inbox);
    let boots = Arc::clone(&factory.boots);
    let receiver = receiver_with(factory);

    let event = InboundEvent::sms(vec![b"garbage".to_vec()]);
    let delivery = receiver.on_event(&event).await;

    assert!(matches!(
        delivery,
        Delivery::Failed(Failure::Decode(DecodeError::Json(_)))
    ));
    // No engine was booted for nothing.
    assert_eq!(boots.load(Ordering::SeqCst), 0);
    assert!(inbox.lock().await.is_empty());
}

#[tokio::test]
async fn event_with_no_payloads_fails_quietly() {
    let receiver = receiver_with(MockFactory::default());

    let delivery = receiver.on_event(&InboundEvent::sms(vec![])).await;

    assert!(matches!(
        delivery,
        Delivery::Failed(Failure::Decode(DecodeError::Empty))
    ));
}

#[tokio::test]
async fn custom_decoder_rejections_are_contained() {
    // A decoder whose platform link is down. Everything is rejected.
    struct ClosedPort;

    impl PayloadDecoder for ClosedPort {
        fn decode(&self, _payload: &[u8]) -> Result<InboundMessage, DecodeError> {
            Err(DecodeError::Invalid("decoder offline".to_string()))
        }
    }

    let receiver = SmsReceiver::new(
        Box::new(ClosedPort),
        Arc::new(EngineCache::new(Box::new(MockFactory::default()))),
    );

    let event = InboundEvent::sms(vec![payload("+15551234567", "unreadable")]);
    assert!(matches!(
        receiver.on_event(&event).await,
        Delivery::Failed(Failure::Decode(DecodeError::Invalid(_)))
    ));
}

// ── Irrelevant events ─────────────────────────────────────────────

#[tokio::test]
async fn other_broadcasts_are_ignored() {
    let factory = MockFactory::default();
    let boots = Arc::clone(&factory.boots);
    let receiver = receiver_with(factory);

    let event = InboundEvent {
        tag: "battery.low".to_string(),
        payloads: vec![payload("+15551234567", "never read")],
    };

    assert!(matches!(receiver.on_event(&event).await, Delivery::Ignored));
    assert_eq!(boots.load(Ordering::SeqCst), 0);
}

// ── Failure containment ───────────────────────────────────────────

#[tokio::test]
async fn failed_boot_is_contained_and_the_next_event_retries() {
    let factory = MockFactory {
        boot_failures: 1,
        ..MockFactory::default()
    };
    let inbox = Arc::clone(&factory.inbox);
    let boots = Arc::clone(&factory.boots);
    let receiver = receiver_with(factory);

    let event = InboundEvent::sms(vec![payload("+15551234567", "too early")]);
    assert!(matches!(
        receiver.on_event(&event).await,
        Delivery::Failed(Failure::EngineInit(_))
    ));

    // The next event is the retry; nothing was cached.
    let event = InboundEvent::sms(vec![payload("+15551234567", "try again")]);
    assert!(matches!(receiver.on_event(&event).await, Delivery::Dispatched));

    let got = drained(&inbox, 1).await;
    assert_eq!(got[0].args[ARG_MESSAGE], "try again");
    assert_eq!(boots.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn full_channel_is_contained() {
    let factory = MockFactory {
        engine_delay: Some(Duration::from_secs(60)),
        ..MockFactory::default()
    };
    let started = Arc::clone(&factory.started);
    let receiver = receiver_with(factory);

    // The engine takes the first request and sits on it.
    let event = InboundEvent::sms(vec![payload("+15551234567", "holds the engine")]);
    assert!(matches!(receiver.on_event(&event).await, Delivery::Dispatched));
    eventually(|| started.load(Ordering::SeqCst) == 1, "the engine to start").await;

    // Fill the channel behind it.
    for i in 0..INVOCATION_BUFFER {
        let event = InboundEvent::sms(vec![payload("+15551234567", &i.to_string())]);
        assert!(matches!(receiver.on_event(&event).await, Delivery::Dispatched));
    }

    let event = InboundEvent::sms(vec![payload("+15551234567", "overflow")]);
    match receiver.on_event(&event).await {
        Delivery::Failed(Failure::Dispatch(DispatchError::Full(channel))) => {
            assert_eq!(channel, SMS_CHANNEL);
        }
        other => panic!("expected a full-channel failure, got {other:?}"),
    }
}

#[tokio::test]
async fn on_event_returns_while_the_engine_is_still_working() {
    let factory = MockFactory {
        engine_delay: Some(Duration::from_secs(60)),
        ..MockFactory::default()
    };
    let started = Arc::clone(&factory.started);
    let inbox = Arc::clone(&factory.inbox);
    let receiver = receiver_with(factory);

    let event = InboundEvent::sms(vec![payload("+15551234567", "slow")]);
    let delivery = receiver.on_event(&event).await;

    // Dispatched, even though the engine will not finish for a minute.
    assert!(matches!(delivery, Delivery::Dispatched));
    eventually(|| started.load(Ordering::SeqCst) == 1, "the engine to start").await;
    assert!(inbox.lock().await.is_empty());
}
