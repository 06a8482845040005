//! Worker behavior: FIFO ordering, interest replay, failure isolation,
//! cooperative shutdown.

use std::io::Cursor;
use std::sync::Once;
use std::time::{Duration, Instant};

use chroma_config::{ColorSpace, Config, ProcessorPair, Snapshot, Transform};
use chroma_router::{
    Delivery, Destination, LogLevel, LogRecord, NotificationRouter, POLL_INTERVAL, QueueMessage,
};
use tracing_subscriber::EnvFilter;

const WAIT: Duration = Duration::from_secs(2);
const SETTLE: Duration = Duration::from_millis(300);

fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

fn config_with(names: &[&str]) -> Config {
    let mut config = Config::new();
    for name in names {
        config.add_color_space(ColorSpace::new(*name)).unwrap();
    }
    config
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let pixels = image::RgbaImage::from_pixel(width, height, image::Rgba([12, 34, 56, 255]));
    let mut bytes = Vec::new();
    pixels
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

#[test]
fn late_interest_replays_most_recent_message_once() {
    init_tracing();
    let router = NotificationRouter::spawn();
    let blob_v1 = config_with(&["A"]).save().unwrap();
    let blob_v2 = config_with(&["A", "B"]).save().unwrap();

    router.enqueue(QueueMessage::ConfigSnapshot(blob_v1));
    router.enqueue(QueueMessage::ConfigSnapshot(blob_v2));
    router.enqueue(QueueMessage::Log(LogRecord::new(LogLevel::Info, "marker")));

    // Log interest is on by default; its delivery proves both snapshots
    // were classified before it, in enqueue order.
    let first = router.recv_delivery_timeout(WAIT).unwrap();
    assert_eq!(first, Delivery::Log(LogRecord::new(LogLevel::Info, "marker")));

    router.set_interest(Destination::ConfigText, true);
    match router.recv_delivery_timeout(WAIT).unwrap() {
        Delivery::ConfigText(text) => {
            assert!(text.contains('B'), "replay should use the latest snapshot");
        }
        other => panic!("unexpected delivery: {other:?}"),
    }
    assert!(
        router.recv_delivery_timeout(SETTLE).is_none(),
        "replay must happen exactly once"
    );

    router.shutdown().unwrap();
}

#[test]
fn repeated_enable_does_not_replay_again() {
    init_tracing();
    let router = NotificationRouter::spawn();
    router.enqueue(QueueMessage::ConfigSnapshot(config_with(&["A"]).save().unwrap()));

    router.set_interest(Destination::ConfigText, true);
    assert!(matches!(
        router.recv_delivery_timeout(WAIT),
        Some(Delivery::ConfigText(_))
    ));

    // Already on; no false-to-true transition, so no replay.
    router.set_interest(Destination::ConfigText, true);
    assert!(router.recv_delivery_timeout(SETTLE).is_none());

    router.shutdown().unwrap();
}

#[test]
fn one_processor_feeds_both_text_destinations_in_order() {
    init_tracing();
    let router = NotificationRouter::spawn();
    router.set_interest(Destination::ShaderText, true);
    router.set_interest(Destination::CtfText, true);

    let pair = ProcessorPair::from_forward(vec![Transform::forward("lin_to_log")]);
    router.enqueue(QueueMessage::Processor(pair));

    let first = router.recv_delivery_timeout(WAIT).unwrap();
    let second = router.recv_delivery_timeout(WAIT).unwrap();
    assert!(matches!(first, Delivery::ShaderText(_)), "got {first:?}");
    assert!(matches!(second, Delivery::CtfText(_)), "got {second:?}");

    router.shutdown().unwrap();
}

#[test]
fn image_messages_decode_to_rgba() {
    init_tracing();
    let router = NotificationRouter::spawn();
    router.set_interest(Destination::Image, true);
    router.enqueue(QueueMessage::Image(png_bytes(4, 2)));

    match router.recv_delivery_timeout(WAIT).unwrap() {
        Delivery::Image(buffer) => {
            assert_eq!((buffer.width, buffer.height), (4, 2));
            assert_eq!(buffer.pixels.len(), 4 * 2 * 4);
        }
        other => panic!("unexpected delivery: {other:?}"),
    }

    router.shutdown().unwrap();
}

#[test]
fn failed_conversion_skips_only_that_destination() {
    init_tracing();
    let router = NotificationRouter::spawn();
    router.set_interest(Destination::Image, true);

    router.enqueue(QueueMessage::Image(vec![0x00, 0x01, 0x02]));
    router.enqueue(QueueMessage::Log(LogRecord::new(LogLevel::Warning, "after")));

    // The undecodable image produces nothing, and the worker keeps draining.
    let delivery = router.recv_delivery_timeout(WAIT).unwrap();
    assert_eq!(
        delivery,
        Delivery::Log(LogRecord::new(LogLevel::Warning, "after"))
    );
    assert!(router.recv_delivery_timeout(SETTLE).is_none());

    router.shutdown().unwrap();
}

#[test]
fn disabling_interest_suppresses_delivery() {
    init_tracing();
    let router = NotificationRouter::spawn();
    router.set_interest(Destination::Log, false);
    router.enqueue(QueueMessage::Log(LogRecord::new(LogLevel::Info, "quiet")));
    assert!(router.recv_delivery_timeout(SETTLE).is_none());

    // Re-enabling replays the record that arrived while disabled.
    router.set_interest(Destination::Log, true);
    assert_eq!(
        router.recv_delivery_timeout(WAIT).unwrap(),
        Delivery::Log(LogRecord::new(LogLevel::Info, "quiet"))
    );

    router.shutdown().unwrap();
}

#[test]
fn shutdown_completes_within_the_grace_window() {
    init_tracing();
    let router = NotificationRouter::spawn();
    router.enqueue(QueueMessage::Log(LogRecord::new(LogLevel::Info, "tail")));

    let start = Instant::now();
    router.shutdown().unwrap();
    assert!(start.elapsed() < POLL_INTERVAL * 3);
}
