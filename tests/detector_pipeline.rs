//! Integration tests for the detection pipeline.
//!
//! Frames go through the real line framing, resolver and dispatcher on the
//! worker thread; the recording sink shows what would have been injected.

use std::io::Cursor;
use std::sync::mpsc as std_mpsc;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use irplus::detector::{Detector, StopToken};
use irplus::device::{RecordingSink, SinkEvent};
use irplus::dispatch::Dispatcher;
use irplus::notify::LogNotifier;
use irplus::serial::{LineReader, SignalSource, SourceError};
use irplus_engine::{
    ActionId, ActionResolver, Bindings, Direction, KeySymbol, NamedKey, RampConfig, Signal, Timing,
};

/// Source fed from a channel; times out like a serial read
struct ChannelSource {
    rx: std_mpsc::Receiver<&'static str>,
    timeout: Duration,
}

impl SignalSource for ChannelSource {
    fn next_frame(&mut self) -> Result<Option<Vec<u8>>, SourceError> {
        match self.rx.recv_timeout(self.timeout) {
            Ok(line) => Ok(Some(line.as_bytes().to_vec())),
            Err(std_mpsc::RecvTimeoutError::Timeout) => Ok(None),
            Err(std_mpsc::RecvTimeoutError::Disconnected) => Err(SourceError::Closed),
        }
    }
}

fn sig(code: &str) -> Signal {
    Signal::new(code).unwrap()
}

fn bindings(pairs: &[(&str, &[ActionId])]) -> Bindings {
    let mut b = Bindings::new();
    for (code, actions) in pairs {
        b.insert(sig(code), actions.to_vec()).unwrap();
    }
    b
}

fn parts(b: Bindings) -> (ActionResolver, Dispatcher<RecordingSink>) {
    let resolver = ActionResolver::new(b, Timing::default(), RampConfig::default());
    let notifier = Arc::new(LogNotifier::new(StopToken::new()));
    (resolver, Dispatcher::new(RecordingSink::new(), notifier))
}

fn wait_until_finished(detector: &Detector<RecordingSink>) {
    let begin = Instant::now();
    while detector.is_running() {
        assert!(begin.elapsed() < Duration::from_secs(5), "worker never finished");
        thread::sleep(Duration::from_millis(5));
    }
}

fn tap(symbol: KeySymbol) -> [SinkEvent; 2] {
    [SinkEvent::Press(symbol), SinkEvent::Release(symbol)]
}

// ── Serial bytes → injected input ──

#[test]
fn pipeline_serial_lines_drive_sink() {
    let b = bindings(&[
        ("FF38C7", &[ActionId::Enter]),
        ("FF10EF", &[ActionId::MoveMouse(Direction::Left)]),
    ]);
    let (resolver, dispatcher) = parts(b);
    let source = LineReader::new(Cursor::new(b"FF38C7\r\nFF10EF\r\nFF10EF\r\n".to_vec()));

    let mut detector = Detector::new(Duration::from_millis(10));
    detector.set_actions_enabled(true);
    assert!(detector.start(source, resolver, dispatcher).unwrap());
    wait_until_finished(&detector);

    // EOF ends the session; the dispatcher comes back on reap
    let dispatcher = detector.reap().expect("finished worker");
    let mut expected = tap(KeySymbol::Named(NamedKey::Enter)).to_vec();
    expected.push(SinkEvent::Move(-5, 0));
    expected.push(SinkEvent::Move(-8, 0));
    assert_eq!(dispatcher.sink().events, expected);
    assert_eq!(detector.last_seen(), Some(sig("FF10EF")));
}

#[test]
fn pipeline_disabled_actions_only_record_signal() {
    let b = bindings(&[("FF38C7", &[ActionId::Enter])]);
    let (resolver, dispatcher) = parts(b);
    let source = LineReader::new(Cursor::new(b"FF38C7\n".to_vec()));

    let mut detector = Detector::new(Duration::from_millis(10));
    detector.start(source, resolver, dispatcher).unwrap();
    wait_until_finished(&detector);

    let dispatcher = detector.reap().expect("finished worker");
    assert!(dispatcher.sink().events.is_empty());
    assert_eq!(detector.last_seen(), Some(sig("FF38C7")));
}

#[test]
fn pipeline_noise_frames_are_skipped() {
    let b = bindings(&[("FF38C7", &[ActionId::Escape])]);
    let (resolver, dispatcher) = parts(b);
    let mut bytes = b"\r\n".to_vec();
    bytes.extend_from_slice(&[0xC3, 0x28, b'\n']);
    bytes.extend_from_slice(b"FF38C7\n");
    let source = LineReader::new(Cursor::new(bytes));

    let mut detector = Detector::new(Duration::from_millis(10));
    detector.set_actions_enabled(true);
    detector.start(source, resolver, dispatcher).unwrap();
    wait_until_finished(&detector);

    let dispatcher = detector.reap().expect("finished worker");
    assert_eq!(
        dispatcher.sink().events,
        tap(KeySymbol::Named(NamedKey::Escape)).to_vec()
    );
}

// ── Binding updates while running ──

#[test]
fn binding_update_reaches_running_worker() {
    let (tx, rx) = std_mpsc::channel();
    let source = ChannelSource {
        rx,
        timeout: Duration::from_millis(10),
    };
    let (resolver, dispatcher) = parts(Bindings::new());

    let mut detector = Detector::new(Duration::from_millis(10));
    detector.set_actions_enabled(true);
    detector.start(source, resolver, dispatcher).unwrap();

    // Unbound: nothing happens, but the signal is seen
    tx.send("FF6897").unwrap();
    thread::sleep(Duration::from_millis(50));
    assert_eq!(detector.last_seen(), Some(sig("FF6897")));

    detector.update_bindings(bindings(&[("FF6897", &[ActionId::Space])]));
    // Give the worker a few read timeouts to drain the update
    thread::sleep(Duration::from_millis(50));
    tx.send("FF6897").unwrap();
    thread::sleep(Duration::from_millis(50));

    let dispatcher = detector.stop().expect("running worker");
    assert_eq!(
        dispatcher.sink().events,
        tap(KeySymbol::Named(NamedKey::Space)).to_vec()
    );
}

// ── Lifecycle ──

#[test]
fn restart_after_stop() {
    let (_tx, rx) = std_mpsc::channel::<&'static str>();
    let source = ChannelSource {
        rx,
        timeout: Duration::from_millis(10),
    };
    let (resolver, dispatcher) = parts(Bindings::new());
    let mut detector = Detector::new(Duration::from_millis(10));

    assert!(detector.start(source, resolver, dispatcher).unwrap());
    let dispatcher = detector.stop().expect("running worker");
    assert!(detector.stop().is_none());

    let (_tx2, rx2) = std_mpsc::channel::<&'static str>();
    let source = ChannelSource {
        rx: rx2,
        timeout: Duration::from_millis(10),
    };
    let (resolver, _) = parts(Bindings::new());
    assert!(detector.start(source, resolver, dispatcher).unwrap());
    assert!(detector.is_running());
    assert!(detector.stop().is_some());
}
