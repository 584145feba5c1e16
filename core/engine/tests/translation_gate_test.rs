//! 翻译闸门时序测试（使用暂停的 tokio 时钟）

use std::time::Duration;

use interp_engine::text_segmentation::PunctuationSet;
use interp_engine::translation_gate::{
    GateConfig, GateDecision, GatedText, SuppressReason, TranslationGate,
};
use interp_engine::types::TranscriptEvent;

fn event(text: &str, is_final: bool) -> TranscriptEvent {
    TranscriptEvent {
        text: text.to_string(),
        is_final,
        timestamp_ms: 0,
    }
}

fn gate() -> (TranslationGate, tokio::sync::mpsc::UnboundedReceiver<GatedText>) {
    TranslationGate::new(GateConfig {
        debounce_ms: 300,
        min_chars: 20,
        punctuation: PunctuationSet::default(),
    })
}

#[tokio::test(start_paused = true)]
async fn test_interims_within_interval_fire_once_with_latest_text() {
    let (gate, mut rx) = gate();

    assert_eq!(gate.submit(&event("你好，", false)), GateDecision::Debounce);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(gate.submit(&event("你好，世界，", false)), GateDecision::Debounce);
    assert!(gate.has_pending());

    tokio::time::sleep(Duration::from_millis(400)).await;

    let fired = rx.try_recv().expect("debounced call should fire");
    assert_eq!(fired.text, "你好，世界，");
    assert!(!fired.is_final);
    assert!(rx.try_recv().is_err());
    assert!(!gate.has_pending());
    println!("✅ only the second interim was translated");
}

#[tokio::test(start_paused = true)]
async fn test_nothing_fires_before_interval_elapses() {
    let (gate, mut rx) = gate();

    gate.submit(&event("Hello, world", false));
    tokio::time::sleep(Duration::from_millis(299)).await;
    assert!(rx.try_recv().is_err());

    tokio::time::sleep(Duration::from_millis(2)).await;
    assert_eq!(rx.try_recv().map(|g| g.text).ok().as_deref(), Some("Hello, world"));
}

#[tokio::test(start_paused = true)]
async fn test_unchanged_interim_translated_at_most_once() {
    let (gate, mut rx) = gate();

    for _ in 0..3 {
        gate.submit(&event("今日天氣好好，", false));
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert!(rx.try_recv().is_ok());
    assert!(rx.try_recv().is_err());

    assert_eq!(
        gate.submit(&event("今日天氣好好，", false)),
        GateDecision::Suppress(SuppressReason::Duplicate)
    );
}

#[tokio::test(start_paused = true)]
async fn test_identical_finals_translated_once() {
    let (gate, mut rx) = gate();

    assert_eq!(gate.submit(&event("明天去學校", true)), GateDecision::Dispatch);
    assert_eq!(
        gate.submit(&event(" 明天去學校 ", true)),
        GateDecision::Suppress(SuppressReason::Duplicate)
    );

    let first = rx.try_recv().unwrap();
    assert!(first.is_final);
    assert_eq!(first.text, "明天去學校");
    assert!(rx.try_recv().is_err());
    assert_eq!(gate.last_translated().as_deref(), Some("明天去學校"));
}

#[tokio::test(start_paused = true)]
async fn test_final_supersedes_pending_interim() {
    let (gate, mut rx) = gate();

    gate.submit(&event("Hello,", false));
    gate.submit(&event("Hello, how are you?", true));

    let dispatched = rx.try_recv().unwrap();
    assert_eq!(dispatched.text, "Hello, how are you?");
    assert!(!gate.has_pending());

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_short_interim_without_punctuation_is_ignored() {
    let (gate, mut rx) = gate();

    assert_eq!(
        gate.submit(&event("hello", false)),
        GateDecision::Suppress(SuppressReason::NotQualifying)
    );
    assert_eq!(gate.submit(&event("", true)), GateDecision::Suppress(SuppressReason::Empty));
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_cancel_prevents_scheduled_call() {
    let (gate, mut rx) = gate();

    gate.submit(&event("Hello, world", false));
    assert!(gate.has_pending());
    gate.cancel();
    assert!(gate.is_closed());

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(rx.try_recv().is_err());
    assert_eq!(
        gate.submit(&event("Another sentence.", true)),
        GateDecision::Suppress(SuppressReason::Closed)
    );
    println!("✅ cancelled gate never fires");
}

#[tokio::test(start_paused = true)]
async fn test_reset_allows_same_text_again() {
    let (gate, mut rx) = gate();

    gate.submit(&event("おはよう", true));
    gate.reset();
    assert_eq!(gate.submit(&event("おはよう", true)), GateDecision::Dispatch);
    assert_eq!(rx.try_recv().unwrap().text, "おはよう");
    assert_eq!(rx.try_recv().unwrap().text, "おはよう");
}
