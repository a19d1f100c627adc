//! End-to-end picker behaviour: color steering, fallback, default color,
//! completion accounting and rebuilds.

use std::time::Duration;

use rpc_balancer::load_balancer::{
    CallContext, CallError, Code, DefaultColor, DoneInfo, PickError, Picker, PickerBuilder,
    WrrPicker, WrrPickerBuilder,
};

mod common;

fn pick_n(picker: &WrrPicker<String>, ctx: &CallContext, n: usize) -> Vec<String> {
    (0..n)
        .map(|i| {
            picker
                .pick(ctx)
                .unwrap_or_else(|e| panic!("pick {} failed: {}", i, e))
                .conn
        })
        .collect()
}

#[test]
fn test_color_steering() {
    let picker = WrrPickerBuilder::default().build(common::colored_set());

    // No color: only the uncolored backend.
    assert_eq!(pick_n(&picker, &CallContext::new(), 3), vec!["test1"; 3]);

    // Red: 4:2 split, interleaved.
    let red = CallContext::with_color("red");
    assert_eq!(
        pick_n(&picker, &red, 6),
        vec!["test2", "test3", "test2", "test2", "test3", "test2"]
    );

    // Unknown color falls back to the default group.
    assert_eq!(
        pick_n(&picker, &CallContext::with_color("black"), 4),
        vec!["test1"; 4]
    );

    assert_eq!(
        pick_n(&picker, &CallContext::with_color("purple"), 2),
        vec!["test4"; 2]
    );
}

#[test]
fn test_default_color_matches_explicit_tag() {
    let default_color = DefaultColor::default();
    let builder = WrrPickerBuilder::default().with_default_color(default_color.clone());

    let explicit = builder.build(common::colored_set());
    let expected = pick_n(&explicit, &CallContext::with_color("red"), 6);

    let implicit = builder.build(common::colored_set());
    default_color.set("red");
    assert_eq!(pick_n(&implicit, &CallContext::new(), 6), expected);
}

#[test]
fn test_fallback_to_empty_default_group_fails() {
    let picker = WrrPickerBuilder::default().build(vec![common::ready("r1", 1, "red")]);
    let err = picker.pick(&CallContext::new()).unwrap_err();
    assert!(matches!(err, PickError::NoAvailableBackend { ref color } if color.is_empty()));
}

#[test]
fn test_done_classifies_errors() {
    let picker = WrrPickerBuilder::default().build(vec![common::ready("test1", 8, "")]);

    let first = picker.pick(&CallContext::new()).unwrap();
    std::thread::sleep(Duration::from_millis(100));
    first
        .done
        .done(DoneInfo::failed(CallError::new(Code::Unknown, "test")));

    let backend = &picker.group("").unwrap().members()[0];
    assert_eq!(backend.error_summary(), (0, 1));
    let (latency, count) = backend.latency_summary();
    assert_eq!(count, 1);
    // 100ms is 1000 ticks; allow generous scheduling slack.
    assert!((1000.0..1500.0).contains(&latency), "latency {latency}");

    let second = picker.pick(&CallContext::new()).unwrap();
    second
        .done
        .done(DoneInfo::failed(CallError::new(Code::Aborted, "test")));
    assert_eq!(backend.error_summary(), (1, 2));
}

#[test]
fn test_rebuild_resets_sequence_and_stats() {
    let builder = WrrPickerBuilder::default();
    let set = || vec![common::ready("A", 4, ""), common::ready("B", 2, "")];

    let old = builder.build(set());
    let ctx = CallContext::new();
    for _ in 0..3 {
        old.pick(&ctx).unwrap().done.record(true, Duration::from_millis(1));
    }

    let new = builder.build(set());
    assert_eq!(pick_n(&new, &ctx, 6), vec!["A", "B", "A", "A", "B", "A"]);
    assert!(new.stats().iter().all(|s| s.errors == 0));
}

#[test]
fn test_stats_report_window_summaries() {
    let picker = WrrPickerBuilder::default().build(common::colored_set());
    let red = CallContext::with_color("red");
    for i in 0..6 {
        let result = picker.pick(&red).unwrap();
        result.done.record(i % 3 == 0, Duration::from_millis(2));
    }

    let stats = picker.stats();
    let test2 = stats.iter().find(|s| s.address == "test2").unwrap();
    let test3 = stats.iter().find(|s| s.address == "test3").unwrap();
    assert_eq!((test2.picks, test3.picks), (4, 2));
    assert_eq!(test2.requests + test3.requests, 6);
    assert_eq!(test2.errors + test3.errors, 2);
    assert_eq!(test2.mean_latency_ms, 2.0);
}
