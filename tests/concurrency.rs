//! Concurrent picks, completions and picker swaps.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rpc_balancer::load_balancer::{Balancer, CallContext, PickerBuilder, Picker, WrrPickerBuilder};

mod common;

#[test]
fn test_exact_proportions_under_contention() {
    let picker = Arc::new(
        WrrPickerBuilder::default().build(vec![common::ready("A", 4, ""), common::ready("B", 2, "")]),
    );

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let picker = picker.clone();
            std::thread::spawn(move || {
                let mut counts: HashMap<String, usize> = HashMap::new();
                for _ in 0..1000 {
                    let result = picker.pick(&CallContext::new()).unwrap();
                    *counts.entry(result.conn).or_default() += 1;
                    result.done.record(false, Duration::from_micros(500));
                }
                counts
            })
        })
        .collect();

    let mut total: HashMap<String, usize> = HashMap::new();
    for h in handles {
        for (addr, n) in h.join().unwrap() {
            *total.entry(addr).or_default() += n;
        }
    }

    // 6000 picks is exactly 1000 periods of 6.
    assert_eq!(total["A"], 4000);
    assert_eq!(total["B"], 2000);

    let stats = picker.stats();
    assert_eq!(stats.iter().map(|s| s.requests).sum::<i64>(), 6000);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_swap_while_picking() {
    let balancer: Arc<Balancer<String>> = Arc::new(Balancer::new(WrrPickerBuilder::default()));
    balancer.update(vec![common::ready("old", 1, "")]);

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let balancer = balancer.clone();
        tasks.push(tokio::spawn(async move {
            let mut picked = Vec::new();
            for _ in 0..200 {
                let result = balancer.pick(&CallContext::new()).expect("ready set is never empty");
                picked.push(result.conn.clone());
                tokio::task::yield_now().await;
                result.done.record(false, Duration::from_millis(1));
            }
            picked
        }));
    }

    tokio::time::sleep(Duration::from_millis(5)).await;
    balancer.update(vec![common::ready("new", 1, "")]);

    for task in tasks {
        let picked = task.await.unwrap();
        assert!(picked.iter().all(|a| a == "old" || a == "new"));
    }
    assert_eq!(balancer.pick(&CallContext::new()).unwrap().conn, "new");
}
