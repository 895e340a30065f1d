//! Basic usage of LockfreeStrMap: term counters shared with reader threads.

use lockfree_strmap::{add, LockfreeStrMap};
use std::sync::Arc;
use std::thread;

fn main() {
    let counts: Arc<LockfreeStrMap<u64>> = Arc::new(LockfreeStrMap::new(256).unwrap());

    let text = "the quick brown fox jumps over the lazy dog the end";
    counts
        .set_many(text.split_whitespace().map(|w| (w, 1u64)), add)
        .unwrap();

    let reader = {
        let counts = Arc::clone(&counts);
        thread::spawn(move || counts.get("the"))
    };
    println!("the = {:?}", reader.join().unwrap());

    counts.set("fox", 10, add).unwrap();
    println!("fox = {:?}", counts.get("fox"));
    println!("cat = {:?}", counts.get("cat"));

    let mut terms: Vec<(String, u64)> = counts.iter().collect();
    terms.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    for (term, n) in terms.iter().take(3) {
        println!("{:>6} {}", term, n);
    }

    println!("{:?}", counts.stats());
}
