use indicatif::{ProgressBar, ProgressStyle};
use interval_map::IntervalMap;
use rand::{thread_rng, Rng};

const NUM_OPS: u64 = 1000;
const ADDRESS_SPACE: u64 = 10_000;

/// The attribute attached to each range in this demo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CacheHint {
    Normal,
    NoReuse,
}

fn main() {
    let mut rng = thread_rng();
    let mut map = IntervalMap::new();

    let pb = ProgressBar::new(NUM_OPS);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}"),
    );
    pb.set_message("Applying random operations");

    for i in 0..NUM_OPS {
        let a = rng.gen_range(0..ADDRESS_SPACE);
        let b = rng.gen_range(0..ADDRESS_SPACE);
        let (start, end) = (a.min(b), a.max(b));
        let hint = if rng.gen::<bool>() {
            CacheHint::Normal
        } else {
            CacheHint::NoReuse
        };

        // Empty random ranges are simply rejected, like any other caller
        // error; the map is unaffected.
        let _ = if i % 2 == 0 {
            map.delete(start, end)
        } else {
            map.add(start, end, hint)
        };
        pb.inc(1);
    }
    pb.finish_and_clear();

    println!("tree dump ({} ranges):", map.len());
    for (interval, hint) in map.iter() {
        println!("  {} {:?}", interval, hint);
    }

    let probe = rng.gen_range(0..ADDRESS_SPACE);
    match map.lookup_point(probe) {
        Ok(hint) => println!("address {}: {:?}", probe, hint),
        Err(_) => println!("address {}: (none)", probe),
    }
}
