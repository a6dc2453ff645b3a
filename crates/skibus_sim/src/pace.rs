//! Random pauses for walking and driving.

use std::time::Duration;

use rand::Rng;
use rand_chacha::ChaCha8Rng;

/// Sleeps a uniform random interval in `[0, max_us]` microseconds.
///
/// A zero draw or a zero limit only yields, so a bus with no drive time
/// still lets the skiers reach the board lock. The runtime timer rounds
/// other draws up to whole milliseconds.
pub(crate) async fn pause(rng: &mut ChaCha8Rng, max_us: u32) {
    let us = if max_us == 0 { 0 } else { rng.gen_range(0..=max_us) };
    if us == 0 {
        tokio::task::yield_now().await;
    } else {
        tokio::time::sleep(Duration::from_micros(u64::from(us))).await;
    }
}

/// Stream of randomness for one participant of a seeded run.
///
/// Stream 0 is the bus, stream `id` is skier `id`.
pub(crate) fn stream(seed: u64, stream: u64) -> ChaCha8Rng {
    use rand::SeedableRng;

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(stream);
    rng
}
