//! Partitioning stability across regions.

use marketgate::bus::{hashed_partition, pinned_partition};
use marketgate::domain::Region;

fn all(region: Region) -> Vec<i32> {
    (0..region.partition_count() as i32).collect()
}

#[test]
fn known_keys_always_land_on_their_pin() {
    let korea = all(Region::Korea);
    for _ in 0..100 {
        assert_eq!(pinned_partition("upbit:ticker-BTC", &korea, &korea), 0);
        assert_eq!(pinned_partition("korbit:orderbook-ETH", &korea, &korea), 7);
    }

    let ne = all(Region::Ne);
    for _ in 0..100 {
        assert_eq!(pinned_partition("kraken:orderbook-BTC", &ne, &ne), 3);
        assert_eq!(pinned_partition("coinbase:ticker-BTC", &ne, &ne), 4);
    }
}

#[test]
fn exchange_data_type_pairs_are_disjoint_within_a_region() {
    let korea = all(Region::Korea);
    let keys = [
        "upbit:ticker-BTC",
        "upbit:orderbook-BTC",
        "bithumb:ticker-BTC",
        "bithumb:orderbook-BTC",
        "coinone:ticker-BTC",
        "coinone:orderbook-BTC",
        "korbit:ticker-BTC",
        "korbit:orderbook-BTC",
    ];
    let mut partitions: Vec<i32> = keys
        .iter()
        .map(|key| pinned_partition(key, &korea, &korea))
        .collect();
    partitions.sort_unstable();
    partitions.dedup();
    assert_eq!(partitions.len(), keys.len());
}

/// Requesting coinone's pin while partitions 4..7 are offline falls
/// back to the first available partition.
#[test]
fn unavailable_pin_falls_back_to_first_available() {
    let korea = all(Region::Korea);
    let available = [0, 1, 2, 3];
    assert_eq!(
        pinned_partition("coinone:ticker-BTC", &korea, &available),
        0
    );
}

#[test]
fn hashed_mode_is_stable_for_the_total_keys() {
    for region in Region::ALL {
        let partitions = all(region);
        let key = region.rest_key();
        let first = hashed_partition(&key, &partitions);
        for _ in 0..100 {
            assert_eq!(hashed_partition(&key, &partitions), first);
        }
        assert!(partitions.contains(&first));
    }
}
