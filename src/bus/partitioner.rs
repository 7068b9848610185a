//! Deterministic partition assignment.

use rand::seq::SliceRandom;

/// Which partition policy a producer applies to its records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionMode {
    /// `(exchange, data-type)` selects a fixed partition from the
    /// region map.
    Pinned,
    /// Kafka-default murmur2 hash of the whole key (consolidated REST
    /// topic).
    Hashed,
}

/// Fixed partition for a known `(exchange, data-type)` pair.
///
/// Korea provisions 8 partitions, NE 5, Asia 7. Coinbase streams ticker
/// only, so no orderbook pin exists for it.
fn pinned_for(exchange: &str, data_type: &str) -> Option<i32> {
    let pair = match exchange {
        // Korea
        "upbit" => (0, 1),
        "bithumb" => (2, 3),
        "coinone" => (4, 5),
        "korbit" => (6, 7),
        // North-America/Europe
        "binance" => (0, 1),
        "kraken" => (2, 3),
        "coinbase" => (4, -1),
        // Asia
        "okx" => (1, 2),
        "bybit" => (3, 4),
        "gateio" => (5, 6),
        _ => return None,
    };
    match data_type {
        "ticker" => Some(pair.0),
        "orderbook" if pair.1 >= 0 => Some(pair.1),
        _ => None,
    }
}

/// Split `"<exchange>:<data-type>-<symbol>"` into its first two tokens,
/// lowercased. Stray JSON quoting on the key is tolerated.
fn parse_key(key: &str) -> Option<(String, String)> {
    let key = key.trim_matches('"');
    let (exchange, rest) = key.split_once(':')?;
    let (data_type, _symbol) = rest.split_once('-')?;
    Some((
        exchange.trim_matches('"').to_ascii_lowercase(),
        data_type.to_ascii_lowercase(),
    ))
}

fn random_partition(all: &[i32]) -> i32 {
    all.choose(&mut rand::thread_rng()).copied().unwrap_or(0)
}

/// Pinned-partition policy for streaming keys.
///
/// Unknown tags or malformed keys fall back to a uniformly random
/// member of `all`; a pinned partition that is currently unavailable
/// falls back to `available[0]`.
#[must_use]
pub fn pinned_partition(key: &str, all: &[i32], available: &[i32]) -> i32 {
    let Some((exchange, data_type)) = parse_key(key) else {
        return random_partition(all);
    };
    let Some(partition) = pinned_for(&exchange, &data_type) else {
        return random_partition(all);
    };

    if available.contains(&partition) {
        partition
    } else {
        available.first().copied().unwrap_or_else(|| random_partition(all))
    }
}

/// Kafka's default-partitioner hash: murmur2 with seed `0x9747b28c`,
/// masked to 31 bits, modulo the partition count.
#[must_use]
pub fn hashed_partition(key: &str, all: &[i32]) -> i32 {
    if all.is_empty() {
        return 0;
    }
    let hashed = murmur2(key.as_bytes()) & 0x7FFF_FFFF;
    all[(hashed as usize) % all.len()]
}

fn murmur2(data: &[u8]) -> u32 {
    const SEED: u32 = 0x9747_b28c;
    const M: u32 = 0x5bd1_e995;
    const R: u32 = 24;

    let mut h: u32 = SEED ^ data.len() as u32;

    let mut chunks = data.chunks_exact(4);
    for chunk in chunks.by_ref() {
        let mut k = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        k = k.wrapping_mul(M);
        k ^= k >> R;
        k = k.wrapping_mul(M);
        h = h.wrapping_mul(M);
        h ^= k;
    }

    let tail = chunks.remainder();
    if tail.len() >= 3 {
        h ^= u32::from(tail[2]) << 16;
    }
    if tail.len() >= 2 {
        h ^= u32::from(tail[1]) << 8;
    }
    if !tail.is_empty() {
        h ^= u32::from(tail[0]);
        h = h.wrapping_mul(M);
    }

    h ^= h >> 13;
    h = h.wrapping_mul(M);
    h ^= h >> 15;
    h
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partitions(n: i32) -> Vec<i32> {
        (0..n).collect()
    }

    #[test]
    fn korea_pins_are_stable() {
        let all = partitions(8);
        for _ in 0..10 {
            assert_eq!(pinned_partition("upbit:ticker-BTC", &all, &all), 0);
            assert_eq!(pinned_partition("upbit:orderbook-BTC", &all, &all), 1);
            assert_eq!(pinned_partition("bithumb:ticker-BTC", &all, &all), 2);
            assert_eq!(pinned_partition("coinone:orderbook-ETH", &all, &all), 5);
            assert_eq!(pinned_partition("korbit:orderbook-BTC", &all, &all), 7);
        }
    }

    #[test]
    fn ne_and_asia_pins_are_distinct_per_region() {
        let ne = partitions(5);
        assert_eq!(pinned_partition("binance:ticker-BTC", &ne, &ne), 0);
        assert_eq!(pinned_partition("kraken:orderbook-BTC", &ne, &ne), 3);
        assert_eq!(pinned_partition("coinbase:ticker-BTC", &ne, &ne), 4);

        let asia = partitions(7);
        assert_eq!(pinned_partition("okx:ticker-BTC", &asia, &asia), 1);
        assert_eq!(pinned_partition("bybit:orderbook-BTC", &asia, &asia), 4);
        assert_eq!(pinned_partition("gateio:ticker-BTC", &asia, &asia), 5);

        // Within a region no two (exchange, data-type) pairs collide.
        let keys = [
            "okx:ticker-X", "okx:orderbook-X", "bybit:ticker-X",
            "bybit:orderbook-X", "gateio:ticker-X", "gateio:orderbook-X",
        ];
        let mut seen: Vec<i32> = keys
            .iter()
            .map(|k| pinned_partition(k, &asia, &asia))
            .collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), keys.len());
    }

    #[test]
    fn matching_is_case_insensitive_on_exchange_and_data_type() {
        let all = partitions(8);
        assert_eq!(pinned_partition("UPBIT:Ticker-BTC", &all, &all), 0);
        assert_eq!(pinned_partition("\"coinone\":ORDERBOOK-btc", &all, &all), 5);
    }

    #[test]
    fn unavailable_pin_falls_back_to_first_available() {
        let all = partitions(8);
        let available = [0, 1, 2, 3];
        assert_eq!(pinned_partition("coinone:ticker-BTC", &all, &available), 0);
    }

    #[test]
    fn unknown_exchange_lands_inside_all() {
        let all = partitions(8);
        for _ in 0..20 {
            let p = pinned_partition("htx:ticker-BTC", &all, &all);
            assert!(all.contains(&p));
        }
    }

    #[test]
    fn malformed_key_lands_inside_all() {
        let all = partitions(5);
        for _ in 0..20 {
            assert!(all.contains(&pinned_partition("garbage", &all, &all)));
        }
    }

    #[test]
    fn coinbase_has_no_orderbook_pin() {
        let all = partitions(5);
        for _ in 0..20 {
            let p = pinned_partition("coinbase:orderbook-BTC", &all, &all);
            assert!(all.contains(&p));
        }
    }

    #[test]
    fn hashed_mode_is_deterministic_and_in_range() {
        let all = partitions(7);
        let first = hashed_partition("ne-Total", &all);
        for _ in 0..10 {
            assert_eq!(hashed_partition("ne-Total", &all), first);
        }
        assert!(all.contains(&first));
    }

    #[test]
    fn murmur2_spreads_nearby_keys() {
        let all = partitions(7);
        let assignments: Vec<i32> = ["korea-Total", "asia-Total", "ne-Total"]
            .iter()
            .map(|k| hashed_partition(k, &all))
            .collect();
        assert!(assignments.iter().all(|p| all.contains(p)));
        // Tail-byte handling: keys of every length mod 4 hash without panicking.
        for key in ["a", "ab", "abc", "abcd", "abcde"] {
            assert!(all.contains(&hashed_partition(key, &all)));
        }
    }
}
