//! # Position Packing Properties
//!
//! The root-chain verifier decodes positions with integer div/mod. These
//! properties pin the packing so both sides agree for every in-range triple.

use plasma_core::position::{BLOCK_OFFSET, MAX_INDEX, MAX_TX_PER_BLOCK, TX_OFFSET};
use plasma_core::Position;
use proptest::prelude::*;

proptest! {
    #[test]
    fn utxo_roundtrip(
        b in 0u64..(u64::MAX / BLOCK_OFFSET),
        t in 0u64..MAX_TX_PER_BLOCK,
        i in 0u64..MAX_INDEX,
    ) {
        let p = Position::utxo(b, t, i).unwrap();
        prop_assert_eq!(p.decode_utxo(), (b, t, i));
    }

    #[test]
    fn matches_div_mod_reference(
        b in 1u64..1_000_000,
        t in 0u64..MAX_TX_PER_BLOCK,
        i in 0u64..MAX_INDEX,
    ) {
        let v = Position::input(b, t, i).unwrap().as_u64();
        prop_assert_eq!(v / BLOCK_OFFSET, b);
        prop_assert_eq!((v % BLOCK_OFFSET) / TX_OFFSET, t);
        prop_assert_eq!(v % TX_OFFSET, i);
    }

    #[test]
    fn distinct_triples_distinct_positions(
        b in 1u64..1000, t in 0u64..1000, i in 0u64..4,
        b2 in 1u64..1000, t2 in 0u64..1000, i2 in 0u64..4,
    ) {
        prop_assume!((b, t, i) != (b2, t2, i2));
        prop_assert_ne!(
            Position::utxo(b, t, i).unwrap(),
            Position::utxo(b2, t2, i2).unwrap()
        );
    }
}

#[test]
fn largest_block_number_that_fits() {
    let max_b = (u64::MAX - (MAX_TX_PER_BLOCK - 1) * TX_OFFSET - (MAX_INDEX - 1)) / BLOCK_OFFSET;
    let p = Position::utxo(max_b, MAX_TX_PER_BLOCK - 1, MAX_INDEX - 1).unwrap();
    assert_eq!(p.decode_utxo(), (max_b, MAX_TX_PER_BLOCK - 1, MAX_INDEX - 1));
    assert!(Position::utxo(max_b + 1, MAX_TX_PER_BLOCK - 1, MAX_INDEX - 1).is_err());
}
