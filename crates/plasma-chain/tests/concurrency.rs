//! # Concurrency Tests
//!
//! Many threads racing on one engine. Exactly one spender of an output may
//! win, and readers never observe a half-applied mutation.

use std::sync::Arc;
use std::thread;

use plasma_chain::{ChainConfig, ChildChain, MemoryStore, Tx, TxIn, TxOut};
use plasma_core::{Address, PlasmaError, Position};
use plasma_crypto::Account;

fn chain() -> Arc<ChildChain> {
    Arc::new(ChildChain::open(Arc::new(MemoryStore::new()), ChainConfig::default()).unwrap())
}

#[test]
fn racing_spenders_one_winner() {
    let cc = chain();
    let op = Account::generate();
    let a = Account::generate();
    cc.add_deposit_block(a.address(), 100, &op).unwrap();

    let results: Vec<Result<Position, PlasmaError>> = thread::scope(|s| {
        let handles: Vec<_> = (0..16u64)
            .map(|i| {
                let cc = Arc::clone(&cc);
                let a = a.clone();
                s.spawn(move || {
                    let mut tx = Tx::new(
                        [TxIn::new(1, 0, 0), TxIn::null()],
                        [TxOut::new(Address([i as u8; 20]), 100 - i), TxOut::null()],
                    );
                    tx.sign(0, &a).unwrap();
                    cc.add_tx_to_mempool(tx)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, PlasmaError::TxOutAlreadySpent)));
    assert_eq!(cc.open_block_len(), 1);
}

#[test]
fn concurrent_deposits_get_distinct_blocks() {
    let cc = chain();
    let op = Account::generate();
    let owner = Address([1; 20]);

    let mut numbers: Vec<u64> = thread::scope(|s| {
        let handles: Vec<_> = (0..8u64)
            .map(|i| {
                let cc = Arc::clone(&cc);
                let op = op.clone();
                s.spawn(move || cc.add_deposit_block(owner, i + 1, &op).unwrap())
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    numbers.sort_unstable();
    assert_eq!(numbers, (1..=8).collect::<Vec<_>>());
    assert_eq!(cc.current_block_number(), 9);
}

#[test]
fn readers_see_whole_blocks() {
    let cc = chain();
    let op = Account::generate();
    let a = Account::generate();
    for _ in 0..20 {
        cc.add_deposit_block(a.address(), 1, &op).unwrap();
    }

    thread::scope(|s| {
        let writer = {
            let cc = Arc::clone(&cc);
            let a = a.clone();
            let op = op.clone();
            s.spawn(move || {
                for b in 1..=20u64 {
                    let mut tx = Tx::new(
                        [TxIn::new(b, 0, 0), TxIn::null()],
                        [TxOut::new(a.address(), 1), TxOut::null()],
                    );
                    tx.sign(0, &a).unwrap();
                    cc.add_tx_to_mempool(tx).unwrap();
                    cc.add_block(&op).unwrap();
                }
            })
        };
        for _ in 0..4 {
            let cc = Arc::clone(&cc);
            s.spawn(move || {
                for _ in 0..200 {
                    let n = cc.current_block_number();
                    for b in 21..n {
                        let block = cc.get_block(b).unwrap();
                        assert!(block.is_sealed());
                        assert_eq!(block.len(), 1);
                    }
                }
            });
        }
        writer.join().unwrap();
    });
    assert_eq!(cc.current_block_number(), 41);
}
