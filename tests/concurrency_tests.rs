//! Invariants under concurrent access.
//!
//! The system is synchronous; shared use goes through a `Mutex`. These
//! tests check that the redemption invariants hold when many threads race
//! on the same code: at most `max_uses` pairings minted, at most one
//! active pairing per user pair.

use std::sync::{Arc, Mutex};
use std::thread;

use pairlink::{BackendConfig, CodeRequest, NewUser, PairingStatus, PairingSystem, RedeemError};

fn shared_system(redeemers: usize) -> (Arc<Mutex<PairingSystem>>, Vec<String>) {
    let mut system = PairingSystem::open(&BackendConfig::in_memory()).unwrap();
    system
        .register_user(NewUser::new("owner_aa", "Owner").with_interests(["chess"]))
        .unwrap();
    let redeemer_ids: Vec<String> = (0..redeemers).map(|i| format!("redeemer_{i:02}")).collect();
    for id in &redeemer_ids {
        system
            .register_user(NewUser::new(id.clone(), "Redeemer").with_interests(["chess"]))
            .unwrap();
    }
    (Arc::new(Mutex::new(system)), redeemer_ids)
}

#[test]
fn racing_redeemers_never_exceed_max_uses() {
    let (system, redeemer_ids) = shared_system(10);
    let code = system
        .lock()
        .unwrap()
        .generate_pairing_code(CodeRequest::new("owner_aa").with_max_uses(3))
        .unwrap();

    let handles: Vec<_> = redeemer_ids
        .iter()
        .map(|redeemer| {
            let system = Arc::clone(&system);
            let code = code.code.clone();
            let redeemer = redeemer.clone();
            thread::spawn(move || system.lock().unwrap().use_code(&code, &redeemer))
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let minted = results.iter().filter(|r| r.is_ok()).count();
    let refused = results
        .iter()
        .filter(|r| matches!(r, Err(RedeemError::CodeNotUsable)))
        .count();

    assert_eq!(minted, 3, "exactly max_uses redemptions succeed");
    assert_eq!(refused, 7, "the rest are refused as not usable");

    let system = system.lock().unwrap();
    assert_eq!(system.get_pairing_code(&code.code).unwrap().uses_count, 3);
    assert_eq!(
        system
            .get_user_pairings("owner_aa", Some(PairingStatus::Active))
            .len(),
        3
    );
}

#[test]
fn racing_redemptions_of_same_pair_mint_one_pairing() {
    let (system, _) = shared_system(1);
    // Many multi-use codes, one redeemer: only the first redemption may
    // land, every later one must see the existing active pairing.
    let codes: Vec<String> = (0..8)
        .map(|_| {
            system
                .lock()
                .unwrap()
                .generate_pairing_code(CodeRequest::new("owner_aa").with_max_uses(5))
                .unwrap()
                .code
        })
        .collect();

    let handles: Vec<_> = codes
        .iter()
        .map(|code| {
            let system = Arc::clone(&system);
            let code = code.clone();
            thread::spawn(move || system.lock().unwrap().use_code(&code, "redeemer_00"))
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let minted = results.iter().filter(|r| r.is_ok()).count();
    let already = results
        .iter()
        .filter(|r| matches!(r, Err(RedeemError::AlreadyPaired)))
        .count();

    assert_eq!(minted, 1, "one active pairing per user pair");
    assert_eq!(already, 7);

    let system = system.lock().unwrap();
    assert_eq!(
        system
            .get_user_pairings("redeemer_00", Some(PairingStatus::Active))
            .len(),
        1
    );
}

#[test]
fn concurrent_reads_share_the_lock_cleanly() {
    let (system, redeemer_ids) = shared_system(4);
    let code = system
        .lock()
        .unwrap()
        .generate_pairing_code(CodeRequest::new("owner_aa").with_max_uses(4))
        .unwrap();
    for id in &redeemer_ids {
        system.lock().unwrap().use_code(&code.code, id).unwrap();
    }

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let system = Arc::clone(&system);
            thread::spawn(move || {
                let system = system.lock().unwrap();
                let stats = system.user_stats("owner_aa").unwrap();
                (stats.total_pairings, stats.active_pairings)
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), (4, 4));
    }
}
