#![allow(missing_docs)]

use std::ops::Bound;

use ttree::{
    ByKey, IndexRoot, Insertion, MemoryNodeStore, ObjectId, Persistent, Result, SortedIndex,
    TtreeError, TtreeOptions,
};

#[derive(Clone, Debug, PartialEq)]
struct Account {
    id: u64,
    balance: i64,
}

impl Persistent for Account {
    fn oid(&self) -> ObjectId {
        ObjectId(self.id)
    }
}

fn by_balance(account: &Account) -> i64 {
    account.balance
}

type BalanceIndex = SortedIndex<Account, ByKey<fn(&Account) -> i64>>;

fn balance_index(max_items: usize) -> Result<BalanceIndex> {
    SortedIndex::new(
        ByKey(by_balance as fn(&Account) -> i64),
        TtreeOptions::with_max_items(max_items),
    )
}

fn accounts(balances: &[i64]) -> Vec<Account> {
    balances
        .iter()
        .enumerate()
        .map(|(i, &balance)| Account {
            id: i as u64 + 1,
            balance,
        })
        .collect()
}

fn balances(members: &[Account]) -> Vec<i64> {
    members.iter().map(|a| a.balance).collect()
}

#[test]
fn index_orders_members_and_tracks_len() -> Result<()> {
    let mut store = MemoryNodeStore::new();
    let mut index = balance_index(3)?;
    assert!(index.is_empty());

    let all = accounts(&[5, 3, 8, 1, 4, 7, 9, 2, 6]);
    assert!(index.add_all(&mut store, all.clone())?);
    assert_eq!(index.len(), 9);
    assert_eq!(balances(&index.to_vec(&mut store)?), (1..=9).collect::<Vec<_>>());
    assert!(index.verify(&mut store)?.success);

    assert!(index.remove(&mut store, &all[0])?);
    assert!(!index.remove(&mut store, &all[0])?);
    assert_eq!(index.len(), 8);
    let hits = index.range(&mut store, Bound::Included(&3), Bound::Included(&7))?;
    assert_eq!(balances(&hits), vec![3, 4, 6, 7]);
    Ok(())
}

#[test]
fn unique_index_rejects_equal_keys() -> Result<()> {
    let mut store = MemoryNodeStore::new();
    let mut index = balance_index(4)?.unique(true);
    let all = accounts(&[10, 20, 30]);
    index.add_all(&mut store, all)?;

    let twin = Account { id: 99, balance: 20 };
    assert!(!index.add(&mut store, twin.clone())?);
    assert_eq!(index.len(), 3);
    assert_eq!(index.insert(&mut store, twin, false)?, Insertion::Inserted);
    assert_eq!(index.len(), 4);
    Ok(())
}

#[test]
fn exact_lookup_detects_ambiguity() -> Result<()> {
    let mut store = MemoryNodeStore::new();
    let mut index = balance_index(4)?;
    index.add_all(&mut store, accounts(&[1, 2, 2, 3]))?;

    assert_eq!(index.get(&mut store, &1)?.map(|a| a.id), Some(1));
    assert_eq!(index.get(&mut store, &4)?, None);
    assert!(matches!(index.get(&mut store, &2), Err(TtreeError::NotUnique)));
    Ok(())
}

#[test]
fn set_helpers_work_on_object_identity() -> Result<()> {
    let mut store = MemoryNodeStore::new();
    let mut index = balance_index(4)?;
    let all = accounts(&[4, 4, 4, 1, 9]);
    index.add_all(&mut store, all.clone())?;
    assert!(index.contains_all(&mut store, &all)?);

    let lookalike = Account { id: 500, balance: 4 };
    assert!(!index.contains(&mut store, &lookalike)?);
    assert!(!index.contains_all(&mut store, [&all[0], &lookalike])?);

    assert!(index.remove_all(&mut store, &all[..2])?);
    assert!(!index.remove_all(&mut store, &all[..2])?);
    assert!(index.contains(&mut store, &all[2])?);
    assert_eq!(balances(&index.to_vec(&mut store)?), vec![1, 4, 9]);
    assert!(index.verify(&mut store)?.success);
    Ok(())
}

#[test]
fn destroy_releases_pages_and_empties_index() -> Result<()> {
    let mut store = MemoryNodeStore::new();
    let mut index = balance_index(4)?;
    index.add_all(&mut store, accounts(&(0..200).collect::<Vec<_>>()))?;
    assert!(store.live_nodes() > 1);

    index.destroy(&mut store)?;
    assert!(index.is_empty());
    assert_eq!(index.len(), 0);
    assert!(index.root().is_none());
    assert_eq!(store.live_nodes(), 0);
    assert!(index.to_vec(&mut store)?.is_empty());
    Ok(())
}

#[test]
fn reopened_index_sees_persisted_pages() -> Result<()> {
    let mut store = MemoryNodeStore::new();
    let handle = {
        let mut index = balance_index(5)?;
        index.add_all(&mut store, accounts(&(0..64).rev().collect::<Vec<_>>()))?;
        index.handle()
    };
    store.evict_all()?;
    assert_eq!(store.resident_len(), 0);

    let index: BalanceIndex = SortedIndex::open(
        ByKey(by_balance as fn(&Account) -> i64),
        TtreeOptions::with_max_items(5),
        handle,
    )?;
    assert_eq!(index.len(), 64);
    assert_eq!(balances(&index.to_vec(&mut store)?), (0..64).collect::<Vec<_>>());
    assert!(store.stats().loads > 0);

    let stale = IndexRoot { root: None, len: 3 };
    let reopened: Result<BalanceIndex> = SortedIndex::open(
        ByKey(by_balance as fn(&Account) -> i64),
        TtreeOptions::default(),
        stale,
    );
    assert!(matches!(reopened, Err(TtreeError::Invalid(_))));
    Ok(())
}

#[test]
fn verify_flags_a_stale_member_count() -> Result<()> {
    let mut store = MemoryNodeStore::new();
    let mut index = balance_index(4)?;
    index.add_all(&mut store, accounts(&[1, 2, 3]))?;
    let handle = IndexRoot {
        len: 7,
        ..index.handle()
    };
    let reopened: BalanceIndex = SortedIndex::open(
        ByKey(by_balance as fn(&Account) -> i64),
        TtreeOptions::with_max_items(4),
        handle,
    )?;
    let report = reopened.verify(&mut store)?;
    assert!(!report.success);
    assert_eq!(report.counts.members, 3);
    assert_eq!(report.findings.len(), 1);
    assert_eq!(report.findings[0].node, None);
    assert!(report.to_json()?.contains("\"node\": null"));
    Ok(())
}

#[test]
fn handle_round_trips_through_json() -> Result<()> {
    let mut store = MemoryNodeStore::new();
    let mut index = balance_index(4)?;
    index.add_all(&mut store, accounts(&(0..32).collect::<Vec<_>>()))?;

    let encoded = serde_json::to_string(&index.handle())
        .map_err(|err| TtreeError::Config(err.to_string()))?;
    let decoded: IndexRoot =
        serde_json::from_str(&encoded).map_err(|err| TtreeError::Config(err.to_string()))?;
    assert_eq!(decoded, index.handle());

    let reopened: BalanceIndex = SortedIndex::open(
        ByKey(by_balance as fn(&Account) -> i64),
        TtreeOptions::with_max_items(4),
        decoded,
    )?;
    assert_eq!(reopened.to_vec(&mut store)?.len(), 32);

    let empty: IndexRoot = serde_json::from_str(r#"{"root":null,"len":0}"#)
        .map_err(|err| TtreeError::Config(err.to_string()))?;
    assert_eq!(empty, IndexRoot { root: None, len: 0 });
    Ok(())
}

#[test]
fn stats_count_index_activity() -> Result<()> {
    let mut store = MemoryNodeStore::new();
    let mut index = balance_index(2)?;
    index.add_all(&mut store, accounts(&(0..100).collect::<Vec<_>>()))?;
    index.range(&mut store, Bound::Unbounded, Bound::Unbounded)?;

    let stats = index.stats().snapshot();
    assert!(stats.nodes_allocated >= 50);
    assert!(stats.single_rotations + stats.double_rotations > 0);
    assert_eq!(stats.searches, 1);
    index.stats().emit_tracing();
    Ok(())
}
