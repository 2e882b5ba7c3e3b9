#![allow(missing_docs)]

use std::ops::Bound;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use ttree::{
    ByKey, MemoryNodeStore, MemoryStoreOptions, ObjectId, Persistent, Result, SortedIndex,
    TtreeError, TtreeOptions,
};

#[derive(Clone, Debug)]
struct Person {
    id: u64,
    age: u32,
    name: String,
}

impl Persistent for Person {
    fn oid(&self) -> ObjectId {
        ObjectId(self.id)
    }
}

fn people(count: u64, seed: u64) -> Vec<Person> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (1..=count)
        .map(|id| Person {
            id,
            age: rng.gen_range(0..90),
            name: format!("p{:04}", rng.gen_range(0..10_000)),
        })
        .collect()
}

#[test]
fn two_indexes_share_one_store() -> Result<()> {
    let mut store =
        MemoryNodeStore::with_options(&MemoryStoreOptions::default().cache_nodes(6))?;
    let mut by_age =
        SortedIndex::<Person, _>::new(ByKey(|p: &Person| p.age), TtreeOptions::with_max_items(6))?;
    let mut by_name = SortedIndex::<Person, _>::new(
        ByKey(|p: &Person| p.name.clone()),
        TtreeOptions::with_max_items(6),
    )?;

    let all = people(400, 42);
    by_age.add_all(&mut store, all.clone())?;
    by_name.add_all(&mut store, all.clone())?;
    assert!(store.stats().evictions > 0);

    for person in all.iter().filter(|p| p.age < 30) {
        assert!(by_age.remove(&mut store, person)?);
        assert!(by_name.remove(&mut store, person)?);
    }

    let survivors = all.iter().filter(|p| p.age >= 30).count() as u64;
    assert_eq!(by_age.len(), survivors);
    assert_eq!(by_name.len(), survivors);
    assert!(by_age.verify(&mut store)?.success);
    assert!(by_name.verify(&mut store)?.success);

    let young = by_age.range(&mut store, Bound::Unbounded, Bound::Excluded(&30))?;
    assert!(young.is_empty());
    let names = by_name.to_vec(&mut store)?;
    assert!(names.windows(2).all(|w| w[0].name <= w[1].name));

    by_age.destroy(&mut store)?;
    assert!(by_name.verify(&mut store)?.success);
    by_name.destroy(&mut store)?;
    assert_eq!(store.live_nodes(), 0);
    Ok(())
}

#[test]
fn load_failure_surfaces_to_caller() -> Result<()> {
    let mut store = MemoryNodeStore::new();
    let mut index =
        SortedIndex::<Person, _>::new(ByKey(|p: &Person| p.age), TtreeOptions::with_max_items(4))?;
    index.add_all(&mut store, people(64, 7))?;
    store.evict_all()?;

    store.fail_after_loads(2);
    let err = index
        .range(&mut store, Bound::Included(&0), Bound::Unbounded)
        .expect_err("third page load fails");
    assert!(matches!(err, TtreeError::Storage(_)));

    store.clear_faults();
    assert_eq!(index.to_vec(&mut store)?.len(), 64);
    assert!(index.verify(&mut store)?.success);
    Ok(())
}

#[test]
fn failed_mutations_keep_committed_members() -> Result<()> {
    let mut store =
        MemoryNodeStore::with_options(&MemoryStoreOptions::default().cache_nodes(2))?;
    let mut index =
        SortedIndex::<Person, _>::new(ByKey(|p: &Person| p.age), TtreeOptions::with_max_items(2))?;
    let all = people(21, 11);
    index.add_all(&mut store, all[..20].iter().cloned())?;

    let mut faults = 0;
    for loads in 0.. {
        store.evict_all()?;
        store.fail_after_loads(loads);
        let outcome = index.add(&mut store, all[20].clone());
        store.clear_faults();
        match outcome {
            Ok(added) => {
                assert!(added);
                break;
            }
            Err(TtreeError::Storage(_)) => {
                faults += 1;
                assert_eq!(index.len(), 20);
                assert_eq!(index.to_vec(&mut store)?.len(), 20);
                assert!(index.verify(&mut store)?.success);
            }
            Err(err) => return Err(err),
        }
    }
    assert!(faults > 0);
    assert_eq!(index.to_vec(&mut store)?.len(), 21);

    for loads in 0.. {
        store.evict_all()?;
        store.fail_after_loads(loads);
        let outcome = index.remove(&mut store, &all[3]);
        store.clear_faults();
        match outcome {
            Ok(removed) => {
                assert!(removed);
                break;
            }
            Err(TtreeError::Storage(_)) => {
                assert_eq!(index.len(), 21);
                assert!(index.contains(&mut store, &all[3])?);
                assert!(index.verify(&mut store)?.success);
            }
            Err(err) => return Err(err),
        }
    }
    assert_eq!(index.len(), 20);
    assert!(index.verify(&mut store)?.success);
    Ok(())
}
