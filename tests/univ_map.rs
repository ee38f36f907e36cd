// UnivMap integration tests: the typed view over word cells.
//
// Properties exercised:
// - Legacy zero forms: remove/replace/retrieve_or_zero report absence as 0.
// - Presence forms (retrieve, contains, slot) are unambiguous.
// - Typed cursors decode keys and values; randomized traversal covers the
//   same pairs.
use mesh_map::{MapError, UnivMap};
use rand_core::SeedableRng;
use rand_pcg::Pcg64;
use std::collections::BTreeMap;
use std::ptr::NonNull;

#[test]
fn three_key_walkthrough_with_zero_forms() {
    let mut m: UnivMap<u32, char> = UnivMap::new();
    m.enter(1, 'a');
    m.enter(2, 'b');
    m.enter(3, 'c');
    assert_eq!(m.len(), 3);
    assert_eq!(m.retrieve(2), Some('b'));
    assert_eq!(m.remove(2), 'b');
    assert_eq!(m.len(), 2);
    assert!(!m.contains(2));
    assert_eq!(m.replace(1, 'z'), 'a');
    assert_eq!(m.retrieve(1), Some('z'));

    // Absent keys read as zero and are never inserted.
    assert_eq!(m.remove(2), '\0');
    assert_eq!(m.replace(9, 'q'), '\0');
    assert!(!m.contains(9));
    assert_eq!(m.retrieve_or_zero(9), '\0');
    m.validate().unwrap();
}

#[test]
fn negative_keys_and_values() {
    let mut m: UnivMap<i64, i32> = UnivMap::new();
    for k in -50..50i64 {
        m.enter(k, (k * 2) as i32);
    }
    for k in -50..50i64 {
        assert_eq!(m.get(k), (k * 2) as i32);
    }
    assert_eq!(m.fetch(1000), Err(MapError::MissingKey));
    m.validate().unwrap();
}

#[test]
#[should_panic(expected = "not present")]
fn get_absent_panics() {
    let m: UnivMap<u8, u8> = UnivMap::new();
    let _ = m.get(1);
}

#[test]
fn slot_or_enter_counts_occurrences() {
    // Count edge valences, the way mesh code tallies adjacency.
    let edges = [(0usize, 1usize), (1, 2), (2, 0), (0, 3)];
    let mut valence: UnivMap<usize, u32> = UnivMap::new();
    for (a, b) in edges {
        for v in [a, b] {
            let mut s = valence.slot_or_enter(v);
            let n = s.get();
            s.set(n + 1);
        }
    }
    assert_eq!(valence.retrieve(0), Some(3));
    assert_eq!(valence.retrieve(3), Some(1));
    assert_eq!(valence.len(), 4);
}

#[test]
fn pointer_keys_map_to_values() {
    let mut verts = [10u32, 20, 30];
    let mut m: UnivMap<Option<NonNull<u32>>, bool> = UnivMap::new();
    for v in verts.iter_mut() {
        m.enter(NonNull::new(v as *mut u32), true);
    }
    assert!(m.retrieve(NonNull::new(&mut verts[1] as *mut u32)).unwrap());
    assert_eq!(m.retrieve(None), None);
}

#[test]
fn typed_cursor_and_random_iteration_agree() {
    let mut m: UnivMap<u16, i16> = UnivMap::new();
    for k in 0..120u16 {
        m.enter(k, -(k as i16));
    }
    let mut c = m.cursor();
    let mut standard = BTreeMap::new();
    while let Some((k, v)) = c.get() {
        assert_eq!(c.key(), k);
        assert_eq!(c.value(), v);
        standard.insert(k, v);
        c.advance();
    }
    let mut rng = Pcg64::seed_from_u64(99);
    let random: BTreeMap<u16, i16> = m.iter_random(&mut rng).collect();
    assert_eq!(standard.len(), 120);
    assert_eq!(random, standard);
    assert_eq!(m.keys().count(), 120);
    assert_eq!(m.values().map(i32::from).sum::<i32>(), -(0..120).sum::<i32>());
}

#[test]
fn clear_and_try_enter() {
    let mut m: UnivMap<u8, bool> = UnivMap::new();
    assert!(m.try_enter(1, true));
    assert!(!m.try_enter(1, false));
    assert_eq!(m.retrieve(1), Some(true));
    m.clear();
    assert!(m.is_empty());
    assert_eq!(m.bucket_count(), 0);
    let mut rng = Pcg64::seed_from_u64(1);
    assert!(!m.cursor_random(&mut rng).is_positioned());
}
