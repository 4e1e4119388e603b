use bytemuck::{Pod, Zeroable};

use crate::{AlignedBytes, Container, ErrorKind, ExpandPolicy, ImageLayout};

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
struct Track {
    x: f32,
    alpha: f32,
    params: [f32; 5],
    id: u32,
}

impl Track {
    fn new(id: u32) -> Track {
        Track {
            x: id as f32 * 0.5,
            alpha: 0.1,
            params: [0.0, 0.0, 0.1, 0.1, 1.0],
            id,
        }
    }
}

type Tracks = Container<Track, u32>;

fn filled(count: u32) -> Tracks {
    let mut c = Tracks::new();
    for id in 0..count {
        c.push_back(Track::new(id)).unwrap();
    }
    c
}

#[test]
fn test_default_container_growth_sequence() {
    let mut c = Tracks::new();
    assert_eq!(c.capacity(), 0);
    assert_eq!(c.expand_policy(), Some(ExpandPolicy::new(-1)));

    c.push_back(Track::new(0)).unwrap();
    assert_eq!(c.capacity(), 2);
    c.push_back(Track::new(1)).unwrap();
    assert_eq!(c.capacity(), 2);
    c.push_back(Track::new(2)).unwrap();
    assert_eq!(c.capacity(), 6);
    assert_eq!(c.len(), 3);
}

#[test]
fn test_size_tracks_appends() {
    let mut c = Tracks::new();
    for i in 0..100u32 {
        if i % 3 == 0 {
            c.emplace_back(|t| t.id = i).unwrap();
        } else {
            c.push_back(Track::new(i)).unwrap();
        }
        assert_eq!(c.len(), i as usize + 1);
        assert!(c.capacity() >= c.len());
    }
    for (i, track) in c.iter().enumerate() {
        assert_eq!(track.id, i as u32);
    }
}

#[test]
fn test_additive_policy() {
    let mut c = Tracks::with_capacity_and_policy(0, 3).unwrap();
    c.expand().unwrap();
    assert_eq!(c.capacity(), 3);
    for id in 0..4 {
        c.push_back(Track::new(id)).unwrap();
    }
    assert_eq!(c.capacity(), 6);

    let mut c = Tracks::with_capacity_and_policy(10, 5).unwrap();
    c.expand().unwrap();
    assert_eq!(c.capacity(), 15);
}

#[test]
fn test_doubling_policy_with_floor() {
    let mut c = Tracks::with_capacity_and_policy(0, -4).unwrap();
    c.expand().unwrap();
    assert_eq!(c.capacity(), 8);
    c.expand().unwrap();
    assert_eq!(c.capacity(), 24);

    let mut c = Tracks::with_capacity_and_policy(5, -1).unwrap();
    for id in 0..6 {
        c.push_back(Track::new(id)).unwrap();
    }
    assert_eq!(c.capacity(), 12);
}

#[test]
fn test_reserve_preserves_elements() {
    let mut c = filled(5);
    let before: Vec<Track> = c.as_slice().to_vec();
    c.reserve(50).unwrap();
    assert_eq!(c.capacity(), 50);
    assert_eq!(c.len(), 5);
    assert_eq!(c.as_slice(), &before[..]);
    assert_eq!(
        c.size_in_bytes(),
        ImageLayout::<Track, u32>::booked_bytes(50).unwrap()
    );
}

#[test]
fn test_reserve_truncates_without_cleanup() {
    let mut c = filled(5);
    c.set_user_info(99).unwrap();
    c.reserve(2).unwrap();
    assert_eq!(c.len(), 2);
    assert_eq!(c.capacity(), 2);
    assert_eq!(c.as_slice(), &[Track::new(0), Track::new(1)]);
    assert_eq!(c.user_info(), Some(&99));

    // Dropped slots are gone for good: growing again exposes zeroed storage.
    c.reserve(5).unwrap();
    let data_offset = ImageLayout::<Track, u32>::DATA_OFFSET;
    let tail = &c.as_bytes()[data_offset + 2 * std::mem::size_of::<Track>()..];
    assert!(tail.iter().all(|&b| b == 0));
}

#[test]
fn test_shrink_to_fit() {
    let mut c = filled(3);
    assert_eq!(c.capacity(), 6);
    c.shrink_to_fit().unwrap();
    assert_eq!(c.capacity(), 3);
    assert_eq!(c.len(), 3);
    assert_eq!(c[2], Track::new(2));
}

#[test]
fn test_reserve_overflow_leaves_container_intact() {
    let mut c = filled(3);
    let err = c.reserve(usize::MAX).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::CapacityOverflow { .. }));
    assert_eq!(c.len(), 3);
    assert_eq!(c.capacity(), 6);
}

#[test]
fn test_clear_keeps_storage() {
    let mut c = filled(4);
    let capacity = c.capacity();
    let ptr = c.as_ptr();
    c.clear(true);
    assert_eq!(c.len(), 0);
    assert!(c.is_empty());
    assert_eq!(c.capacity(), capacity);

    c.push_back(Track::new(10)).unwrap();
    assert_eq!(c.as_ptr(), ptr);
    assert_eq!(c.front(), Some(&Track::new(10)));

    c.clear(false);
    assert_eq!(c.len(), 0);
    assert_eq!(c.capacity(), capacity);
}

#[test]
fn test_emplace_back_starts_from_zeroed_slot() {
    let mut c = filled(2);
    c.clear(false);
    let t = c
        .emplace_back(|t| {
            t.id = 77;
            t.x = 1.5;
        })
        .unwrap();
    assert_eq!(t.id, 77);
    assert_eq!(t.params, [0.0; 5]);
    assert_eq!(t.alpha, 0.0);
    assert_eq!(c.len(), 1);
}

#[test]
fn test_push_back_returns_stored_element() {
    let mut c = Tracks::new();
    let stored = c.push_back(Track::new(3)).unwrap();
    stored.x = 42.0;
    assert_eq!(c[0].x, 42.0);
    assert_eq!(c[0].id, 3);
}

#[test]
fn test_checked_access() {
    let mut c = Tracks::new();
    assert_eq!(c.front(), None);
    assert_eq!(c.back(), None);
    assert_eq!(c.at(0), None);

    c.extend_from_slice(&[Track::new(1), Track::new(2), Track::new(3)])
        .unwrap();
    assert_eq!(c.front().unwrap().id, 1);
    assert_eq!(c.back().unwrap().id, 3);
    assert_eq!(c.at(1).unwrap().id, 2);
    assert_eq!(c.at(3), None);
    assert_eq!(c.at(usize::MAX), None);

    c.at_mut(1).unwrap().id = 20;
    c.back_mut().unwrap().id = 30;
    c.front_mut().unwrap().id = 10;
    let ids: Vec<u32> = c.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![10, 20, 30]);
}

#[test]
fn test_unchecked_access() {
    let mut c = filled(4);
    // SAFETY: indices are below `len`.
    unsafe {
        assert_eq!(c.get_unchecked(3).id, 3);
        c.get_unchecked_mut(0).id = 100;
    }
    assert_eq!(c[0].id, 100);
}

#[test]
#[should_panic]
fn test_index_out_of_bounds_panics() {
    let c = filled(2);
    let _track: Track = c[2];
}

#[test]
fn test_extend_from_slice_grows_by_policy() {
    let mut c = Tracks::new();
    let items: Vec<Track> = (0..5).map(Track::new).collect();
    c.extend_from_slice(&items).unwrap();
    assert_eq!(c.len(), 5);
    assert_eq!(c.capacity(), 6);
    assert_eq!(c.as_slice(), &items[..]);

    c.extend_from_slice(&[]).unwrap();
    assert_eq!(c.len(), 5);
}

#[test]
fn test_release_detaches() {
    let mut c = filled(3);
    c.set_user_info(0xdead_beef).unwrap();
    let size = c.size_in_bytes();
    let ptr = c.as_ptr();

    let image = c.release().unwrap();
    assert_eq!(image.len(), size);
    assert_eq!(image.as_ptr(), ptr);

    assert!(c.is_detached());
    assert_eq!(c.len(), 0);
    assert_eq!(c.capacity(), 0);
    assert_eq!(c.size_in_bytes(), 0);
    assert_eq!(c.user_info(), None);
    assert_eq!(c.expand_policy(), None);
    assert!(c.header().is_none());
    assert!(c.as_slice().is_empty());
    assert_eq!(c.front(), None);
    assert!(c.release().is_none());

    let err = c.push_back(Track::new(0)).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::InvalidOperation { .. }));
    assert!(c.reserve(10).is_err());
    assert!(c.set_user_info(1).is_err());
    c.clear(true);

    c.reset();
    assert!(!c.is_detached());
    c.push_back(Track::new(5)).unwrap();
    assert_eq!(c.len(), 1);
    assert_eq!(c.capacity(), 2);
}

#[test]
fn test_adopt_takes_ownership_without_copy() {
    let mut c = filled(7);
    c.set_user_info(0xdead_beef).unwrap();
    let expected: Vec<Track> = c.as_slice().to_vec();

    let image = c.into_bytes();
    let ptr = image.as_ptr();
    let len = image.len();
    let restored = Tracks::from_bytes(image, Some(len)).unwrap();
    assert_eq!(restored.as_ptr(), ptr);
    assert_eq!(restored.len(), 7);
    assert_eq!(restored.user_info(), Some(&0xdead_beef));
    assert_eq!(restored.as_slice(), &expected[..]);
    assert_eq!(restored.capacity(), 14);
}

#[test]
fn test_adopt_copy_is_independent() {
    let c = filled(3);
    let source = c.as_bytes().to_vec();
    let mut copy = Tracks::copy_from_bytes(&source, None).unwrap();
    assert_ne!(copy.as_ptr(), c.as_ptr());
    assert_eq!(copy.as_bytes(), &source[..]);

    copy[0].id = 1000;
    copy.push_back(Track::new(9)).unwrap();
    assert_eq!(c[0].id, 0);
    assert_eq!(c.len(), 3);
    assert_eq!(c.as_bytes(), &source[..]);
}

#[test]
fn test_adopt_wrong_expected_size() {
    let c = filled(3);
    let len = c.size_in_bytes();
    let err = Tracks::copy_from_bytes(c.as_bytes(), Some(len + 1)).unwrap_err();
    assert!(err.is_size_mismatch());
    match err.into_kind() {
        ErrorKind::SizeMismatch { expected, actual } => {
            assert_eq!(expected, len + 1);
            assert_eq!(actual, len);
        }
        other => panic!("unexpected kind {other:?}"),
    }

    let image = c.into_bytes();
    assert!(
        Tracks::from_bytes(image, Some(0))
            .unwrap_err()
            .is_size_mismatch()
    );
}

#[test]
fn test_adopt_rejects_short_image() {
    let err = Tracks::from_bytes(AlignedBytes::zeroed(8, 64), None).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::InvalidFormat { .. }));
    assert!(Tracks::from_bytes(AlignedBytes::new(), None).is_err());
}

#[test]
fn test_adopt_rejects_inconsistent_header() {
    let c = filled(3);

    // Image longer than its header claims.
    let mut longer = c.as_bytes().to_vec();
    longer.extend_from_slice(&[0u8; 32]);
    let err = Tracks::copy_from_bytes(&longer, None).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::InvalidFormat { .. }));

    // Element count beyond capacity.
    let mut corrupt = c.as_bytes().to_vec();
    let n_objects_at = std::mem::offset_of!(crate::Header<u32>, n_objects);
    corrupt[n_objects_at..n_objects_at + 4].copy_from_slice(&100i32.to_ne_bytes());
    let err = Tracks::copy_from_bytes(&corrupt, None).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::InvalidFormat { .. }));

    // Negative element count.
    corrupt[n_objects_at..n_objects_at + 4].copy_from_slice(&(-1i32).to_ne_bytes());
    assert!(Tracks::copy_from_bytes(&corrupt, None).is_err());
}

fn format_element(err: &crate::Error) -> &str {
    match err.kind() {
        ErrorKind::InvalidFormat { element, .. } => element,
        other => panic!("unexpected kind {other:?}"),
    }
}

#[test]
fn test_adopt_names_the_inconsistent_field() {
    let c = filled(3);
    let booked_at = std::mem::offset_of!(crate::Header<u32>, booked_bytes);
    let n_objects_at = std::mem::offset_of!(crate::Header<u32>, n_objects);

    let mut corrupt = c.as_bytes().to_vec();
    corrupt[booked_at..booked_at + 4].copy_from_slice(&(-8i32).to_ne_bytes());
    let err = Tracks::copy_from_bytes(&corrupt, None).unwrap_err();
    assert_eq!(format_element(&err), "booked_bytes");

    let mut corrupt = c.as_bytes().to_vec();
    corrupt[n_objects_at..n_objects_at + 4].copy_from_slice(&(-1i32).to_ne_bytes());
    let err = Tracks::copy_from_bytes(&corrupt, None).unwrap_err();
    assert_eq!(format_element(&err), "n_objects");

    let err = Tracks::from_bytes(AlignedBytes::zeroed(8, 64), None).unwrap_err();
    assert_eq!(format_element(&err), "bytes");
}

#[test]
fn test_adopt_normalizes_zero_policy() {
    let c = filled(1);
    let mut bytes = c.as_bytes().to_vec();
    let policy_at = std::mem::offset_of!(crate::Header<u32>, expand_policy);
    bytes[policy_at..policy_at + 4].copy_from_slice(&0i32.to_ne_bytes());
    let restored = Tracks::copy_from_bytes(&bytes, None).unwrap();
    assert_eq!(restored.expand_policy().unwrap().raw(), -1);
}

#[test]
fn test_header_describes_image() {
    let mut c = Tracks::with_capacity_and_policy(4, 16).unwrap();
    c.set_user_info(12).unwrap();
    c.push_back(Track::new(0)).unwrap();
    let header = c.header().unwrap();
    assert_eq!(*header.user_info(), 12);
    assert_eq!(header.expand_policy(), 16);
    assert_eq!(header.n_objects(), 1);
    assert_eq!(header.booked_bytes() as usize, c.size_in_bytes());
}

#[test]
fn test_image_alignment() {
    #[repr(C, align(32))]
    #[derive(Clone, Copy, Pod, Zeroable)]
    struct Block {
        lanes: [u64; 4],
    }

    let mut c = Container::<Block, u8>::new();
    c.push_back(Block { lanes: [1, 2, 3, 4] }).unwrap();
    assert_eq!(ImageLayout::<Block, u8>::DATA_OFFSET, 32);
    assert_eq!(c.as_ptr() as usize % 32, 0);
    assert_eq!(c[0].lanes, [1, 2, 3, 4]);
}

#[test]
fn test_clone_is_deep() {
    let c = filled(2);
    let mut d = c.clone();
    d[1].id = 50;
    assert_eq!(c[1].id, 1);
    assert_eq!(d.len(), 2);
    assert!(format!("{d:?}").starts_with("Container"));
}
