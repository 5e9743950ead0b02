use std::cell::Cell;

use bitfieldset::prelude::*;
use bitfieldset::{DynFieldSet, DynLayout};

bitfield_set! {
    pub struct Regs: [u32; 3] {
        pub Low: 0[0..=7],
        pub High: 0[8..=15],
        #[min = 1]
        #[max = 100]
        pub Count: 1[0..=15],
        #[read_only]
        pub Status: 2[0..=3],
        #[write_only]
        pub Command: 2[4..=7],
    }
}

/// Plain words that count every access.
#[derive(Debug, Default)]
struct Counting {
    words: [u32; 3],
    loads: Cell<usize>,
    stores: usize,
}

impl Counting {
    fn new(words: [u32; 3]) -> Self {
        Self {
            words,
            ..Self::default()
        }
    }

    fn accesses(&self) -> (usize, usize) {
        (self.loads.get(), self.stores)
    }
}

impl Storage for Counting {
    type Word = u32;

    const LEN: usize = 3;

    fn load(&self, index: usize) -> u32 {
        self.loads.set(self.loads.get() + 1);
        self.words[index]
    }

    fn store(&mut self, index: usize, value: u32) {
        self.stores += 1;
        self.words[index] = value;
    }
}

fn counting(words: [u32; 3]) -> FieldSet<Regs, Counting> {
    FieldSet::from_storage(Counting::new(words))
}

#[test]
fn test_get_is_one_load() {
    let regs = counting([0x1234, 0, 0]);
    assert_eq!(regs.get::<regs::High>(), 0x12);
    assert_eq!(regs.storage().accesses(), (1, 0));
}

#[test]
fn test_set_is_one_load_and_one_store() {
    let mut regs = counting([0xffff_ffff, 0, 0]);
    regs.set::<regs::Low>(0);
    assert_eq!(regs.storage().accesses(), (1, 1));
    assert_eq!(regs.storage().words[0], 0xffff_ff00);
}

#[test]
fn test_write_only_set_keeps_neighbours() {
    let mut regs = counting([0, 0, 0b1010]);
    regs.set::<regs::Command>(0b0110);
    assert_eq!(regs.storage().accesses(), (1, 1));
    assert_eq!(regs.storage().words[2], 0b0110_1010);
}

#[test]
fn test_modify_is_one_load_and_one_store() {
    let mut regs = counting([0x0201, 0, 0]);
    regs.modify::<regs::Low>(|low| low + 1);
    assert_eq!(regs.storage().accesses(), (1, 1));
    assert_eq!(regs.get::<regs::Low>(), 2);
}

#[test]
fn test_cached_word_is_one_load() {
    let regs = counting([0xbeef, 7, 5]);
    let word = regs.word::<regs::Low>();
    assert_eq!(word.get::<regs::Low>(), 0xef);
    assert_eq!(word.get::<regs::High>(), 0xbe);
    assert_eq!(word.get::<regs::Low>(), 0xef);
    assert_eq!(regs.storage().accesses(), (1, 0));
}

#[test]
fn test_reset_all_stores_every_word() {
    let mut regs = counting([1, 2, 3]);
    regs.reset_all();
    assert_eq!(regs.storage().accesses(), (0, 3));
    assert_eq!(regs.into_storage().words, [0; 3]);
}

#[test]
fn test_rejected_checked_set_does_not_access_storage() {
    let mut regs = counting([0, 50, 0]);
    let error = regs.checked_set::<regs::Count>(0).unwrap_err();
    assert!(matches!(
        error,
        Error::OutOfRange {
            field: 2,
            value: 0,
            min: 1,
            max: 100,
        },
    ));
    assert!(regs.checked_set::<regs::Count>(101).is_err());
    assert_eq!(regs.storage().accesses(), (0, 0));

    regs.checked_set::<regs::Count>(100).unwrap();
    assert_eq!(regs.storage().accesses(), (1, 1));
    assert_eq!(regs.storage().words[1], 100);
}

#[test]
fn test_dynamic_access_counts() {
    let layout = DynLayout::of::<Regs>();
    let mut regs = DynFieldSet::new(layout, Counting::new([0x1234, 0, 0])).unwrap();
    assert_eq!(regs.get(1).unwrap(), 0x12);
    regs.set(0, 0x56).unwrap();
    assert_eq!(regs.storage().accesses(), (2, 1));

    // Rejected accesses never reach the storage.
    assert!(regs.get(4).is_err());
    assert!(regs.set(3, 1).is_err());
    assert!(regs.checked_set(2, 0).is_err());
    assert!(regs.get(9).is_err());
    assert_eq!(regs.storage().accesses(), (2, 1));

    let word = regs.word(0).unwrap();
    assert_eq!((word.get(0).unwrap(), word.get(1).unwrap()), (0x56, 0x12));
    assert_eq!(regs.storage().accesses(), (3, 1));
}

#[test]
fn test_volatile_storage() {
    let mut regs = FieldSet::<Regs, _>::from_storage(Volatile::new([0, 0, 0x9]));
    regs.set::<regs::High>(0xab).set::<regs::Command>(0x3);
    assert_eq!(regs.get::<regs::High>(), 0xab);
    assert_eq!(regs.get::<regs::Status>(), 0x9);
    assert_eq!(regs.into_storage().into_inner(), [0xab00, 0, 0x39]);
}

#[test]
fn test_mmio_storage() {
    let mut window = [0u32, 0, 0x5];
    {
        let mut regs = FieldSet::<Regs, _>::from_storage(Mmio::from_mut(&mut window));
        regs.set::<regs::Low>(0x11).set::<regs::Count>(42);
        let status = regs.word::<regs::Status>();
        assert_eq!(status.get::<regs::Status>(), 0x5);
    }
    assert_eq!(window, [0x11, 42, 0x5]);

    // SAFETY: `window` outlives `regs` and is not otherwise accessed while `regs` is alive.
    let mut regs = FieldSet::<Regs, _>::from_storage(unsafe {
        Mmio::<u32, 3>::new_unchecked(&mut window)
    });
    regs.reset_all();
    drop(regs);
    assert_eq!(window, [0; 3]);
}

#[test]
fn test_mmio_rejects_out_of_range_words() {
    let mut window = [0u32; 3];
    let mut mmio = Mmio::from_mut(&mut window);
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| mmio.store(3, 1)));
    assert!(result.is_err());
}
