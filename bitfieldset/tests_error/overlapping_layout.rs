use bitfieldset::prelude::*;

bitfield_set! {
    struct Overlapping: [u32; 1] {
        F1: 0[0..=2],
        F3: 0[2..=7],
    }
}

fn main() {}
