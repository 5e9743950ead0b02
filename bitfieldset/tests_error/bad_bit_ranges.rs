use bitfieldset::prelude::*;

bitfield_set! {
    struct Backwards: [u32; 1] {
        F: 0[7..=3],
    }

    struct TooWide: [u8; 1] {
        F: 0[4..=8],
    }
}

fn main() {}
