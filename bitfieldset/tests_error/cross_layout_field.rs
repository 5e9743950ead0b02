use bitfieldset::prelude::*;

bitfield_set! {
    struct A: [u8; 1] { X: 0[0..=3] }
    struct B: [u8; 1] { Y: 0[0..=3] }
}

fn main() {
    let regs = FieldSet::<A>::new();
    let _ = regs.get::<b::Y>();
}
