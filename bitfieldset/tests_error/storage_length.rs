use bitfieldset::prelude::*;

bitfield_set! {
    struct Wide: [u32; 2] { X: 1[0..=3] }
}

fn main() {
    let regs = FieldSet::<Wide, _>::from_storage([0u32; 1]);
    let _ = regs.get::<wide::X>();
}
