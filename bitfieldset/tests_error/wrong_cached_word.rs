use bitfieldset::prelude::*;

bitfield_set! {
    struct Pair: [u16; 2] {
        Low: 0[0..],
        High: 1[0..],
    }
}

fn main() {
    let regs = FieldSet::<Pair>::new();
    let view = regs.word::<pair::Low>();
    let _ = view.get::<pair::High>();
}
