use bitfieldset::prelude::*;

bitfield_set! {
    struct Doorbell: [u32; 1] {
        #[write_only]
        Ring: 0[0..=7],
    }
}

fn main() {
    let regs = FieldSet::<Doorbell>::new();
    let _ = regs.get::<doorbell::Ring>();
}
