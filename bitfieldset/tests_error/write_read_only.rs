use bitfieldset::prelude::*;

bitfield_set! {
    struct Status: [u32; 1] {
        #[read_only]
        Ready: 0[0],
    }
}

fn main() {
    let mut regs = FieldSet::<Status>::new();
    regs.set::<status::Ready>(1);
}
