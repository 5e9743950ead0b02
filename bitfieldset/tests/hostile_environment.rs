mod bitfieldset {}
mod core {}
mod paste {}

mod shadowed {
    #![allow(dead_code, non_camel_case_types)]

    pub struct u8;
    pub struct u32;
    pub struct usize;
    pub struct str;
    pub enum Option {}

    ::bitfieldset::bitfield_set! {
        pub struct Regs: [u32; 2] {
            #[default = 1]
            pub Enable: 0[0],
            #[byte_offset = 4]
            #[compound_offset = 8]
            pub Level: [0..=7],
            #[read_only]
            pub Busy: 1[31],
        }
    }
}

use shadowed::{regs, Regs};

#[test]
fn test_layout_in_hostile_environment() {
    assert!(<Regs as ::bitfieldset::Layout>::REPORT.is_ok());

    let mut set = ::bitfieldset::FieldSet::<Regs>::from_words([0, 1 << 31]);
    set.set::<regs::Enable>(1).set::<regs::Level>(0x42);
    assert_eq!(set.get::<regs::Busy>(), 1);
    assert_eq!(set.get_compound::<regs::Level>(), 0x4200);
    assert_eq!(set.into_storage(), [1, 0x8000_0042]);
}
