//! Property tests for pin field packing.

use emu_core::Pins;
use proptest::prelude::*;

proptest! {
    #[test]
    fn address_survives_any_control_state(raw in any::<u64>(), addr in 0u32..0x100_0000) {
        let pins = Pins(raw).with_address(addr);
        prop_assert_eq!(pins.address(), addr);
        prop_assert_eq!(pins.0 & !(Pins::A | Pins::BA), raw & !(Pins::A | Pins::BA));
    }

    #[test]
    fn data_is_independent_of_address(raw in any::<u64>(), data in any::<u8>()) {
        let before = Pins(raw);
        let pins = before.with_data(data);
        prop_assert_eq!(pins.data(), data);
        prop_assert_eq!(pins.address(), before.address());
        prop_assert_eq!(pins.0 & !Pins::D, raw & !Pins::D);
    }

    #[test]
    fn set_then_clear_restores(raw in any::<u64>(), bit in 24u32..64) {
        let mask = 1u64 << bit;
        let pins = Pins(raw & !mask);
        prop_assert_eq!(pins.set(mask).clear(mask), pins);
    }
}

#[cfg(feature = "serde")]
#[test]
fn pins_serialize_as_raw_word() {
    let pins = Pins::new().with_address(0x01_2345).set(Pins::RW);
    let json = serde_json::to_string(&pins).expect("serialize");
    let back: Pins = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back, pins);
}
