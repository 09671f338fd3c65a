/// Bits already delivered by a newer packet are never sent again when an
/// older packet carrying them is reported lost

use ghostwire_shared::{DirtyMask, ObjectRegistry};
use ghostwire_test::{
    assert_table_consistent, event_log, TestGhost, TestObject, TestPair, TestProtocol, TestScope,
};

const BIT_A: u32 = 0x01;
const BIT_B: u32 = 0x02;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn acked_newer_update_supersedes_dropped_older_one() {
    init_logger();
    let log = event_log();
    let mut pair = TestPair::started(TestProtocol::standard(&log));
    let mut registry = ObjectRegistry::new();
    let object = registry.spawn(TestObject::new(0));
    let state = object.downcast_ref::<TestObject>().unwrap();
    let mut scope = TestScope::with(&[object.clone()]);
    pair.tick(&mut scope).unwrap();

    // packet 1 carries {A}, still in flight
    state.set_field(0, 1);
    object.mark_dirty(DirtyMask::new(BIT_A));
    let packet_1 = pair.send(&mut scope);

    // packet 2 carries {A, B} and is acknowledged
    state.set_field(0, 2);
    state.set_field(1, 2);
    object.mark_dirty(DirtyMask::new(BIT_A | BIT_B));
    let packet_2 = pair.send(&mut scope);
    pair.deliver(&packet_2).unwrap();

    // packet 1 is reported lost afterwards
    pair.drop_packet(&packet_1);
    assert!(!pair.host.is_data_to_transmit());

    let packs_before = state.packs().len();
    let packet_3 = pair.send(&mut scope);
    assert!(!packet_3.has_written);
    assert_eq!(state.packs().len(), packs_before);

    let index = pair.host.ghost_index(&object).unwrap();
    let ghost = pair.client.local_ghosts().get_as::<TestGhost>(index).unwrap();
    assert_eq!(ghost.field(0), 2);
    assert_eq!(ghost.field(1), 2);
    assert_table_consistent!(pair.host);
}

#[test]
fn older_drop_defers_to_newer_outstanding_update() {
    init_logger();
    let log = event_log();
    let mut pair = TestPair::started(TestProtocol::standard(&log));
    let mut registry = ObjectRegistry::new();
    let object = registry.spawn(TestObject::new(0));
    let state = object.downcast_ref::<TestObject>().unwrap();
    let mut scope = TestScope::with(&[object.clone()]);
    pair.tick(&mut scope).unwrap();

    object.mark_dirty(DirtyMask::new(BIT_A));
    let packet_1 = pair.send(&mut scope);
    object.mark_dirty(DirtyMask::new(BIT_A | BIT_B));
    let packet_2 = pair.send(&mut scope);

    // packet 2 still carries A, so nothing comes back yet
    pair.drop_packet(&packet_1);
    assert!(!pair.host.is_data_to_transmit());

    // once packet 2 is lost too, both bits return
    pair.drop_packet(&packet_2);
    assert!(pair.host.is_data_to_transmit());
    let record = pair
        .host
        .host()
        .table()
        .get(pair.host.ghost_index(&object).unwrap())
        .unwrap();
    assert_eq!(record.mask(), DirtyMask::new(BIT_A | BIT_B));

    pair.tick(&mut scope).unwrap();
    let last = state.packs().last().cloned().unwrap();
    assert_eq!(last.written, DirtyMask::new(BIT_A | BIT_B));
}

#[test]
fn dropped_bits_not_covered_by_newer_packet_survive() {
    init_logger();
    let log = event_log();
    let mut pair = TestPair::started(TestProtocol::standard(&log));
    let mut registry = ObjectRegistry::new();
    let object = registry.spawn(TestObject::new(0));
    let mut scope = TestScope::with(&[object.clone()]);
    pair.tick(&mut scope).unwrap();

    object.mark_dirty(DirtyMask::new(BIT_A | BIT_B));
    let packet_1 = pair.send(&mut scope);
    object.mark_dirty(DirtyMask::new(BIT_A));
    let packet_2 = pair.send(&mut scope);
    pair.deliver(&packet_2).unwrap();

    pair.drop_packet(&packet_1);
    let index = pair.host.ghost_index(&object).unwrap();
    let record = pair.host.host().table().get(index).unwrap();
    assert_eq!(record.mask(), DirtyMask::new(BIT_B));
    assert_table_consistent!(pair.host);
}
