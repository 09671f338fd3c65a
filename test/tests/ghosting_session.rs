/// Session control, scoping and teardown of a ghosting connection

use ghostwire_shared::{
    DirtyMask, GhostingError, GhostingMessage, ObjectRegistry, PacketNotifiable, ScopeQuery,
    GHOST_EVICTION_MARGIN,
};
use ghostwire_test::{
    assert_event_count, assert_table_consistent, event_log, GhostEvent, TestObject, TestPair,
    TestProtocol, TestScope, HOST_KEY,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn nothing_is_written_before_ready() {
    init_logger();
    let log = event_log();
    let mut pair = TestPair::new(TestProtocol::standard(&log));
    let mut registry = ObjectRegistry::new();
    let object = registry.spawn(TestObject::new(0));
    let mut scope = TestScope::with(&[object.clone()]);

    let start = pair.host.activate_ghosting().unwrap();
    assert_eq!(start, GhostingMessage::StartGhosting { sequence: 1 });
    assert!(!pair.host.is_ghosting());

    let packet = pair.send(&mut scope);
    assert!(!packet.has_written);
    pair.deliver(&packet).unwrap();
    assert!(pair.host.host().table().is_empty());
    assert_eq!(pair.client.local_ghosts().live_count(), 0);
}

#[test]
fn activate_requires_ghost_from() {
    let log = event_log();
    let mut pair = TestPair::new(TestProtocol::standard(&log));

    assert_eq!(
        pair.client.activate_ghosting(),
        Err(GhostingError::NotGhostingFrom {
            operation: "activate ghosting"
        })
    );
    assert!(matches!(
        pair.client.reset_ghosting(),
        Err(GhostingError::NotGhostingFrom { .. })
    ));
}

#[test]
fn receiver_messages_require_ghost_to() {
    let log = event_log();
    let mut pair = TestPair::new(TestProtocol::standard(&log));

    assert_eq!(
        pair.host
            .receive_ghosting_message(GhostingMessage::StartGhosting { sequence: 1 }),
        Err(GhostingError::NotGhostingTo {
            operation: "start ghosting"
        })
    );
    assert!(matches!(
        pair.host.receive_ghosting_message(GhostingMessage::EndGhosting),
        Err(GhostingError::NotGhostingTo { .. })
    ));
    assert!(matches!(
        pair.client
            .receive_ghosting_message(GhostingMessage::ReadyForNormalGhosts { sequence: 0 }),
        Err(GhostingError::NotGhostingFrom { .. })
    ));
}

#[test]
fn stale_ready_is_ignored() {
    init_logger();
    let log = event_log();
    let mut pair = TestPair::new(TestProtocol::standard(&log));

    let first = pair.host.activate_ghosting().unwrap();
    let second = pair.host.activate_ghosting().unwrap();
    let first_ready = pair.client.receive_ghosting_message(first).unwrap().unwrap();
    let second_ready = pair.client.receive_ghosting_message(second).unwrap().unwrap();
    assert_eq!(
        second_ready,
        GhostingMessage::ReadyForNormalGhosts { sequence: 2 }
    );

    assert_eq!(pair.host.receive_ghosting_message(first_ready), Ok(None));
    assert!(!pair.host.is_ghosting());
    assert_eq!(pair.host.receive_ghosting_message(second_ready), Ok(None));
    assert!(pair.host.is_ghosting());
}

#[test]
fn reset_releases_ghosts_on_both_sides() {
    init_logger();
    let log = event_log();
    let mut pair = TestPair::started(TestProtocol::standard(&log));
    let mut registry = ObjectRegistry::new();
    let object = registry.spawn(TestObject::new(1));
    let mut scope = TestScope::with(&[object.clone()]);

    pair.tick(&mut scope).unwrap();
    assert_eq!(pair.client.local_ghosts().live_count(), 1);
    assert_eq!(object.ghost_connections(), vec![HOST_KEY]);

    let end = pair.host.reset_ghosting().unwrap();
    assert_eq!(end, GhostingMessage::EndGhosting);
    assert!(!pair.host.is_ghosting());
    assert!(pair.host.host().table().is_empty());
    assert_eq!(pair.host.host().ledger().pending_count(), 0);
    assert!(object.ghost_connections().is_empty());

    assert_eq!(pair.client.receive_ghosting_message(end), Ok(None));
    assert_eq!(pair.client.local_ghosts().live_count(), 0);
    assert_event_count!(log, GhostEvent::Removed { class_id: 1, .. }, 1);

    let packet = pair.send(&mut scope);
    assert!(!packet.has_written);

    // a new session ghosts the object from scratch
    pair.start_ghosting();
    pair.tick(&mut scope).unwrap();
    assert_eq!(pair.client.local_ghosts().live_count(), 1);
    assert_event_count!(log, GhostEvent::Added { class_id: 1, .. }, 2);
    assert_table_consistent!(pair.host);
}

#[test]
fn ghost_index_is_published_after_acknowledgement() {
    let log = event_log();
    let mut pair = TestPair::started(TestProtocol::standard(&log));
    let mut registry = ObjectRegistry::new();
    let object = registry.spawn(TestObject::new(4));
    let state = object.downcast_ref::<TestObject>().unwrap();
    let mut scope = TestScope::with(&[object.clone()]);

    let packet = pair.send(&mut scope);
    assert!(pair.host.host().table().index_of(object.id()).is_some());
    assert!(pair.host.ghost_index(&object).is_none());
    assert!(state.available_on().is_empty());

    pair.deliver(&packet).unwrap();
    assert!(pair.host.ghost_index(&object).is_some());
    assert_eq!(state.available_on(), vec![HOST_KEY]);
}

#[test]
fn dropped_creation_is_resent_in_full() {
    let log = event_log();
    let mut pair = TestPair::started(TestProtocol::standard(&log));
    let mut registry = ObjectRegistry::new();
    let object = registry.spawn(TestObject::new(2));
    let state = object.downcast_ref::<TestObject>().unwrap();
    let mut scope = TestScope::with(&[object.clone()]);

    let lost = pair.send(&mut scope);
    // nothing more goes out while the creation is in flight
    let idle = pair.send(&mut scope);
    assert!(!idle.has_written);
    pair.drop_packet(&lost);

    pair.tick(&mut scope).unwrap();
    let packs = state.packs();
    assert_eq!(packs.len(), 2);
    assert!(packs.iter().all(|pack| pack.is_initial));
    assert_eq!(packs[1].mask, DirtyMask::ALL);
    assert_event_count!(log, GhostEvent::Added { class_id: 2, .. }, 1);
}

#[test]
fn dropped_object_is_removed() {
    init_logger();
    let log = event_log();
    let mut pair = TestPair::started(TestProtocol::standard(&log));
    let mut registry = ObjectRegistry::new();
    let object = registry.spawn(TestObject::new(6));
    let mut scope = TestScope::new();
    scope.scope_always(&object);

    pair.tick(&mut scope).unwrap();
    assert_eq!(pair.client.local_ghosts().live_count(), 1);

    drop(object);
    let packet = pair.tick(&mut scope).unwrap();
    assert!(packet.has_written);
    assert_eq!(pair.client.local_ghosts().live_count(), 0);
    assert_event_count!(log, GhostEvent::Removed { class_id: 6, .. }, 1);
    assert!(pair.host.host().table().is_empty());
    assert_table_consistent!(pair.host);
}

#[test]
fn always_in_scope_outlives_the_query() {
    let log = event_log();
    let mut pair = TestPair::started(TestProtocol::standard(&log));
    let mut registry = ObjectRegistry::new();
    let object = registry.spawn(TestObject::new(0));
    let mut scope = TestScope::new();
    scope.scope_always(&object);

    for _ in 0..4 {
        pair.tick(&mut scope).unwrap();
    }
    assert_eq!(pair.client.local_ghosts().live_count(), 1);

    // a clean ghost that lost permanent scope lingers until it changes
    scope.clear_always(&object);
    pair.tick(&mut scope).unwrap();
    pair.tick(&mut scope).unwrap();
    assert_eq!(pair.client.local_ghosts().live_count(), 1);

    object.mark_dirty(DirtyMask::new(1));
    pair.tick(&mut scope).unwrap();
    assert_eq!(pair.client.local_ghosts().live_count(), 0);
    assert!(object.ghost_connections().is_empty());
}

#[test]
fn clean_ghost_missing_one_query_is_kept() {
    let log = event_log();
    let mut pair = TestPair::started(TestProtocol::standard(&log));
    let mut registry = ObjectRegistry::new();
    let object = registry.spawn(TestObject::new(2));
    let mut scope = TestScope::with(&[object.clone()]);
    pair.tick(&mut scope).unwrap();
    let index = pair.host.ghost_index(&object).unwrap();

    scope.remove(object.id());
    let packet = pair.tick(&mut scope).unwrap();
    assert!(!packet.has_written);
    assert_eq!(pair.host.ghost_index(&object), Some(index));

    scope.insert(&object);
    let packet = pair.tick(&mut scope).unwrap();
    assert!(!packet.has_written);
    assert_eq!(pair.host.ghost_index(&object), Some(index));
    assert_eq!(pair.client.local_ghosts().live_count(), 1);
    assert_event_count!(log, GhostEvent::Added { class_id: 2, .. }, 1);
    assert_event_count!(log, GhostEvent::Removed { .. }, 0);
}

#[test]
fn dirty_ghost_out_of_scope_is_removed() {
    let log = event_log();
    let mut pair = TestPair::started(TestProtocol::standard(&log));
    let mut registry = ObjectRegistry::new();
    let object = registry.spawn(TestObject::new(2));
    let mut scope = TestScope::with(&[object.clone()]);
    pair.tick(&mut scope).unwrap();

    scope.remove(object.id());
    pair.tick(&mut scope).unwrap();
    object.mark_dirty(DirtyMask::new(1));
    let packet = pair.tick(&mut scope).unwrap();

    assert!(packet.has_written);
    assert_eq!(pair.client.local_ghosts().live_count(), 0);
    assert!(pair.host.host().table().is_empty());
    assert_event_count!(log, GhostEvent::Removed { class_id: 2, .. }, 1);
}

#[test]
fn near_capacity_evicts_clean_ghosts_out_of_scope() {
    init_logger();
    let log = event_log();
    let mut protocol = TestProtocol::standard(&log);
    // eviction starts once more than two ghosts are live
    protocol.ghost.max_ghost_count = GHOST_EVICTION_MARGIN + 2;
    let mut pair = TestPair::started(protocol);
    let mut registry = ObjectRegistry::new();
    let objects: Vec<_> = (0..3).map(|class| registry.spawn(TestObject::new(class))).collect();
    let always = registry.spawn(TestObject::new(3));
    let mut scope = TestScope::with(&objects);
    scope.scope_always(&always);
    pair.tick(&mut scope).unwrap();
    assert_eq!(pair.client.local_ghosts().live_count(), 4);

    // the first pass only resets scope on clean ghosts
    scope.remove(objects[0].id());
    let packet = pair.tick(&mut scope).unwrap();
    assert!(!packet.has_written);
    assert_eq!(pair.client.local_ghosts().live_count(), 4);

    // the next one evicts the ghost the query left out
    let packet = pair.tick(&mut scope).unwrap();
    assert!(packet.has_written);
    assert_eq!(pair.client.local_ghosts().live_count(), 3);
    assert!(objects[0].ghost_connections().is_empty());
    assert!(pair.host.ghost_index(&objects[1]).is_some());
    assert!(pair.host.ghost_index(&always).is_some());
    assert_event_count!(log, GhostEvent::Removed { class_id: 0, .. }, 1);
    assert_table_consistent!(pair.host);
}

#[test]
fn closures_work_as_scope_providers() {
    let log = event_log();
    let mut pair = TestPair::started(TestProtocol::standard(&log));
    let mut registry = ObjectRegistry::new();
    let objects: Vec<_> = (0..3).map(|class| registry.spawn(TestObject::new(class))).collect();

    let mut scope = |query: &mut ScopeQuery| {
        assert_eq!(query.connection_key(), HOST_KEY);
        for object in objects.iter() {
            query.object_in_scope(object);
        }
    };
    pair.tick(&mut scope).unwrap();
    assert_eq!(pair.client.local_ghosts().live_count(), 3);
}

#[test]
fn non_ghostable_objects_are_skipped() {
    let log = event_log();
    let mut pair = TestPair::started(TestProtocol::standard(&log));
    let mut registry = ObjectRegistry::new();
    let object = registry.spawn(TestObject::new(1).not_ghostable());
    let mut scope = TestScope::with(&[object.clone()]);

    let packet = pair.tick(&mut scope).unwrap();
    assert!(!packet.has_written);
    assert!(pair.host.host().table().is_empty());
    assert!(object.ghost_connections().is_empty());
}

#[test]
fn disabling_ghost_from_clears_records() {
    let log = event_log();
    let mut pair = TestPair::started(TestProtocol::standard(&log));
    let mut registry = ObjectRegistry::new();
    let object = registry.spawn(TestObject::new(1));
    let mut scope = TestScope::with(&[object.clone()]);

    let packet = pair.send(&mut scope);
    pair.host.set_ghost_from(false);
    assert!(!pair.host.is_ghosting());
    assert!(pair.host.host().table().is_empty());
    assert!(object.ghost_connections().is_empty());

    // a late notification for a cleared session is harmless
    pair.host.notify_packet_delivered(packet.index);
    assert!(pair.host.host().table().is_empty());
}

#[test]
fn dropping_the_connection_releases_everything() {
    let log = event_log();
    let mut pair = TestPair::started(TestProtocol::standard(&log));
    let mut registry = ObjectRegistry::new();
    let object = registry.spawn(TestObject::new(7));
    let mut scope = TestScope::with(&[object.clone()]);
    pair.tick(&mut scope).unwrap();

    drop(pair);
    assert!(object.ghost_connections().is_empty());
    assert_event_count!(log, GhostEvent::Removed { class_id: 7, .. }, 1);
}

#[test]
fn class_stats_split_initial_and_partial_updates() {
    let log = event_log();
    let mut pair = TestPair::started(TestProtocol::standard(&log));
    let mut registry = ObjectRegistry::new();
    let object = registry.spawn(TestObject::new(2));
    let mut scope = TestScope::with(&[object.clone()]);

    pair.tick(&mut scope).unwrap();
    object.mark_dirty(DirtyMask::new(0b10));
    pair.tick(&mut scope).unwrap();

    let stats = pair.host.class_stats().get(2).copied().unwrap();
    assert_eq!(stats.initial_count, 1);
    assert_eq!(stats.initial_bits, 8 + 8 * 32);
    assert_eq!(stats.partial_count, 1);
    assert_eq!(stats.partial_bits, 8 + 32);
    assert!(pair.host.class_stats().get(3).is_none());
}
