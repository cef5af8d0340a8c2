// Copyright (c) 2024 Mike Tsao. All rights reserved.

use ensnare_jam::prelude::*;
use more_asserts::assert_le;

fn settings(capacity: usize) -> SessionSettings {
    let mut settings = SessionSettings::default();
    settings.set_capacity(capacity);
    settings
}

fn arrive(
    room: &mut LoopbackRoom,
    name: &str,
    instrument: InstrumentKind,
    capacity: usize,
) -> SessionMembershipManager {
    let arrival = room.connect(name).unwrap();
    let mut manager = SessionMembershipManager::new_with(arrival.id, settings(capacity));
    manager
        .request_join(instrument, arrival.remote_count)
        .unwrap();
    manager
}

fn semitones(manager: &SessionMembershipManager, owner: ParticipantId) -> Vec<i32> {
    manager
        .redirector(owner)
        .unwrap()
        .instrument()
        .recent_notes()
        .map(|n| n.semitone_offset)
        .collect()
}

// Two participants join a three-seat room; the first plays a key and the
// second hears it exactly once.
#[test]
fn two_participants_play_together() {
    let mut room = LoopbackRoom::new(3);
    let mut p1 = arrive(&mut room, "P1", InstrumentKind::QwertyGuitar, 3);
    assert_eq!(p1.join_status(), JoinStatus::Joined(SlotIndex(0)));
    room.settle(&mut [&mut p1]);

    let mut p2 = arrive(&mut room, "P2", InstrumentKind::QwertyPiano, 3);
    assert_eq!(
        p2.join_status(),
        JoinStatus::AwaitingAnnouncements {
            expected: 1,
            received: 0
        }
    );
    room.settle(&mut [&mut p1, &mut p2]);

    assert_eq!(p2.join_status(), JoinStatus::Joined(SlotIndex(1)));
    assert_eq!(p1.instrument_count(), 2);
    assert_eq!(p2.instrument_count(), 2);
    assert_eq!(
        p1.participant(p2.local_id()).unwrap().instrument,
        InstrumentKind::QwertyPiano
    );
    assert_eq!(
        p2.participant(p1.local_id()).unwrap().instrument,
        InstrumentKind::QwertyGuitar
    );

    let p1_id = p1.local_id();
    let local_sounds = p1.subscribe(p1_id).unwrap();
    let remote_sounds = p2.subscribe(p1_id).unwrap();

    p1.play(true, KeyId('a')).unwrap();
    let outbound: Vec<Message> = p1.outbound().try_iter().collect();
    assert_eq!(
        outbound,
        vec![Message::new(p1_id, MessageBody::Press(KeyId('a')))]
    );
    for message in &outbound {
        room.publish(message).unwrap();
    }
    room.settle(&mut [&mut p1, &mut p2]);

    let audio = |events: Vec<RouterEvent>| {
        events
            .into_iter()
            .filter(|e| matches!(e, RouterEvent::TriggerAudio { .. }))
            .count()
    };
    assert_eq!(audio(local_sounds.try_iter().collect()), 1);
    assert_eq!(audio(remote_sounds.try_iter().collect()), 1);
    assert_eq!(semitones(&p1, p1_id), vec![-12]);
    assert_eq!(semitones(&p2, p1_id), vec![-12]);
    assert_eq!(
        p2.redirector(p1_id).unwrap().instrument().key_state(KeyId('a')),
        KeyState::Pressed
    );
}

#[test]
fn every_seat_is_unique_and_the_next_arrival_is_turned_away() {
    const CAPACITY: usize = 3;
    let mut room = LoopbackRoom::new(CAPACITY);
    let mut managers = Vec::default();
    for name in ["a", "b", "c"] {
        managers.push(arrive(&mut room, name, InstrumentKind::QwertyPiano, CAPACITY));
        room.settle(&mut managers.iter_mut().collect::<Vec<_>>());
    }

    for manager in &managers {
        let slots: Vec<usize> = manager
            .participants()
            .iter()
            .map(|p| p.slot.unwrap().0)
            .collect();
        assert_eq!(slots, vec![0, 1, 2]);
    }

    let mut latecomer =
        SessionMembershipManager::new_with(ParticipantId(99), settings(CAPACITY));
    assert!(matches!(
        latecomer.request_join(InstrumentKind::QwertyPiano, CAPACITY),
        Err(JamError::SessionFull)
    ));
    assert!(matches!(room.connect("d"), Err(JamError::SessionFull)));
}

#[test]
fn simultaneous_arrivals_wait_for_each_other() {
    let mut room = LoopbackRoom::new(3);
    let mut a = arrive(&mut room, "a", InstrumentKind::QwertyGuitar, 3);
    let mut b = arrive(&mut room, "b", InstrumentKind::QwertyPiano, 3);
    // c arrives before b has heard anything, so it must wait for b too.
    let mut c = arrive(&mut room, "c", InstrumentKind::QwertyPiano, 3);
    room.settle(&mut [&mut a, &mut b, &mut c]);

    assert_eq!(a.join_status(), JoinStatus::Joined(SlotIndex(0)));
    assert_eq!(b.join_status(), JoinStatus::Joined(SlotIndex(1)));
    assert_eq!(c.join_status(), JoinStatus::Joined(SlotIndex(2)));
    for m in [&a, &b, &c] {
        assert_eq!(m.instrument_count(), 3);
    }
}

#[test]
fn a_visitor_coming_and_going_doesnt_disturb_waiting_joiners() {
    let mut room = LoopbackRoom::new(4);
    let mut a = arrive(&mut room, "a", InstrumentKind::QwertyGuitar, 4);
    let mut b = arrive(&mut room, "b", InstrumentKind::QwertyPiano, 4);
    let mut d = arrive(&mut room, "d", InstrumentKind::QwertyPiano, 4);
    // Nobody has heard an announcement yet when the visitor drops by.
    let visitor = room.connect("visitor").unwrap();
    room.disconnect(visitor.id);
    room.settle(&mut [&mut a, &mut b, &mut d]);

    assert_eq!(a.join_status(), JoinStatus::Joined(SlotIndex(0)));
    assert_eq!(b.join_status(), JoinStatus::Joined(SlotIndex(1)));
    assert_eq!(d.join_status(), JoinStatus::Joined(SlotIndex(2)));
    for m in [&a, &b, &d] {
        assert_eq!(m.instrument_count(), 3);
    }
}

#[test]
fn spectating_mirrors_visuals_without_sound_or_history() {
    let mut room = LoopbackRoom::new(3);
    let mut a = arrive(&mut room, "a", InstrumentKind::QwertyGuitar, 3);
    room.settle(&mut [&mut a]);
    let mut b = arrive(&mut room, "b", InstrumentKind::QwertyPiano, 3);
    room.settle(&mut [&mut a, &mut b]);

    let (a_id, b_id) = (a.local_id(), b.local_id());
    let b_local = b.subscribe(b_id).unwrap();

    a.play(true, KeyId('z')).unwrap();
    room.settle(&mut [&mut a, &mut b]);
    assert!(
        b_local.try_recv().is_err(),
        "b isn't spectating, so its own instrument stays untouched"
    );

    b.spectate(Some(a_id)).unwrap();
    a.play(false, KeyId('z')).unwrap();
    a.play(true, KeyId('x')).unwrap();
    room.settle(&mut [&mut a, &mut b]);

    let events: Vec<RouterEvent> = b_local.try_iter().collect();
    assert!(events
        .iter()
        .all(|e| matches!(e, RouterEvent::Visual { .. })));
    assert_eq!(events.len(), 2);
    assert!(semitones(&b, b_id).is_empty());
    assert_eq!(semitones(&b, a_id), vec![-12, -10]);

    b.spectate(None).unwrap();
    a.play(false, KeyId('x')).unwrap();
    room.settle(&mut [&mut a, &mut b]);
    assert!(b_local.try_recv().is_err());
}

#[test]
fn history_of_a_remote_instrument_is_bounded() {
    let mut room = LoopbackRoom::new(2);
    let mut a = arrive(&mut room, "a", InstrumentKind::QwertyPiano, 2);
    room.settle(&mut [&mut a]);
    let mut b = arrive(&mut room, "b", InstrumentKind::QwertyPiano, 2);
    room.settle(&mut [&mut a, &mut b]);

    for c in "zxcvbn".chars() {
        a.handle_key(KeyId(c), true).unwrap();
        a.handle_key(KeyId(c), false).unwrap();
    }
    room.settle(&mut [&mut a, &mut b]);

    let expected = vec![-10, -8, -7, -5, -3];
    assert_eq!(semitones(&a, a.local_id()), expected);
    assert_eq!(semitones(&b, a.local_id()), expected);
    assert_le!(semitones(&b, a.local_id()).len(), RECENT_NOTE_CAPACITY);
}

#[test]
fn octave_changes_reach_late_joiners() {
    let mut room = LoopbackRoom::new(3);
    let mut a = arrive(&mut room, "a", InstrumentKind::QwertyPiano, 3);
    a.handle_key(KeyId('['), true).unwrap();
    room.settle(&mut [&mut a]);

    let mut b = arrive(&mut room, "b", InstrumentKind::QwertyPiano, 3);
    room.settle(&mut [&mut a, &mut b]);
    assert_eq!(
        b.redirector(a.local_id())
            .unwrap()
            .instrument()
            .parameters()
            .octave,
        -1
    );
}

#[test]
fn departed_participants_free_their_seat_and_go_quiet() {
    let mut room = LoopbackRoom::new(3);
    let mut a = arrive(&mut room, "a", InstrumentKind::QwertyPiano, 3);
    room.settle(&mut [&mut a]);
    let mut b = arrive(&mut room, "b", InstrumentKind::QwertyGuitar, 3);
    room.settle(&mut [&mut a, &mut b]);
    let (a_id, b_id) = (a.local_id(), b.local_id());
    a.spectate(Some(b_id)).unwrap();
    let a_local = a.subscribe(a_id).unwrap();

    // b's last press reaches a ahead of the departure.
    b.play(true, KeyId('z')).unwrap();
    room.pump(&mut b);
    room.disconnect(b_id);
    room.settle(&mut [&mut a]);
    assert!(a_local
        .try_iter()
        .any(|e| matches!(e, RouterEvent::Visual { cue: VisualCue::Highlight, .. })));

    room.inject(
        a_id,
        Message::new(b_id, MessageBody::Press(KeyId('x')))
            .encode()
            .unwrap(),
    );
    room.settle(&mut [&mut a]);
    assert!(
        a_local.try_recv().is_err(),
        "a departed sender's press changes nothing"
    );
    assert!(semitones(&a, a_id).is_empty());

    assert_eq!(a.instrument_count(), 1);
    assert_eq!(a.slot_of(b_id), None);
    assert_eq!(a.redirector(a.local_id()).unwrap().spectate_target(), None);

    let mut c = arrive(&mut room, "c", InstrumentKind::QwertyPiano, 3);
    room.settle(&mut [&mut a, &mut c]);
    assert_eq!(c.join_status(), JoinStatus::Joined(SlotIndex(1)));
}

#[test]
fn duplicate_and_malformed_frames_are_harmless() {
    let mut room = LoopbackRoom::new(3);
    let mut a = arrive(&mut room, "a", InstrumentKind::QwertyPiano, 3);
    room.settle(&mut [&mut a]);
    let mut b = arrive(&mut room, "b", InstrumentKind::QwertyGuitar, 3);
    room.settle(&mut [&mut a, &mut b]);

    let announce = Message::new(
        b.local_id(),
        MessageBody::Announce(Announcement {
            instrument: InstrumentKind::QwertyGuitar,
            slot: SlotIndex(1),
        }),
    )
    .encode()
    .unwrap();
    room.inject(a.local_id(), announce);
    room.inject(a.local_id(), b"garbage".to_vec());
    room.inject(
        a.local_id(),
        Message::new(b.local_id(), MessageBody::Press(KeyId('z')))
            .encode()
            .unwrap(),
    );
    room.settle(&mut [&mut a, &mut b]);

    assert_eq!(a.instrument_count(), 2);
    assert_eq!(semitones(&a, b.local_id()), vec![-12]);
}
