// Copyright (c) 2024 Mike Tsao. All rights reserved.

//! Runs a small jam session entirely in-process and logs what each participant
//! sees. Set RUST_LOG=info (or debug) to watch the protocol work.
//!
//! Usage: `jam-session [settings.json]`

use anyhow::anyhow;
use ensnare_jam::prelude::*;
use std::path::PathBuf;

struct Seat {
    name: &'static str,
    instrument: InstrumentKind,
}

const SEATS: [Seat; 3] = [
    Seat {
        name: "Ada",
        instrument: InstrumentKind::QwertyGuitar,
    },
    Seat {
        name: "Brian",
        instrument: InstrumentKind::QwertyPiano,
    },
    Seat {
        name: "Chloe",
        instrument: InstrumentKind::QwertyPiano,
    },
];

fn load_settings() -> anyhow::Result<SessionSettings> {
    match std::env::args().nth(1) {
        Some(path) => SessionSettings::load(&PathBuf::from(path)),
        None => Ok(SessionSettings::default()),
    }
}

fn settings_for(base: &SessionSettings, seat: &Seat) -> anyhow::Result<SessionSettings> {
    let mut settings = SessionSettings::from_json(&base.to_json()?)?;
    settings.set_display_name(seat.name);
    settings.set_instrument(seat.instrument);
    Ok(settings)
}

fn report(manager: &SessionMembershipManager) {
    for event in manager.events().try_iter() {
        log::info!("[{}] {event:?}", manager.local_id());
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let base = load_settings()?;
    let mut room = LoopbackRoom::new(base.capacity());

    let mut managers = Vec::default();
    for seat in SEATS.iter().take(base.capacity()) {
        let arrival = room.connect(seat.name)?;
        let settings = settings_for(&base, seat)?;
        let mut manager = SessionMembershipManager::new_with(arrival.id, settings);
        let status = manager.request_join(seat.instrument, arrival.remote_count)?;
        log::info!("{} arrived as {}: {status:?}", seat.name, arrival.id);
        managers.push(manager);
        room.settle(&mut managers.iter_mut().collect::<Vec<_>>());
    }
    managers.iter().for_each(report);

    let first = managers
        .first()
        .map(|m| m.local_id())
        .ok_or_else(|| anyhow!("nobody joined"))?;
    let viz = managers
        .get_mut(1)
        .and_then(|m| m.subscribe(first))
        .ok_or_else(|| anyhow!("second participant can't see the first"))?;

    if let Some(last) = managers.last_mut() {
        if last.local_id() != first {
            last.spectate(Some(first))?;
        }
    }

    if let Some(leader) = managers.first_mut() {
        for c in "zxcvb".chars() {
            leader.handle_key(KeyId(c), true)?;
            leader.handle_key(KeyId(c), false)?;
        }
        leader.handle_key(KeyId(']'), true)?;
        leader.handle_key(KeyId('a'), true)?;
    }
    room.settle(&mut managers.iter_mut().collect::<Vec<_>>());

    for event in viz.try_iter() {
        if let RouterEvent::NoteDown(note) = event {
            log::info!("Remote copy of {first} played semitone {}", note.semitone_offset);
        }
    }
    for manager in &managers {
        if let Some(redirector) = manager.redirector(first) {
            let recent: Vec<i32> = redirector
                .instrument()
                .recent_notes()
                .map(|n| n.semitone_offset)
                .collect();
            println!(
                "{} sees {first} at octave {} with recent notes {recent:?}",
                manager.local_id(),
                redirector.instrument().parameters().octave,
            );
        }
    }

    // The second participant leaves; a newcomer takes the freed seat.
    if managers.len() > 1 {
        let departed = managers.remove(1);
        room.disconnect(departed.local_id());
        room.settle(&mut managers.iter_mut().collect::<Vec<_>>());

        let arrival = room.connect("Dmitri")?;
        let mut newcomer = SessionMembershipManager::new_with(
            arrival.id,
            settings_for(
                &base,
                &Seat {
                    name: "Dmitri",
                    instrument: InstrumentKind::QwertyGuitar,
                },
            )?,
        );
        newcomer.request_join(InstrumentKind::QwertyGuitar, arrival.remote_count)?;
        managers.push(newcomer);
        room.settle(&mut managers.iter_mut().collect::<Vec<_>>());
    }

    for manager in &managers {
        report(manager);
        let seats: Vec<String> = manager
            .participants()
            .iter()
            .map(|p| format!("{}@{:?}", p.display_name, p.slot))
            .collect();
        println!("{} sees {}", manager.local_id(), seats.join(", "));
    }
    Ok(())
}
