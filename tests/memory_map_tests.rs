//! Memory Map Tests
//!
//! Walks a hand-built image and checks the decoded events and the listing.

mod common;

use common::{sim_memory_with, IMAGE_LEN};
use r71_programmer::drivers::r71_memory::SequentialMemory;
use r71_programmer::memory_map::{render_event, MapEvent, MemoryMap};
use r71_programmer::types::{Address, ChannelSlot, Mode};

const OFFSETS: usize = 0x010;
const LIMITS: usize = 0x02D;
const CHANNELS: usize = 0x12A;

fn put(image: &mut [u8; IMAGE_LEN], at: usize, nibbles: &[u8]) {
    image[at..at + nibbles.len()].copy_from_slice(nibbles);
}

fn put_channel(image: &mut [u8; IMAGE_LEN], index: usize, mode: u8, freq: [u8; 9]) {
    let at = CHANNELS + index * 18;
    put(image, at, &[0; 8]);
    image[at + 8] = mode;
    put(image, at + 9, &freq);
}

/// Unprogrammed RAM (all F) with a few interesting entries
fn sample_image() -> [u8; IMAGE_LEN] {
    let mut image = [0xF; IMAGE_LEN];

    // LSB +2.5, USB 0.0, AM -7.9, CW +1.3, RTTY -0.0
    put(&mut image, OFFSETS, &[5, 2, 0, 0, 9, 0xF, 3, 1, 0, 8]);

    // 0.1 MHz .. 30 MHz
    put(&mut image, LIMITS, &[0, 0, 0, 0, 1, 0, 0, 0, 0]);
    put(&mut image, LIMITS + 9, &[0, 0, 0, 0, 0, 0, 3, 0, 0]);

    put_channel(&mut image, 0, 0, [0, 0, 0, 0, 0, 4, 1, 0, 0]); // VFO A, LSB
    put_channel(&mut image, 1, 2, [0, 0, 0, 0, 0, 4, 1, 0, 0]); // VFO B, AM
    put_channel(&mut image, 2, 5, [0xF, 0, 0, 0, 0, 0, 0, 0, 0]); // MEM 1, blank
    put_channel(&mut image, 3, 5, [0, 0, 0, 0, 0, 7, 0, 0, 0]); // MEM 2, FM
    put_channel(&mut image, 4, 9, [0, 9, 9, 9, 9, 4, 1, 0, 0]); // MEM 3, unknown mode
    image
}

fn walk(image: [u8; IMAGE_LEN]) -> (Vec<MapEvent>, MemoryMap, Address) {
    let (_chip, mut memory) = sim_memory_with(image);
    memory.enter_read_mode();
    memory.reset();

    let mut map = MemoryMap::new();
    let mut events = Vec::new();
    map.walk(&mut memory, |event| {
        events.push(*event);
        Ok::<(), ()>(())
    })
    .unwrap();
    (events, map, memory.position())
}

fn channel(event: &MapEvent) -> &r71_programmer::memory_map::ChannelRecord {
    match event {
        MapEvent::Channel(record) => record,
        other => panic!("expected a channel, got {other:?}"),
    }
}

// ============================================================================
// Walk
// ============================================================================

#[test]
fn test_walk_event_order() {
    let (events, _map, end) = walk(sample_image());

    assert_eq!(events.len(), 5 + 1 + 34);
    assert!(matches!(events[0], MapEvent::Offset { mode: Mode::Lsb, .. }));
    assert!(matches!(events[4], MapEvent::Offset { mode: Mode::Rtty, .. }));
    assert!(matches!(events[5], MapEvent::BandLimits { .. }));
    assert_eq!(channel(&events[6]).slot, ChannelSlot::VfoA);
    assert_eq!(channel(&events[39]).slot, ChannelSlot::Memory(32));
    assert_eq!(end, Address::END);
}

#[test]
fn test_walk_offsets() {
    let (events, map, _) = walk(sample_image());

    let values: Vec<i16> = events[..5]
        .iter()
        .map(|e| match e {
            MapEvent::Offset { offset, .. } => offset.tenths_khz(),
            other => panic!("expected an offset, got {other:?}"),
        })
        .collect();
    assert_eq!(values, [25, 0, -79, 13, 0]);

    assert_eq!(map.offsets().get(Some(Mode::Am)).tenths_khz(), -79);
    assert_eq!(map.offsets().get(Some(Mode::Fm)).tenths_khz(), 0);
}

#[test]
fn test_walk_band_limits() {
    let (events, _, _) = walk(sample_image());
    let MapEvent::BandLimits { low, high } = events[5] else {
        panic!("expected band limits");
    };
    assert_eq!(low.map(|f| f.as_hz()), Some(100_000));
    assert_eq!(high.map(|f| f.as_hz()), Some(30_000_000));
}

#[test]
fn test_band_limits_ignore_offsets() {
    let mut image = sample_image();
    // Every offset table entry at +7.9
    put(&mut image, OFFSETS, &[9, 7, 9, 7, 9, 7, 9, 7, 9, 7]);
    let (events, _, _) = walk(image);
    let MapEvent::BandLimits { low, .. } = events[5] else {
        panic!("expected band limits");
    };
    assert_eq!(low.map(|f| f.as_hz()), Some(100_000));
}

#[test]
fn test_walk_channels_apply_mode_offset() {
    let (events, _, _) = walk(sample_image());

    let vfo_a = channel(&events[6]);
    assert_eq!(vfo_a.mode, Some(Mode::Lsb));
    assert_eq!(vfo_a.frequency.unwrap().to_string(), "14 002.50");

    let vfo_b = channel(&events[7]);
    assert_eq!(vfo_b.mode, Some(Mode::Am));
    assert_eq!(vfo_b.frequency.unwrap().to_string(), "13 992.10");
}

#[test]
fn test_walk_blank_fm_and_unknown() {
    let (events, _, _) = walk(sample_image());

    let mem1 = channel(&events[8]);
    assert_eq!(mem1.slot, ChannelSlot::Memory(1));
    assert!(mem1.frequency.is_none());

    let mem2 = channel(&events[9]);
    assert_eq!(mem2.mode, Some(Mode::Fm));
    assert_eq!(mem2.frequency.unwrap().to_string(), " 7 000.00");

    let mem3 = channel(&events[10]);
    assert_eq!(mem3.mode, None);
    assert_eq!(mem3.mode_nibble.value(), 9);
    assert_eq!(mem3.frequency.unwrap().to_string(), "14 999.90");

    // Unprogrammed channels read all F
    let mem32 = channel(&events[39]);
    assert!(mem32.frequency.is_none());
    assert_eq!(mem32.mode, None);
}

#[test]
fn test_walk_stops_on_callback_error() {
    let (_chip, mut memory) = sim_memory_with(sample_image());
    memory.enter_read_mode();
    memory.reset();

    let mut seen = 0;
    let result = MemoryMap::new().walk(&mut memory, |event| {
        seen += 1;
        match event {
            MapEvent::BandLimits { .. } => Err("stop"),
            _ => Ok(()),
        }
    });

    assert_eq!(result, Err("stop"));
    assert_eq!(seen, 6);
    assert_eq!(memory.position(), Address::new((LIMITS + 18) as u16));
}

// ============================================================================
// Listing
// ============================================================================

fn listing(image: [u8; IMAGE_LEN]) -> String {
    let (events, _, _) = walk(image);
    let mut out = String::new();
    for event in &events {
        render_event(&mut out, event).unwrap();
    }
    out
}

#[test]
fn test_listing_offsets() {
    let out = listing(sample_image());
    let expected = concat!(
        "LSB  Offset:  2.5 kHz   ",
        "USB  Offset:  0.0 kHz   ",
        "AM   Offset: -7.9 kHz   \r\n",
        "CW   Offset:  1.3 kHz   ",
        "RTTY Offset:  0.0 kHz   \r\n\r\n",
    );
    assert!(out.starts_with(expected), "{out}");
}

#[test]
fn test_listing_band_limits() {
    let out = listing(sample_image());
    let expected = concat!(
        "LLimit:  0 100.00 kHz ",
        "      ",
        "HLimit: 30 000.00 kHz ",
        "\r\n\r\n",
    );
    assert!(out.contains(expected), "{out}");
}

#[test]
fn test_listing_channel_rows() {
    let out = listing(sample_image());
    assert!(out.contains("VFO  A: 14 002.50 kHz LSB   VFO  B: 13 992.10 kHz AM  \r\n"));
    assert!(out.contains("MEM 01: BLANK             FM    MEM 02:  7 000.00 kHz FM  \r\n"));
    assert!(out.contains("MEM 03: 14 999.90 kHz   MEM 04: BLANK             \r\n"));
    assert!(out.ends_with("MEM 31: BLANK               MEM 32: BLANK             \r\n"));
}

#[test]
fn test_listing_row_count() {
    let out = listing(sample_image());
    // offset rows (3), band limits (2), channel rows (17)
    assert_eq!(out.matches("\r\n").count(), 3 + 2 + 17);
}
