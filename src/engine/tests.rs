use std::{cell::RefCell, cmp::min, collections::VecDeque};

use crate::event::{Rel, RelEvent};
use crate::state::SlotAxes;

use super::*;

/// A scripted kernel: `read(2)` pulls from a queue of raw records, the refetch ioctls return
/// whatever state the test planted.
#[derive(Default)]
struct MockKernel {
    raw: RefCell<VecDeque<InputEvent>>,
    /// Records that "arrive" while a blocking read waits.
    on_wait: RefCell<Vec<InputEvent>>,
    keys: BitSet<Key>,
    leds: BitSet<Led>,
    switches: BitSet<Switch>,
    abs: Vec<(Abs, i32)>,
    slots: Vec<(Abs, Vec<i32>)>,
    current_slot: i32,
    rep: Option<KeyRepeat>,
    fail_keys: bool,
    fail_slots: bool,
}

impl MockKernel {
    fn feed(&mut self, events: impl IntoIterator<Item = InputEvent>) {
        self.raw.get_mut().extend(events);
    }
}

fn unsupported() -> io::Error {
    io::Error::from(io::ErrorKind::Unsupported)
}

impl KernelOps for MockKernel {
    fn read_events(&mut self, dest: &mut [InputEvent]) -> io::Result<usize> {
        let raw = self.raw.get_mut();
        let n = min(dest.len(), raw.len());
        if n == 0 {
            return Err(io::Error::from(io::ErrorKind::WouldBlock));
        }
        for slot in &mut dest[..n] {
            *slot = raw.pop_front().unwrap();
        }
        Ok(n)
    }

    fn fetch_keys(&self) -> io::Result<BitSet<Key>> {
        if self.fail_keys {
            return Err(unsupported());
        }
        Ok(self.keys)
    }

    fn fetch_leds(&self) -> io::Result<BitSet<Led>> {
        Ok(self.leds)
    }

    fn fetch_switches(&self) -> io::Result<BitSet<Switch>> {
        Ok(self.switches)
    }

    fn fetch_abs(&self, abs: Abs) -> io::Result<AbsInfo> {
        if abs == Abs::MT_SLOT {
            return Ok(AbsInfo::new(0, 59).with_value(self.current_slot));
        }
        let value = self
            .abs
            .iter()
            .find(|(code, _)| *code == abs)
            .map_or(0, |(_, value)| *value);
        Ok(AbsInfo::new(0, 4096).with_value(value))
    }

    fn fetch_slots(&self, code: Abs, nslots: usize) -> io::Result<Vec<i32>> {
        if self.fail_slots {
            return Err(unsupported());
        }
        let row = self
            .slots
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, row)| row.clone())
            .unwrap_or_else(|| vec![0; nslots]);
        assert_eq!(row.len(), nslots, "test kernel row size mismatch for {code:?}");
        Ok(row)
    }

    fn fetch_repeat(&self) -> io::Result<Option<KeyRepeat>> {
        Ok(self.rep)
    }

    fn poll_readable(&self) -> io::Result<bool> {
        Ok(!self.raw.borrow().is_empty())
    }

    fn wait_readable(&self) -> io::Result<()> {
        let arrived = std::mem::take(&mut *self.on_wait.borrow_mut());
        assert!(!arrived.is_empty(), "blocking wait would never wake up");
        self.raw.borrow_mut().extend(arrived);
        Ok(())
    }
}

fn engine(setup: impl FnOnce(&mut Capabilities, &mut DeviceState)) -> Engine {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut caps = Capabilities::new();
    caps.types.insert(EventType::SYN);
    let mut state = DeviceState::new();
    setup(&mut caps, &mut state);
    Engine::new(caps, state)
}

/// A keyboard-ish device: KEY_A and KEY_B supported, nothing pressed.
fn key_engine() -> Engine {
    engine(|caps, _| {
        caps.types.insert(EventType::KEY);
        caps.keys.insert(Key::KEY_A);
        caps.keys.insert(Key::KEY_B);
    })
}

/// A touch-ish device with `nslots` slots tracking `codes` (ascending), everything zeroed.
fn mt_engine(codes: &[Abs], nslots: usize) -> Engine {
    engine(|caps, state| {
        caps.types.insert(EventType::ABS);
        caps.abs.insert(Abs::MT_SLOT);
        for &code in codes {
            caps.abs.insert(code);
        }
        state.slots = SlotAxes::with_layout(codes.to_vec(), nslots);
    })
}

fn report() -> InputEvent {
    SynEvent::new(Syn::REPORT).into()
}

fn dropped() -> InputEvent {
    SynEvent::new(Syn::DROPPED).into()
}

fn key(k: Key, pressed: bool) -> InputEvent {
    KeyEvent::new(k, if pressed { KeyState::PRESSED } else { KeyState::RELEASED }).into()
}

fn abs(code: Abs, value: i32) -> InputEvent {
    AbsEvent::new(code, value).into()
}

fn events_eq(actual: &InputEvent, expected: &InputEvent) -> bool {
    actual.event_type() == expected.event_type()
        && actual.raw_code() == expected.raw_code()
        // SYN values carry no meaning.
        && (actual.event_type() == EventType::SYN || actual.raw_value() == expected.raw_value())
}

#[track_caller]
fn check_events(actual: &[InputEvent], expected: &[InputEvent]) {
    let matches = actual.len() == expected.len()
        && actual.iter().zip(expected).all(|(a, b)| events_eq(a, b));
    assert!(matches, "expected {expected:?}, got {actual:?}");
}

/// Reads sync-mode records until the engine reports the queue empty.
#[track_caller]
fn drain_sync(engine: &mut Engine, kernel: &mut MockKernel) -> Vec<InputEvent> {
    let mut out = Vec::new();
    loop {
        match engine.next_event(kernel, ReadFlags::SYNC) {
            Ok((status, ev)) => {
                assert_eq!(status, ReadStatus::Sync);
                out.push(ev);
            }
            Err(e) => {
                assert_eq!(e.kind(), io::ErrorKind::WouldBlock);
                return out;
            }
        }
    }
}

#[track_caller]
fn expect_dropped(engine: &mut Engine, kernel: &mut MockKernel, flags: ReadFlags) {
    let (status, ev) = engine.next_event(kernel, flags).unwrap();
    assert_eq!(status, ReadStatus::Sync);
    assert_eq!(ev.event_type(), EventType::SYN);
    assert_eq!(Syn::from_raw(ev.raw_code()), Syn::DROPPED);
}

#[test]
fn steady_key_press() {
    let mut engine = key_engine();
    let mut kernel = MockKernel::default();
    kernel.feed([key(Key::KEY_A, true), report()]);

    let (status, ev) = engine.next_event(&mut kernel, ReadFlags::NORMAL).unwrap();
    assert_eq!(status, ReadStatus::Success);
    check_events(&[ev], &[key(Key::KEY_A, true)]);
    assert_eq!(engine.event_value(Key::KEY_A.into()), 1);

    let (status, ev) = engine.next_event(&mut kernel, ReadFlags::NORMAL).unwrap();
    assert_eq!(status, ReadStatus::Success);
    check_events(&[ev], &[report()]);

    let err = engine.next_event(&mut kernel, ReadFlags::NORMAL).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::WouldBlock);
}

#[test]
fn simple_drop_resyncs_key_state() {
    let mut engine = key_engine();
    engine.state.keys.insert(Key::KEY_A);
    let mut kernel = MockKernel::default(); // kernel says: nothing pressed anymore
    kernel.feed([dropped()]);

    expect_dropped(&mut engine, &mut kernel, ReadFlags::NORMAL);
    // The cache is still pre-drop until the sync runs.
    assert_eq!(engine.event_value(Key::KEY_A.into()), 1);

    let deltas = drain_sync(&mut engine, &mut kernel);
    check_events(&deltas, &[key(Key::KEY_A, false), report()]);
    assert_eq!(engine.event_value(Key::KEY_A.into()), 0);

    let err = engine.next_event(&mut kernel, ReadFlags::NORMAL).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::WouldBlock);
}

#[test]
fn sync_flag_without_pending_sync_reads_normally() {
    let mut engine = key_engine();
    let mut kernel = MockKernel::default();
    kernel.feed([key(Key::KEY_B, true), report()]);

    let (status, ev) = engine.next_event(&mut kernel, ReadFlags::SYNC).unwrap();
    assert_eq!(status, ReadStatus::Success);
    check_events(&[ev], &[key(Key::KEY_B, true)]);
}

#[test]
fn two_slot_touch_swap() {
    let mut engine = mt_engine(&[Abs::MT_TRACKING_ID], 2);
    engine.state.slots.set(0, Abs::MT_TRACKING_ID, 7);
    engine.state.slots.set(1, Abs::MT_TRACKING_ID, -1);

    let mut kernel = MockKernel::default();
    kernel.slots = vec![(Abs::MT_TRACKING_ID, vec![-1, 9])];
    kernel.current_slot = 1;
    kernel.feed([dropped()]);

    expect_dropped(&mut engine, &mut kernel, ReadFlags::NORMAL);
    let deltas = drain_sync(&mut engine, &mut kernel);
    check_events(
        &deltas,
        &[
            abs(Abs::MT_SLOT, 0),
            abs(Abs::MT_TRACKING_ID, -1),
            abs(Abs::MT_SLOT, 1),
            abs(Abs::MT_TRACKING_ID, 9),
            report(),
        ],
    );
    assert_eq!(engine.current_slot(), 1);
    assert_eq!(engine.slot_value(0, Abs::MT_TRACKING_ID), -1);
    assert_eq!(engine.slot_value(1, Abs::MT_TRACKING_ID), 9);
}

#[test]
fn slot_replaced_mid_drop() {
    let mut engine = mt_engine(&[Abs::MT_POSITION_X, Abs::MT_TRACKING_ID], 1);
    engine.state.slots.set(0, Abs::MT_POSITION_X, 100);
    engine.state.slots.set(0, Abs::MT_TRACKING_ID, 5);

    let mut kernel = MockKernel::default();
    kernel.slots = vec![
        (Abs::MT_POSITION_X, vec![200]),
        (Abs::MT_TRACKING_ID, vec![11]),
    ];
    kernel.feed([dropped()]);

    expect_dropped(&mut engine, &mut kernel, ReadFlags::NORMAL);
    let deltas = drain_sync(&mut engine, &mut kernel);
    check_events(
        &deltas,
        &[
            abs(Abs::MT_SLOT, 0),
            abs(Abs::MT_TRACKING_ID, -1),
            abs(Abs::MT_TRACKING_ID, 11),
            abs(Abs::MT_POSITION_X, 200),
            report(),
        ],
    );
}

#[test]
fn touch_end_emits_tracking_id_last() {
    let mut engine = mt_engine(&[Abs::MT_POSITION_X, Abs::MT_TRACKING_ID], 1);
    engine.state.slots.set(0, Abs::MT_POSITION_X, 100);
    engine.state.slots.set(0, Abs::MT_TRACKING_ID, 5);

    let mut kernel = MockKernel::default();
    kernel.slots = vec![
        (Abs::MT_POSITION_X, vec![130]),
        (Abs::MT_TRACKING_ID, vec![-1]),
    ];
    kernel.feed([dropped()]);

    expect_dropped(&mut engine, &mut kernel, ReadFlags::NORMAL);
    let deltas = drain_sync(&mut engine, &mut kernel);
    check_events(
        &deltas,
        &[
            abs(Abs::MT_SLOT, 0),
            abs(Abs::MT_POSITION_X, 130),
            abs(Abs::MT_TRACKING_ID, -1),
            report(),
        ],
    );
}

#[test]
fn trailing_slot_select_restores_true_current_slot() {
    let mut engine = mt_engine(&[Abs::MT_TRACKING_ID], 3);
    engine.state.slots.set(1, Abs::MT_TRACKING_ID, -1);
    engine.state.slots.set(2, Abs::MT_TRACKING_ID, -1);

    let mut kernel = MockKernel::default();
    // Only slot 1 changes, but the device currently points at slot 2.
    kernel.slots = vec![(Abs::MT_TRACKING_ID, vec![0, 4, -1])];
    kernel.current_slot = 2;
    kernel.feed([dropped()]);

    expect_dropped(&mut engine, &mut kernel, ReadFlags::NORMAL);
    let deltas = drain_sync(&mut engine, &mut kernel);
    check_events(
        &deltas,
        &[
            abs(Abs::MT_SLOT, 1),
            abs(Abs::MT_TRACKING_ID, 4),
            abs(Abs::MT_SLOT, 2),
            report(),
        ],
    );
    assert_eq!(engine.current_slot(), 2);
}

#[test]
fn force_sync_reconciles_axis_change() {
    let mut engine = engine(|caps, state| {
        caps.types.insert(EventType::ABS);
        caps.abs.insert(Abs::X);
        state.abs[Abs::X.raw() as usize] = 50;
    });
    let mut kernel = MockKernel::default();
    kernel.abs = vec![(Abs::X, 75)];

    expect_dropped(&mut engine, &mut kernel, ReadFlags::FORCE_SYNC);
    let deltas = drain_sync(&mut engine, &mut kernel);
    check_events(&deltas, &[abs(Abs::X, 75), report()]);
    assert_eq!(engine.event_value(Abs::X.into()), 75);
}

#[test]
fn force_sync_without_changes_is_just_a_frame() {
    let mut engine = key_engine();
    let mut kernel = MockKernel::default();

    expect_dropped(&mut engine, &mut kernel, ReadFlags::FORCE_SYNC);
    let deltas = drain_sync(&mut engine, &mut kernel);
    check_events(&deltas, &[report()]);
}

#[test]
fn ignored_sync_updates_state_silently() {
    let mut engine = engine(|caps, state| {
        caps.types.insert(EventType::KEY);
        caps.types.insert(EventType::REL);
        caps.keys.insert(Key::KEY_A);
        caps.rels.insert(Rel::X);
        state.keys.insert(Key::KEY_A);
    });
    let mut kernel = MockKernel::default(); // nothing pressed kernel-side
    kernel.feed([dropped(), RelEvent::new(Rel::X, 3).into(), report()]);

    expect_dropped(&mut engine, &mut kernel, ReadFlags::NORMAL);

    // The caller ignores the sync and keeps reading normally: the next true event comes
    // through, and the cache has been brought up to date without delta delivery.
    let (status, ev) = engine.next_event(&mut kernel, ReadFlags::NORMAL).unwrap();
    assert_eq!(status, ReadStatus::Success);
    check_events(&[ev], &[RelEvent::new(Rel::X, 3).into()]);
    assert_eq!(engine.event_value(Key::KEY_A.into()), 0);
}

#[test]
fn disabled_codes_are_filtered() {
    let mut engine = key_engine();
    engine.disable_event_code(Key::KEY_B.into()).unwrap();
    let mut kernel = MockKernel::default();
    kernel.feed([key(Key::KEY_B, true), key(Key::KEY_A, true), report()]);

    let (_, ev) = engine.next_event(&mut kernel, ReadFlags::NORMAL).unwrap();
    check_events(&[ev], &[key(Key::KEY_A, true)]);
    assert_eq!(engine.event_value(Key::KEY_B.into()), 0);
}

#[test]
fn degraded_resync_skips_failing_category() {
    let mut engine = engine(|caps, state| {
        caps.types.insert(EventType::KEY);
        caps.types.insert(EventType::LED);
        caps.keys.insert(Key::KEY_A);
        caps.leds.insert(Led::NUML);
        state.keys.insert(Key::KEY_A);
    });
    let mut kernel = MockKernel::default();
    kernel.fail_keys = true;
    kernel.leds.insert(Led::NUML);
    kernel.feed([dropped()]);

    expect_dropped(&mut engine, &mut kernel, ReadFlags::NORMAL);
    let deltas = drain_sync(&mut engine, &mut kernel);
    // Keys couldn't be refetched: the category is skipped, the sync still terminates.
    check_events(&deltas, &[LedEvent::new(Led::NUML, true).into(), report()]);
    assert_eq!(engine.event_value(Key::KEY_A.into()), 1);
    assert_eq!(engine.event_value(Led::NUML.into()), 1);
}

#[test]
fn failing_slot_refetch_keeps_mt_state() {
    let mut engine = mt_engine(&[Abs::MT_TRACKING_ID], 2);
    engine.state.slots.set(0, Abs::MT_TRACKING_ID, 3);
    let mut kernel = MockKernel::default();
    kernel.fail_slots = true;
    kernel.feed([dropped()]);

    expect_dropped(&mut engine, &mut kernel, ReadFlags::NORMAL);
    let deltas = drain_sync(&mut engine, &mut kernel);
    check_events(&deltas, &[report()]);
    assert_eq!(engine.slot_value(0, Abs::MT_TRACKING_ID), 3);
}

#[test]
fn repeat_change_emits_both_parameters() {
    let mut engine = engine(|caps, state| {
        caps.types.insert(EventType::REP);
        state.rep = Some(KeyRepeat::new(250, 33));
    });
    let mut kernel = MockKernel::default();
    kernel.rep = Some(KeyRepeat::new(500, 30));
    kernel.feed([dropped()]);

    expect_dropped(&mut engine, &mut kernel, ReadFlags::NORMAL);
    let deltas = drain_sync(&mut engine, &mut kernel);
    check_events(
        &deltas,
        &[
            RepeatEvent::new(Repeat::DELAY, 500).into(),
            RepeatEvent::new(Repeat::PERIOD, 30).into(),
            report(),
        ],
    );
    assert_eq!(engine.key_repeat(), Some(KeyRepeat::new(500, 30)));
}

#[test]
fn resync_only_walks_the_slot_ceiling() {
    // A device reporting 70 slots gets clamped to 60; the refetch must agree with the table.
    let mut engine = mt_engine(&[Abs::MT_TRACKING_ID], 70);
    assert_eq!(engine.num_slots(), 60);
    engine.state.slots.set(59, Abs::MT_TRACKING_ID, -1);

    let mut kernel = MockKernel::default();
    let mut row = vec![0; 60];
    row[59] = 21;
    kernel.slots = vec![(Abs::MT_TRACKING_ID, row)];
    kernel.feed([dropped()]);

    expect_dropped(&mut engine, &mut kernel, ReadFlags::NORMAL);
    let deltas = drain_sync(&mut engine, &mut kernel);
    check_events(
        &deltas,
        &[
            abs(Abs::MT_SLOT, 59),
            abs(Abs::MT_TRACKING_ID, 21),
            abs(Abs::MT_SLOT, 0),
            report(),
        ],
    );
}

#[test]
fn synthesized_events_carry_the_last_frame_time() {
    let t1 = libc::timeval {
        tv_sec: 100,
        tv_usec: 42,
    };
    let t2 = libc::timeval {
        tv_sec: 200,
        tv_usec: 0,
    };

    let mut engine = key_engine();
    let mut kernel = MockKernel::default();
    kernel.keys.insert(Key::KEY_A);
    kernel.feed([
        key(Key::KEY_B, true).with_timeval(t1),
        report().with_timeval(t1),
        dropped().with_timeval(t2),
    ]);

    engine.next_event(&mut kernel, ReadFlags::NORMAL).unwrap();
    engine.next_event(&mut kernel, ReadFlags::NORMAL).unwrap();
    expect_dropped(&mut engine, &mut kernel, ReadFlags::NORMAL);

    for delta in drain_sync(&mut engine, &mut kernel) {
        assert_eq!(delta.timeval().tv_sec, t1.tv_sec);
        assert_eq!(delta.timeval().tv_usec, t1.tv_usec);
    }
}

#[test]
fn drop_before_any_frame_uses_the_marker_time() {
    let t = libc::timeval {
        tv_sec: 77,
        tv_usec: 7,
    };
    let mut engine = key_engine();
    let mut kernel = MockKernel::default();
    kernel.keys.insert(Key::KEY_A);
    kernel.feed([dropped().with_timeval(t)]);

    expect_dropped(&mut engine, &mut kernel, ReadFlags::NORMAL);
    for delta in drain_sync(&mut engine, &mut kernel) {
        assert_eq!(delta.timeval().tv_sec, t.tv_sec);
    }
}

#[test]
fn blocking_flag_waits_for_events() {
    let mut engine = key_engine();
    let mut kernel = MockKernel::default();
    kernel.on_wait.get_mut().extend([key(Key::KEY_A, true), report()]);

    let (status, ev) = engine
        .next_event(&mut kernel, ReadFlags::NORMAL | ReadFlags::BLOCKING)
        .unwrap();
    assert_eq!(status, ReadStatus::Success);
    check_events(&[ev], &[key(Key::KEY_A, true)]);
}

#[test]
fn pending_check_prefers_queues_over_polling() {
    let mut engine = key_engine();
    engine.state.keys.insert(Key::KEY_A);
    let mut kernel = MockKernel::default();
    assert!(!engine.has_event_pending(&kernel).unwrap());

    kernel.feed([dropped()]);
    assert!(engine.has_event_pending(&kernel).unwrap());

    expect_dropped(&mut engine, &mut kernel, ReadFlags::NORMAL);
    let (status, _) = engine.next_event(&mut kernel, ReadFlags::SYNC).unwrap();
    assert_eq!(status, ReadStatus::Sync);
    // The remaining delta records are queued; no descriptor poll needed.
    assert!(engine.has_event_pending(&kernel).unwrap());
}

#[test]
fn sync_codes_cannot_be_disabled() {
    let mut engine = key_engine();
    assert!(engine.disable_event_type(EventType::SYN).is_err());
    assert!(engine.disable_event_code(Syn::REPORT.into()).is_err());
    assert!(engine.disable_event_code(Syn::DROPPED.into()).is_err());
}

#[test]
fn enable_disable_round_trip_loses_the_value() {
    let mut engine = key_engine();
    engine.set_event_value(Key::KEY_A.into(), 1).unwrap();
    assert_eq!(engine.event_value(Key::KEY_A.into()), 1);

    engine.disable_event_code(Key::KEY_A.into()).unwrap();
    assert!(!engine.caps.has_code(Key::KEY_A.into()));
    assert_eq!(engine.event_value(Key::KEY_A.into()), 0);

    engine.enable_event_code(Key::KEY_A.into()).unwrap();
    assert!(engine.caps.has_code(Key::KEY_A.into()));
    assert_eq!(engine.event_value(Key::KEY_A.into()), 0);
}

#[test]
fn disabling_an_absent_code_is_a_no_op() {
    let mut engine = key_engine();
    engine.disable_event_code(Led::NUML.into()).unwrap();
    engine.disable_event_code(Led::NUML.into()).unwrap();
}

#[test]
fn payload_carrying_codes_reject_the_plain_enable() {
    let mut engine = key_engine();
    assert!(engine.enable_event_code(Abs::X.into()).is_err());
    assert!(engine.enable_event_code(Repeat::DELAY.into()).is_err());

    engine.enable_abs_axis(Abs::X, AbsInfo::new(0, 255)).unwrap();
    assert!(engine.caps.has_code(Abs::X.into()));
    assert_eq!(engine.abs_info(Abs::X).unwrap().maximum(), 255);

    engine.enable_key_repeat(KeyRepeat::new(250, 33)).unwrap();
    assert!(engine.caps.has_code(Repeat::DELAY.into()));
    assert_eq!(engine.event_value(Repeat::DELAY.into()), 250);
}

#[test]
fn setters_reject_disabled_codes_without_side_effects() {
    let mut engine = key_engine();
    assert!(engine.set_event_value(Led::NUML.into(), 1).is_err());
    assert_eq!(engine.event_value(Led::NUML.into()), 0);
    // Relative axes carry no retained state, even when enabled.
    engine.enable_event_code(Rel::X.into()).unwrap();
    assert!(engine.set_event_value(Rel::X.into(), 5).is_err());
    assert_eq!(engine.event_value(Rel::X.into()), 0);
}

#[test]
fn inactive_slot_rejects_new_tracking_ids() {
    let mut engine = mt_engine(&[Abs::MT_TRACKING_ID], 2);
    engine.state.slots.set(0, Abs::MT_TRACKING_ID, -1);

    assert!(engine.set_slot_value(0, Abs::MT_TRACKING_ID, 5).is_err());
    engine.set_slot_value(0, Abs::MT_TRACKING_ID, -1).unwrap();

    // An active slot can be retargeted or released freely.
    engine.state.slots.set(1, Abs::MT_TRACKING_ID, 9);
    engine.set_slot_value(1, Abs::MT_TRACKING_ID, 12).unwrap();
    engine.set_slot_value(1, Abs::MT_TRACKING_ID, -1).unwrap();

    assert!(engine.set_slot_value(2, Abs::MT_TRACKING_ID, -1).is_err());
    assert!(engine.set_slot_value(0, Abs::MT_PRESSURE, 1).is_err());
}

#[test]
fn resync_never_surfaces_locally_disabled_codes() {
    let mut engine = key_engine();
    engine.disable_event_code(Key::KEY_B.into()).unwrap();

    let mut kernel = MockKernel::default();
    // The kernel doesn't know about the local disable and reports both keys down.
    kernel.keys.insert(Key::KEY_A);
    kernel.keys.insert(Key::KEY_B);
    kernel.feed([dropped()]);

    expect_dropped(&mut engine, &mut kernel, ReadFlags::NORMAL);
    let deltas = drain_sync(&mut engine, &mut kernel);
    check_events(&deltas, &[key(Key::KEY_A, true), report()]);
    assert_eq!(engine.event_value(Key::KEY_B.into()), 0);
}

#[test]
fn mt_reads_route_through_the_current_slot() {
    let mut engine = mt_engine(&[Abs::MT_POSITION_X, Abs::MT_TRACKING_ID], 2);
    engine.state.slots.set(0, Abs::MT_TRACKING_ID, 1);
    engine.state.slots.set(1, Abs::MT_TRACKING_ID, 2);
    engine.state.slots.set(0, Abs::MT_POSITION_X, 10);
    engine.state.slots.set(1, Abs::MT_POSITION_X, 20);

    engine.set_event_value(Abs::MT_SLOT.into(), 1).unwrap();
    assert_eq!(engine.event_value(Abs::MT_POSITION_X.into()), 20);
    assert_eq!(engine.event_value(Abs::MT_SLOT.into()), 1);
    assert!(engine.set_event_value(Abs::MT_SLOT.into(), 2).is_err());

    // Per-slot reads out of range yield zero without signaling.
    assert_eq!(engine.slot_value(7, Abs::MT_POSITION_X), 0);
}
