//! The event engine: normal ingest, drop detection, and the resynchronization state machine.
//!
//! The engine is sans-IO: every descriptor access goes through [`KernelOps`], which the real
//! [`Handle`] implements and the tests replace with a scripted kernel.
//!
//! Operation is a three-mode state machine. In normal mode, raw records are pulled from the
//! kernel in batches, filtered against the capability set, applied to the state cache, and handed
//! to the caller one at a time. When a `SYN_DROPPED` marker shows up the engine snapshots the
//! cache and switches to sync mode: the next sync-flagged call refetches the true device state
//! via ioctls, diffs it against the snapshot, and queues a delta event stream whose ordering lets
//! a consumer replay it naively — including the multitouch slot-select and tracking-id sequencing
//! rules. The queue is drained one record per call; once empty, normal ingest resumes.

#[cfg(test)]
mod tests;

use std::{collections::VecDeque, io, mem};

use crate::{
    abs_info::AbsInfo,
    bits::{BitSet, BitValue, BitValueImpl},
    caps::Capabilities,
    device::{ReadFlags, ReadStatus},
    dev::Handle,
    event::{
        Abs, AbsEvent, EventCode, EventType, InputEvent, InputProp, Key, KeyEvent, KeyState, Led,
        LedEvent, Repeat, RepeatEvent, Switch, SwitchEvent, Syn, SynEvent,
    },
    key_repeat::KeyRepeat,
    state::DeviceState,
};

/// Number of records fetched per `read(2)`.
const READ_CHUNK: usize = 24;

/// The descriptor operations the engine needs.
///
/// Implemented by [`Handle`] for real devices and by the test suite's scripted kernel.
pub(crate) trait KernelOps {
    fn read_events(&mut self, dest: &mut [InputEvent]) -> io::Result<usize>;
    fn fetch_keys(&self) -> io::Result<BitSet<Key>>;
    fn fetch_leds(&self) -> io::Result<BitSet<Led>>;
    fn fetch_switches(&self) -> io::Result<BitSet<Switch>>;
    fn fetch_abs(&self, abs: Abs) -> io::Result<AbsInfo>;
    fn fetch_slots(&self, code: Abs, nslots: usize) -> io::Result<Vec<i32>>;
    fn fetch_repeat(&self) -> io::Result<Option<KeyRepeat>>;
    fn poll_readable(&self) -> io::Result<bool>;
    fn wait_readable(&self) -> io::Result<()>;
}

impl KernelOps for Handle<'_> {
    fn read_events(&mut self, dest: &mut [InputEvent]) -> io::Result<usize> {
        Handle::read_events(self, dest)
    }
    fn fetch_keys(&self) -> io::Result<BitSet<Key>> {
        self.key_state()
    }
    fn fetch_leds(&self) -> io::Result<BitSet<Led>> {
        self.led_state()
    }
    fn fetch_switches(&self) -> io::Result<BitSet<Switch>> {
        self.switch_state()
    }
    fn fetch_abs(&self, abs: Abs) -> io::Result<AbsInfo> {
        self.abs_info(abs)
    }
    fn fetch_slots(&self, code: Abs, nslots: usize) -> io::Result<Vec<i32>> {
        self.slot_values(code, nslots)
    }
    fn fetch_repeat(&self) -> io::Result<Option<KeyRepeat>> {
        self.key_repeat()
    }
    fn poll_readable(&self) -> io::Result<bool> {
        self.is_readable()
    }
    fn wait_readable(&self) -> io::Result<()> {
        self.block_until_readable()
    }
}

enum Phase {
    Normal,
    /// A drop marker went out to the caller; the cache snapshot is from that moment. The actual
    /// refetch happens on the next sync-flagged call.
    SyncPending(Box<DeviceState>),
    /// The delta queue is being drained.
    SyncDraining,
}

pub(crate) struct Engine {
    pub caps: Capabilities,
    pub state: DeviceState,
    /// Raw records read from the kernel, not yet delivered.
    batch: VecDeque<InputEvent>,
    /// Synthesized delta records pending delivery in sync mode.
    queue: VecDeque<InputEvent>,
    phase: Phase,
    /// Timestamp carried by synthesized records: the last observed frame boundary, or the drop
    /// marker itself when no frame was seen yet.
    last_time: libc::timeval,
    saw_report: bool,
}

fn would_block() -> io::Error {
    io::Error::from(io::ErrorKind::WouldBlock)
}

fn invalid(msg: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, msg.to_string())
}

fn in_range<V: BitValue>(value: V) -> bool {
    value.into_index() <= V::MAX.into_index()
}

fn stamped(ev: impl Into<InputEvent>, time: libc::timeval) -> InputEvent {
    ev.into().with_timeval(time)
}

impl Engine {
    pub fn new(caps: Capabilities, state: DeviceState) -> Self {
        Self {
            caps,
            state,
            batch: VecDeque::new(),
            queue: VecDeque::new(),
            phase: Phase::Normal,
            last_time: libc::timeval {
                tv_sec: 0,
                tv_usec: 0,
            },
            saw_report: false,
        }
    }

    /// The single user-facing read operation; see [`Device::next_event`][crate::Device::next_event].
    pub fn next_event(
        &mut self,
        ops: &mut impl KernelOps,
        flags: ReadFlags,
    ) -> io::Result<(ReadStatus, InputEvent)> {
        if flags.contains(ReadFlags::FORCE_SYNC) {
            // Behave as if a drop marker had just been read. The caller sees a synthetic one
            // whose value carries no meaning.
            log::debug!("forced sync requested");
            self.batch.clear();
            self.queue.clear();
            self.phase = Phase::SyncPending(Box::new(self.state.clone()));
            let marker = stamped(SynEvent::new(Syn::DROPPED), self.last_time);
            return Ok((ReadStatus::Sync, marker));
        }

        match self.phase {
            // Sync-flagged reads with nothing to sync are plain reads.
            Phase::Normal => self.ingest(ops, flags),
            _ if flags.contains(ReadFlags::SYNC) => self.next_delta(ops),
            _ => {
                // The caller ignored the sync. Adopt the kernel state silently, drop the
                // deltas, and resume normal reading.
                if let Phase::SyncPending(_) = self.phase {
                    self.run_resync(ops);
                    log::debug!("sync ignored by caller, cache updated without delta delivery");
                }
                self.queue.clear();
                self.phase = Phase::Normal;
                self.ingest(ops, flags)
            }
        }
    }

    /// Returns whether a `next_event` call would yield an event without blocking.
    ///
    /// Checks the internal queues first and only then polls the descriptor.
    pub fn has_event_pending(&self, ops: &impl KernelOps) -> io::Result<bool> {
        if !self.queue.is_empty() || !self.batch.is_empty() {
            return Ok(true);
        }
        ops.poll_readable()
    }

    fn ingest(
        &mut self,
        ops: &mut impl KernelOps,
        flags: ReadFlags,
    ) -> io::Result<(ReadStatus, InputEvent)> {
        loop {
            let Some(ev) = self.batch.pop_front() else {
                self.fill_batch(ops, flags)?;
                continue;
            };

            if ev.event_type() == EventType::SYN {
                match Syn::from_raw(ev.raw_code()) {
                    Syn::DROPPED => {
                        if !self.saw_report {
                            self.last_time = ev.timeval();
                        }
                        log::debug!("SYN_DROPPED observed, userspace state is stale");
                        self.batch.clear();
                        self.queue.clear();
                        self.phase = Phase::SyncPending(Box::new(self.state.clone()));
                        return Ok((ReadStatus::Sync, ev));
                    }
                    Syn::REPORT => {
                        self.last_time = ev.timeval();
                        self.saw_report = true;
                        return Ok((ReadStatus::Success, ev));
                    }
                    _ => return Ok((ReadStatus::Success, ev)),
                }
            }

            if !self.caps.admits(&ev) {
                continue;
            }
            self.state.apply(&ev);
            return Ok((ReadStatus::Success, ev));
        }
    }

    fn fill_batch(&mut self, ops: &mut impl KernelOps, flags: ReadFlags) -> io::Result<()> {
        loop {
            let mut buf = [InputEvent::zeroed(); READ_CHUNK];
            match ops.read_events(&mut buf) {
                Ok(0) => {}
                Ok(n) => {
                    self.batch.extend(buf[..n].iter().copied());
                    return Ok(());
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
                Err(e) => return Err(e),
            }

            if flags.contains(ReadFlags::BLOCKING) {
                ops.wait_readable()?;
            } else {
                return Err(would_block());
            }
        }
    }

    fn next_delta(&mut self, ops: &mut impl KernelOps) -> io::Result<(ReadStatus, InputEvent)> {
        if let Phase::SyncPending(_) = self.phase {
            self.run_resync(ops);
        }
        match self.queue.pop_front() {
            Some(ev) => Ok((ReadStatus::Sync, ev)),
            None => {
                self.phase = Phase::Normal;
                Err(would_block())
            }
        }
    }

    /// Refetches the true device state, diffs it against the pre-drop snapshot, and fills the
    /// delta queue.
    ///
    /// A failing refetch skips its category (the cache keeps the pre-drop values there) rather
    /// than aborting the sync; losing one category beats losing the stream.
    fn run_resync(&mut self, ops: &mut impl KernelOps) {
        let Phase::SyncPending(prev) = mem::replace(&mut self.phase, Phase::SyncDraining) else {
            return;
        };
        let time = self.last_time;
        debug_assert!(self.queue.is_empty());

        // Diffs are restricted to capability-enabled codes: the kernel knows nothing about
        // locally disabled ones, and those must never surface.
        if self.caps.types.contains(EventType::KEY) {
            match ops.fetch_keys() {
                Ok(now) => {
                    for key in prev.keys.symmetric_difference(&now) {
                        if !self.caps.keys.contains(key) {
                            continue;
                        }
                        let state = if now.contains(key) {
                            KeyState::PRESSED
                        } else {
                            KeyState::RELEASED
                        };
                        self.queue.push_back(stamped(KeyEvent::new(key, state), time));
                        self.state.keys.set(key, now.contains(key));
                    }
                }
                Err(e) => log::info!("key refetch failed, skipping key sync: {e}"),
            }
        }

        if self.caps.types.contains(EventType::LED) {
            match ops.fetch_leds() {
                Ok(now) => {
                    for led in prev.leds.symmetric_difference(&now) {
                        if !self.caps.leds.contains(led) {
                            continue;
                        }
                        self.queue
                            .push_back(stamped(LedEvent::new(led, now.contains(led)), time));
                        self.state.leds.set(led, now.contains(led));
                    }
                }
                Err(e) => log::info!("LED refetch failed, skipping LED sync: {e}"),
            }
        }

        if self.caps.types.contains(EventType::SW) {
            match ops.fetch_switches() {
                Ok(now) => {
                    for switch in prev.switches.symmetric_difference(&now) {
                        if !self.caps.switches.contains(switch) {
                            continue;
                        }
                        self.queue.push_back(stamped(
                            SwitchEvent::new(switch, now.contains(switch)),
                            time,
                        ));
                        self.state.switches.set(switch, now.contains(switch));
                    }
                }
                Err(e) => log::info!("switch refetch failed, skipping switch sync: {e}"),
            }
        }

        // Multitouch codes are handled through the slot table below; for devices without
        // (usable) slots they are ordinary axes and belong in this pass.
        let has_slots = self.state.has_slots();
        let abs_set = self.caps.abs;
        for abs in abs_set.iter() {
            if has_slots && abs.raw() >= Abs::MT_SLOT.raw() {
                continue;
            }
            match ops.fetch_abs(abs) {
                Ok(info) => {
                    let idx = abs.raw() as usize;
                    let value = info.value();
                    if prev.abs[idx] != value {
                        self.queue.push_back(stamped(AbsEvent::new(abs, value), time));
                    }
                    self.state.abs[idx] = value;
                }
                Err(e) => log::info!("{abs:?} refetch failed, skipping its sync: {e}"),
            }
        }

        if has_slots {
            self.sync_slots(ops, &prev);
        }

        if self.caps.types.contains(EventType::REP) {
            match ops.fetch_repeat() {
                Ok(Some(rep)) if prev.rep != Some(rep) => {
                    self.queue
                        .push_back(stamped(RepeatEvent::new(Repeat::DELAY, rep.delay()), time));
                    self.queue
                        .push_back(stamped(RepeatEvent::new(Repeat::PERIOD, rep.period()), time));
                    self.state.rep = Some(rep);
                }
                Ok(_) => {}
                Err(e) => log::info!("repeat refetch failed, skipping repeat sync: {e}"),
            }
        }

        self.queue.push_back(stamped(SynEvent::new(Syn::REPORT), time));
    }

    /// Diffs the multitouch slot table and queues the delta in slot-major order.
    ///
    /// Within one slot, a contact's tracking id frames its life: a new id precedes the contact's
    /// data, `-1` follows the last of it, and a contact replaced mid-drop shows the death before
    /// the birth. Slot-select records are emitted only when the emitted slot actually changes,
    /// and the pass ends on the device's true current slot.
    fn sync_slots(&mut self, ops: &mut impl KernelOps, prev: &DeviceState) {
        let time = self.last_time;
        let nslots = self.state.slots.nslots();
        // Locally disabled codes stay invisible, same as in the other categories.
        let codes: Vec<Abs> = self
            .state
            .slots
            .codes()
            .iter()
            .copied()
            .filter(|code| self.caps.abs.contains(*code))
            .collect();

        // Refetch the whole table up front; any failure skips the category.
        let mut post: Vec<Vec<i32>> = Vec::with_capacity(codes.len());
        for &code in &codes {
            match ops.fetch_slots(code, nslots) {
                Ok(row) => post.push(row),
                Err(e) => {
                    log::info!("{code:?} slot refetch failed, skipping multitouch sync: {e}");
                    return;
                }
            }
        }
        let current = match ops.fetch_abs(Abs::MT_SLOT) {
            Ok(info) => info.value().max(0) as usize,
            Err(e) => {
                log::info!("current-slot refetch failed, keeping the cached slot: {e}");
                prev.slots.current()
            }
        };

        let mut selected = None;
        for slot in 0..nslots {
            let mut deltas = Vec::new();
            let mut tracking = None;
            for (row, &code) in post.iter().zip(&codes) {
                let old = prev.slots.value(slot, code).unwrap_or(0);
                let new = row[slot];
                if old == new {
                    continue;
                }
                if code == Abs::MT_TRACKING_ID {
                    tracking = Some((old, new));
                } else {
                    deltas.push((code, new));
                }
            }
            if deltas.is_empty() && tracking.is_none() {
                continue;
            }

            if selected != Some(slot) {
                self.queue
                    .push_back(stamped(AbsEvent::new(Abs::MT_SLOT, slot as i32), time));
                selected = Some(slot);
            }

            let mut emit = |(code, value)| {
                self.queue.push_back(stamped(AbsEvent::new(code, value), time));
            };
            match tracking {
                // Touch ended: the tracking id goes last.
                Some((_, new)) if new < 0 => {
                    deltas.into_iter().for_each(&mut emit);
                    emit((Abs::MT_TRACKING_ID, new));
                }
                // Touch began: the tracking id goes first.
                Some((old, new)) if old < 0 => {
                    emit((Abs::MT_TRACKING_ID, new));
                    deltas.into_iter().for_each(&mut emit);
                }
                // Touch replaced mid-drop: one contact died and another took the slot.
                Some((_, new)) => {
                    emit((Abs::MT_TRACKING_ID, -1));
                    emit((Abs::MT_TRACKING_ID, new));
                    deltas.into_iter().for_each(&mut emit);
                }
                None => deltas.into_iter().for_each(&mut emit),
            }
        }

        if selected.unwrap_or(prev.slots.current()) != current {
            self.queue
                .push_back(stamped(AbsEvent::new(Abs::MT_SLOT, current as i32), time));
        }

        for (row, &code) in post.iter().zip(&codes) {
            self.state.slots.row_mut(code).unwrap().copy_from_slice(row);
        }
        self.state.slots.set_current(current);
    }
}

/// Capability mutation and cached-state access.
///
/// These back the corresponding [`Device`][crate::Device] methods; none of them touch the
/// descriptor.
impl Engine {
    pub fn enable_event_type(&mut self, ty: EventType) -> io::Result<()> {
        if !in_range(ty) {
            return Err(invalid("event type out of range"));
        }
        self.caps.types.insert(ty);
        Ok(())
    }

    pub fn disable_event_type(&mut self, ty: EventType) -> io::Result<()> {
        if ty == EventType::SYN {
            return Err(invalid("the synchronization type cannot be disabled"));
        }
        if in_range(ty) {
            self.caps.types.remove(ty);
        }
        Ok(())
    }

    pub fn enable_event_code(&mut self, code: EventCode) -> io::Result<()> {
        match code {
            // Synchronization codes are always enabled.
            EventCode::Syn(_) => return Ok(()),
            EventCode::Abs(_) => {
                return Err(invalid("absolute axes require parameters, use enable_abs_axis"));
            }
            EventCode::Repeat(_) => {
                return Err(invalid("autorepeat requires a delay/period payload, use enable_key_repeat"));
            }
            EventCode::Key(key) if !in_range(key) => return Err(invalid("key code out of range")),
            EventCode::Rel(rel) if !in_range(rel) => return Err(invalid("rel code out of range")),
            EventCode::Switch(sw) if !in_range(sw) => return Err(invalid("switch code out of range")),
            EventCode::Misc(misc) if !in_range(misc) => return Err(invalid("misc code out of range")),
            EventCode::Led(led) if !in_range(led) => return Err(invalid("LED code out of range")),
            EventCode::Sound(snd) if !in_range(snd) => return Err(invalid("sound code out of range")),
            _ => {}
        }
        self.caps.insert_code(code, None);
        Ok(())
    }

    pub fn enable_abs_axis(&mut self, abs: Abs, params: AbsInfo) -> io::Result<()> {
        if !in_range(abs) {
            return Err(invalid("absolute axis out of range"));
        }
        self.caps.insert_code(EventCode::Abs(abs), Some(params.with_value(0)));
        if !(self.state.has_slots() && abs.is_slot_axis()) {
            self.state.abs[abs.raw() as usize] = params.value();
        }
        Ok(())
    }

    pub fn enable_key_repeat(&mut self, rep: KeyRepeat) -> io::Result<()> {
        self.caps.types.insert(EventType::REP);
        self.state.rep = Some(rep);
        Ok(())
    }

    pub fn disable_event_code(&mut self, code: EventCode) -> io::Result<()> {
        if let EventCode::Syn(_) = code {
            return Err(invalid("synchronization codes cannot be disabled"));
        }
        if !self.caps.has_code(code) {
            // Disabling an absent code is a no-op.
            return Ok(());
        }
        self.caps.remove_code(code);

        // The cached value does not survive a disable; re-enabling reads 0.
        match code {
            EventCode::Key(key) => {
                self.state.keys.remove(key);
            }
            EventCode::Led(led) => {
                self.state.leds.remove(led);
            }
            EventCode::Switch(switch) => {
                self.state.switches.remove(switch);
            }
            EventCode::Abs(abs) => {
                self.state.abs[abs.raw() as usize] = 0;
                if let Some(row) = self.state.slots.row_mut(abs) {
                    row.fill(0);
                }
            }
            EventCode::Repeat(_) => self.state.rep = None,
            _ => {}
        }
        Ok(())
    }

    pub fn enable_property(&mut self, prop: InputProp) -> io::Result<()> {
        if !in_range(prop) {
            return Err(invalid("property out of range"));
        }
        self.caps.props.insert(prop);
        Ok(())
    }

    /// Returns the cached value of `code`.
    ///
    /// Codes the device doesn't have, and codes without retained state (relative axes, misc,
    /// sounds), read as 0. Multitouch codes read through the current slot.
    pub fn event_value(&self, code: EventCode) -> i32 {
        if !self.caps.has_code(code) {
            return 0;
        }
        match code {
            EventCode::Key(key) => self.state.keys.contains(key) as i32,
            EventCode::Led(led) => self.state.leds.contains(led) as i32,
            EventCode::Switch(switch) => self.state.switches.contains(switch) as i32,
            EventCode::Abs(abs) => {
                if self.state.has_slots() && abs == Abs::MT_SLOT {
                    self.state.slots.current() as i32
                } else if self.state.has_slots() && abs.is_slot_axis() {
                    self.slot_value(self.state.slots.current(), abs)
                } else {
                    self.state.abs[abs.raw() as usize]
                }
            }
            EventCode::Repeat(rep) => match (self.state.rep, rep) {
                (Some(r), Repeat::DELAY) => r.delay() as i32,
                (Some(r), Repeat::PERIOD) => r.period() as i32,
                _ => 0,
            },
            EventCode::Syn(_) | EventCode::Rel(_) | EventCode::Misc(_) | EventCode::Sound(_) => 0,
        }
    }

    /// Overwrites the cached value of `code` without generating an event.
    pub fn set_event_value(&mut self, code: EventCode, value: i32) -> io::Result<()> {
        if !self.caps.has_code(code) {
            return Err(invalid("cannot set the value of a disabled code"));
        }
        match code {
            EventCode::Key(key) => {
                self.state.keys.set(key, value != 0);
                Ok(())
            }
            EventCode::Led(led) => {
                self.state.leds.set(led, value != 0);
                Ok(())
            }
            EventCode::Switch(switch) => {
                self.state.switches.set(switch, value != 0);
                Ok(())
            }
            EventCode::Abs(abs) => {
                if self.state.has_slots() && abs == Abs::MT_SLOT {
                    if value < 0 || value as usize >= self.state.slots.nslots() {
                        return Err(invalid("slot index out of range"));
                    }
                    self.state.slots.set_current(value as usize);
                    Ok(())
                } else if self.state.has_slots() && abs.is_slot_axis() {
                    self.set_slot_value(self.state.slots.current(), abs, value)
                } else {
                    self.state.abs[abs.raw() as usize] = value;
                    Ok(())
                }
            }
            EventCode::Repeat(rep) => {
                let mut new = self.state.rep.unwrap_or(KeyRepeat::new(0, 0));
                match rep {
                    Repeat::DELAY => new.delay = value as u32,
                    Repeat::PERIOD => new.period = value as u32,
                    _ => return Err(invalid("unknown autorepeat code")),
                }
                self.state.rep = Some(new);
                Ok(())
            }
            EventCode::Syn(_) | EventCode::Rel(_) | EventCode::Misc(_) | EventCode::Sound(_) => {
                Err(invalid("this code carries no retained state"))
            }
        }
    }

    /// Returns the cached value of a multitouch code in a specific slot; unknown slots and codes
    /// read as 0.
    pub fn slot_value(&self, slot: usize, code: Abs) -> i32 {
        if !self.caps.abs.contains(code) {
            return 0;
        }
        self.state.slots.value(slot, code).unwrap_or(0)
    }

    /// Overwrites a per-slot value without generating an event.
    ///
    /// An inactive slot (tracking id `-1`) only accepts `-1` as a new tracking id; kernel events
    /// applied by ingest are exempt from this rule, the kernel being authoritative.
    pub fn set_slot_value(&mut self, slot: usize, code: Abs, value: i32) -> io::Result<()> {
        if !code.is_slot_axis() || !self.caps.abs.contains(code) {
            return Err(invalid("not an enabled per-slot multitouch code"));
        }
        if slot >= self.state.slots.nslots() {
            return Err(invalid("slot index out of range"));
        }
        if code == Abs::MT_TRACKING_ID
            && value != -1
            && self.state.slots.value(slot, code) == Some(-1)
        {
            return Err(invalid("slot is inactive, only -1 can be stored"));
        }
        if !self.state.slots.set(slot, code, value) {
            return Err(invalid("code is not tracked per slot"));
        }
        Ok(())
    }

    pub fn num_slots(&self) -> usize {
        self.state.slots.nslots()
    }

    pub fn current_slot(&self) -> usize {
        self.state.slots.current()
    }

    /// Returns the parameters of `abs` with the cached value filled in, or `None` if the axis is
    /// disabled.
    pub fn abs_info(&self, abs: Abs) -> Option<AbsInfo> {
        let params = self.caps.abs_params(abs)?;
        Some(params.with_value(self.event_value(EventCode::Abs(abs))))
    }

    pub fn key_repeat(&self) -> Option<KeyRepeat> {
        self.state.rep
    }
}
