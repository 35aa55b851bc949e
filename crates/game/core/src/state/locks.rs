use bitflags::bitflags;

bitflags! {
    /// Movement restrictions held by a combatant while it casts.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct Locks: u16 {
        const WALK = 1 << 0;
        const RUN = 1 << 1;

        const MOVEMENT = Self::WALK.bits() | Self::RUN.bits();
    }
}

const LOCK_SLOTS: usize = u16::BITS as usize;

/// Per-bit holder counts. A bit stays locked while any holder remains, so
/// overlapping casts on one entity each own a share and release only that.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LockHolds {
    counts: [u16; LOCK_SLOTS],
}

impl LockHolds {
    /// Bits with at least one holder.
    pub fn locks(&self) -> Locks {
        slots(Locks::all())
            .filter(|&(slot, _)| self.counts[slot] > 0)
            .fold(Locks::empty(), |held, (_, bit)| held | bit)
    }

    /// Holders of the given bit; a multi-bit argument reports its least held
    /// bit.
    pub fn holders(&self, lock: Locks) -> u16 {
        slots(lock)
            .map(|(slot, _)| self.counts[slot])
            .min()
            .unwrap_or(0)
    }

    /// Adds one share of every bit in `locks`; returns the bits now owed back.
    pub(crate) fn hold(&mut self, locks: Locks) -> Locks {
        for (slot, _) in slots(locks) {
            self.counts[slot] = self.counts[slot].saturating_add(1);
        }
        locks
    }

    /// Drops one share of every bit in `locks`; returns the bits that had a
    /// share to drop.
    pub(crate) fn release(&mut self, locks: Locks) -> Locks {
        let mut released = Locks::empty();
        for (slot, bit) in slots(locks) {
            if self.counts[slot] > 0 {
                self.counts[slot] -= 1;
                released |= bit;
            }
        }
        released
    }
}

fn slots(locks: Locks) -> impl Iterator<Item = (usize, Locks)> {
    (0..LOCK_SLOTS).filter_map(move |slot| {
        let bit = Locks::from_bits_retain(1 << slot);
        locks.contains(bit).then_some((slot, bit))
    })
}
