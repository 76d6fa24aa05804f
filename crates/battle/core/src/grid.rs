//! Logical battlefield layout consumed by targeting and placement.
//!
//! The engine never needs screen coordinates, only "which row and column is
//! this squad in". [`BattleGrid`] is the narrow contract a layout
//! collaborator implements; [`FormationGrid`] is the reference two-row
//! formation used by headless runs and tests.

use std::collections::BTreeMap;

use crate::state::{AttackKind, Side, SquadId};

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, strum::Display, strum::EnumString,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Row {
    Front,
    Back,
}

impl Row {
    pub const fn other(self) -> Self {
        match self {
            Row::Front => Row::Back,
            Row::Back => Row::Front,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SlotId {
    pub side: Side,
    pub row: Row,
    pub column: u8,
}

impl SlotId {
    pub const fn new(side: Side, row: Row, column: u8) -> Self {
        Self { side, row, column }
    }
}

/// A squad waiting to be placed on the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Placement {
    pub squad: SquadId,
    pub side: Side,
    pub attack_kind: AttackKind,
}

/// Row/slot lookups provided by the layout collaborator.
pub trait BattleGrid: Send {
    fn slot_for_occupant(&self, occupant: SquadId) -> Option<SlotId>;

    fn slot_row(&self, slot: SlotId) -> Option<Row>;

    /// Front-row slot in the same column as `slot`.
    fn front_slot_for(&self, slot: SlotId) -> Option<SlotId>;

    fn slot_occupant(&self, slot: SlotId) -> Option<SquadId>;

    /// Places every unit. Returns false if any unit could not be placed.
    fn try_place_units(&mut self, units: &[Placement]) -> bool;

    /// Moves an already placed occupant to `slot` (drag-and-drop). An occupied
    /// target slot on the same side swaps the two occupants.
    fn try_move_occupant(&mut self, _occupant: SquadId, _slot: SlotId) -> bool {
        false
    }
}

/// Two rows of `columns` slots per side.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FormationGrid {
    columns: u8,
    occupants: BTreeMap<SlotId, SquadId>,
}

impl FormationGrid {
    pub fn new(columns: u8) -> Self {
        Self {
            columns,
            occupants: BTreeMap::new(),
        }
    }

    pub fn columns(&self) -> u8 {
        self.columns
    }

    /// Places `occupant` into `slot` directly, evicting nothing. Returns false
    /// when the slot is out of range or taken.
    pub fn place(&mut self, occupant: SquadId, slot: SlotId) -> bool {
        if slot.column >= self.columns || self.occupants.contains_key(&slot) {
            return false;
        }
        self.vacate(occupant);
        self.occupants.insert(slot, occupant);
        true
    }

    fn vacate(&mut self, occupant: SquadId) -> Option<SlotId> {
        let slot = self.slot_for_occupant(occupant)?;
        self.occupants.remove(&slot);
        Some(slot)
    }

    fn first_free(&self, side: Side, row: Row) -> Option<SlotId> {
        (0..self.columns)
            .map(|column| SlotId::new(side, row, column))
            .find(|slot| !self.occupants.contains_key(slot))
    }
}

impl BattleGrid for FormationGrid {
    fn slot_for_occupant(&self, occupant: SquadId) -> Option<SlotId> {
        self.occupants
            .iter()
            .find(|(_, id)| **id == occupant)
            .map(|(slot, _)| *slot)
    }

    fn slot_row(&self, slot: SlotId) -> Option<Row> {
        (slot.column < self.columns).then_some(slot.row)
    }

    fn front_slot_for(&self, slot: SlotId) -> Option<SlotId> {
        (slot.column < self.columns).then_some(SlotId::new(slot.side, Row::Front, slot.column))
    }

    fn slot_occupant(&self, slot: SlotId) -> Option<SquadId> {
        self.occupants.get(&slot).copied()
    }

    fn try_place_units(&mut self, units: &[Placement]) -> bool {
        let mut all_placed = true;

        for unit in units {
            if self.slot_for_occupant(unit.squad).is_some() {
                continue;
            }

            let preferred = if unit.attack_kind.is_melee() {
                Row::Front
            } else {
                Row::Back
            };

            let slot = self
                .first_free(unit.side, preferred)
                .or_else(|| self.first_free(unit.side, preferred.other()));

            match slot {
                Some(slot) => {
                    self.occupants.insert(slot, unit.squad);
                }
                None => all_placed = false,
            }
        }

        all_placed
    }

    fn try_move_occupant(&mut self, occupant: SquadId, slot: SlotId) -> bool {
        let Some(from) = self.slot_for_occupant(occupant) else {
            return false;
        };
        if slot.column >= self.columns || from.side != slot.side {
            return false;
        }

        match self.occupants.insert(slot, occupant) {
            Some(displaced) if displaced != occupant => {
                self.occupants.insert(from, displaced);
            }
            _ => {
                if from != slot {
                    self.occupants.remove(&from);
                }
            }
        }
        true
    }
}
