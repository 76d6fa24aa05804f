//! Target pickers: sources of a chosen target.
//!
//! A picker is a small latch. It starts idle, is asked for a target once, and
//! reports exactly one selection (which may be `None`). Human pickers stay
//! pending until the input collaborator offers a selection; AI pickers answer
//! immediately. Any call outside that window is ignored, including calls
//! after [`TargetPicker::dispose`].

use std::cmp::Reverse;

use crate::grid::Row;
use crate::state::SquadId;

use super::resolver::{TargetResolver, TargetView};

/// Outcome of a picker call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PickerPoll {
    /// The call was ignored.
    Idle,
    /// A selection was requested and is still outstanding.
    Pending,
    /// The picker selected (fires once per picker).
    Selected(Option<SquadId>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum PickerKind {
    Human,
    Ai,
}

pub trait TargetPicker: Send {
    fn kind(&self) -> PickerKind;

    fn request_target(
        &mut self,
        view: &TargetView<'_>,
        actor: SquadId,
        resolver: &dyn TargetResolver,
    ) -> PickerPoll;

    /// Externally driven selection (pointer pick resolved by the UI).
    fn offer_selection(&mut self, selection: Option<SquadId>) -> PickerPoll;

    fn dispose(&mut self);
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum LatchState {
    #[default]
    Idle,
    Requested,
    Selected,
    Disposed,
}

/// Waits for the presentation layer to report which squad the player picked.
#[derive(Debug, Default)]
pub struct HumanPicker {
    state: LatchState,
}

impl HumanPicker {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TargetPicker for HumanPicker {
    fn kind(&self) -> PickerKind {
        PickerKind::Human
    }

    fn request_target(
        &mut self,
        _view: &TargetView<'_>,
        _actor: SquadId,
        _resolver: &dyn TargetResolver,
    ) -> PickerPoll {
        if self.state != LatchState::Idle {
            return PickerPoll::Idle;
        }
        self.state = LatchState::Requested;
        PickerPoll::Pending
    }

    fn offer_selection(&mut self, selection: Option<SquadId>) -> PickerPoll {
        if self.state != LatchState::Requested {
            return PickerPoll::Idle;
        }
        self.state = LatchState::Selected;
        PickerPoll::Selected(selection)
    }

    fn dispose(&mut self) {
        self.state = LatchState::Disposed;
    }
}

/// Computes a target synchronously from the battlefield.
#[derive(Debug, Default)]
pub struct AiPicker {
    state: LatchState,
}

impl AiPicker {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TargetPicker for AiPicker {
    fn kind(&self) -> PickerKind {
        PickerKind::Ai
    }

    fn request_target(
        &mut self,
        view: &TargetView<'_>,
        actor: SquadId,
        resolver: &dyn TargetResolver,
    ) -> PickerPoll {
        if self.state != LatchState::Idle {
            return PickerPoll::Idle;
        }
        self.state = LatchState::Selected;
        PickerPoll::Selected(pick_ai_target(view, actor, resolver))
    }

    fn offer_selection(&mut self, _selection: Option<SquadId>) -> PickerPoll {
        PickerPoll::Idle
    }

    fn dispose(&mut self) {
        self.state = LatchState::Disposed;
    }
}

/// AI target choice.
///
/// Melee actors take the nearest valid front-row enemy (column distance),
/// falling back to valid back-row enemies. Ranged and magic actors take the
/// valid enemy with the highest initiative. Ties go to the lower squad id.
pub fn pick_ai_target(
    view: &TargetView<'_>,
    actor: SquadId,
    resolver: &dyn TargetResolver,
) -> Option<SquadId> {
    let attacker = view.roster.get(actor)?;
    let candidates = view
        .roster
        .battle_units()
        .filter(|squad| squad.side() != attacker.side())
        .filter(|squad| resolver.resolve_target(view, actor, squad.id()));

    if !attacker.attack_kind().is_melee() {
        return candidates
            .max_by_key(|squad| (squad.initiative(), Reverse(squad.id())))
            .map(|squad| squad.id());
    }

    let origin = view
        .grid
        .slot_for_occupant(actor)
        .map_or(0, |slot| i16::from(slot.column));

    let mut best: Option<((u8, i16, SquadId), SquadId)> = None;
    for squad in candidates {
        let slot = view.grid.slot_for_occupant(squad.id());
        let row_rank = match slot.and_then(|slot| view.grid.slot_row(slot)) {
            Some(Row::Front) => 0,
            _ => 1,
        };
        let distance = slot.map_or(i16::MAX, |slot| (i16::from(slot.column) - origin).abs());
        let key = (row_rank, distance, squad.id());
        if best.is_none_or(|(current, _)| key < current) {
            best = Some((key, squad.id()));
        }
    }

    best.map(|(_, id)| id)
}
