//! Presentation collaborator contract.

use crate::ability::AbilityStatus;
use crate::result::BattleResult;
use crate::state::SquadId;

/// UI surfaces the phase machine switches between.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Surface {
    Tactics,
    Rounds,
    Results,
}

/// Render calls and UI toggles issued by the engine.
///
/// Every method has a no-op default so adapters only implement what they
/// display. The presenter is optional: when none is attached the engine logs
/// a warning and carries on.
pub trait BattlePresenter: Send {
    fn show_surface(&mut self, _surface: Surface) {}

    fn set_hover_inspection(&mut self, _enabled: bool) {}

    fn set_drag_and_drop(&mut self, _enabled: bool) {}

    fn set_slot_colliders(&mut self, _enabled: bool) {}

    fn render_queue(&mut self, _queue: &[SquadId]) {}

    fn render_abilities(&mut self, _squad: SquadId, _abilities: &[AbilityStatus]) {}

    fn render_results(&mut self, _result: &BattleResult) {}
}
