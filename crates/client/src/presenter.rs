//! Presentation adapter that renders engine calls as log lines.
use battle_core::{AbilityStatus, BattlePresenter, BattleResult, SquadId, Surface};
use tracing::{debug, info};

/// Headless [`BattlePresenter`]: every render call becomes a `battle::ui`
/// log record.
#[derive(Debug, Default)]
pub struct LogPresenter {
    surface: Option<Surface>,
}

impl LogPresenter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BattlePresenter for LogPresenter {
    fn show_surface(&mut self, surface: Surface) {
        if self.surface != Some(surface) {
            info!(target: "battle::ui", %surface, "surface shown");
            self.surface = Some(surface);
        }
    }

    fn set_drag_and_drop(&mut self, enabled: bool) {
        debug!(target: "battle::ui", enabled, "drag and drop");
    }

    fn render_queue(&mut self, queue: &[SquadId]) {
        let order: Vec<String> = queue.iter().map(ToString::to_string).collect();
        debug!(target: "battle::ui", queue = %order.join(" "), "queue");
    }

    fn render_abilities(&mut self, squad: SquadId, abilities: &[AbilityStatus]) {
        for status in abilities {
            debug!(
                target: "battle::ui",
                %squad,
                ability = %status.name,
                remaining = status.remaining,
                ready = status.ready,
                "ability"
            );
        }
    }

    fn render_results(&mut self, result: &BattleResult) {
        info!(
            target: "battle::ui",
            status = %result.status,
            rounds = result.rounds,
            friendly = result.friendly.len(),
            enemy = result.enemy.len(),
            "results"
        );
    }
}
