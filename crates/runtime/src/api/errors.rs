//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from worker coordination, engine commands, and player
//! providers so clients can bubble them up with consistent context.
use thiserror::Error;
use tokio::sync::oneshot;

use battle_core::BattleError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("runtime requires a battle before building")]
    MissingBattle,

    #[error("player provider not set")]
    ProviderNotSet,

    #[error("player provider failed: {0}")]
    Provider(String),

    #[error("battle worker command channel closed")]
    CommandChannelClosed,

    #[error("battle worker reply channel closed")]
    ReplyChannelClosed(#[source] oneshot::error::RecvError),

    #[error("battle worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),

    #[error("battle event stream closed")]
    EventStreamClosed,

    #[error(transparent)]
    Battle(#[from] BattleError),
}
