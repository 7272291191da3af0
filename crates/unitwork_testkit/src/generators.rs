//! Property-based test generators.

use proptest::prelude::*;

/// One step of a randomly generated scheduling script.
///
/// Index-carrying variants pick a target among the entities tracked so
/// far (modulo the pool size at execution time), so scripts stay valid
/// regardless of how many entities earlier steps produced.
#[derive(Debug, Clone)]
pub enum ScriptOp {
    /// Persist a fresh entity.
    Persist,
    /// Hydrate an entity from a stored record and track it for update.
    GetForUpdate,
    /// Schedule an update for a previously produced entity.
    Update(prop::sample::Index),
    /// Schedule a delete for a previously produced entity.
    Delete(prop::sample::Index),
}

/// Strategy producing one scheduling step.
pub fn script_op() -> impl Strategy<Value = ScriptOp> {
    prop_oneof![
        Just(ScriptOp::Persist),
        Just(ScriptOp::GetForUpdate),
        any::<prop::sample::Index>().prop_map(ScriptOp::Update),
        any::<prop::sample::Index>().prop_map(ScriptOp::Delete),
    ]
}

/// Strategy producing a scheduling script of up to `max_len` steps.
pub fn script(max_len: usize) -> impl Strategy<Value = Vec<ScriptOp>> {
    prop::collection::vec(script_op(), 1..max_len.max(2))
}
