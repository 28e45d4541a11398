use super::{method, LocalState, Nil};
use crate::rpc::HandlerSet;

/// Procedures served for `state`: one field read or write each.
pub fn state_handlers(state: LocalState) -> HandlerSet {
    let mut set = HandlerSet::new();

    set.register(method::PROBE, |_: Nil| Ok(Nil));

    let s = state.clone();
    set.register(method::GET_DATA_DIR, move |_: Nil| Ok(s.read().data_dir.clone()));

    let s = state.clone();
    set.register(method::GET_ROLE, move |_: Nil| Ok(s.read().role.clone()));

    let s = state.clone();
    set.register(method::GET_DB_ROLE, move |_: Nil| Ok(s.read().db_role.clone()));

    let s = state.clone();
    set.register(method::GET_SYNCED, move |_: bool| Ok(s.read().synced));

    set.register(method::SET_SYNCED, move |synced: bool| {
        state.write().synced = synced;
        Ok(synced)
    });

    set
}
