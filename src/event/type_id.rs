//! Runtime type-id allocation.
//!
//! The source framework identifies event types with compiler-assigned
//! template instantiations; there is no equivalent in Rust without a macro
//! or a registry. This keeps a process-wide map from `std::any::TypeId` to a
//! dense `u32`, assigned the first time a given `E` is seen. The mapping is
//! stable for the life of the process, which is all the dispatch table
//! needs (ยง9, "runtime type-id registry").

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

fn table() -> &'static Mutex<(HashMap<TypeId, u32>, u32)> {
    static TABLE: OnceLock<Mutex<(HashMap<TypeId, u32>, u32)>> = OnceLock::new();
    TABLE.get_or_init(|| Mutex::new((HashMap::new(), 0)))
}

/// Returns the stable `u32` type id for `E`, allocating one on first use.
pub fn type_id_of<E: 'static>() -> u32 {
    let key = TypeId::of::<E>();
    let mut guard = table().lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if let Some(id) = guard.0.get(&key) {
        return *id;
    }
    let next = guard.1;
    guard.1 += 1;
    guard.0.insert(key, next);
    next
}
