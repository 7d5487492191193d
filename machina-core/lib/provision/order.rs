//! Ordering of provisioners with `before` and `after` constraints.
//!
//! Constraints are resolved in three layers:
//!
//! 1. Provisioners without a constraint keep their configuration order. Provisioners constrained
//!    against another provisioner by name are inserted right before or after the first
//!    provisioner with that name. Several provisioners after the same target line up behind it
//!    in configuration order. Named constraints may refer to provisioners that are themselves
//!    constrained; they are retried until no more can be placed.
//! 2. Every provisioner placed so far is wrapped by the `:each` provisioners: all `before :each`
//!    ones in front of it and all `after :each` ones behind it.
//! 3. The `:all` provisioners go around the whole list.
//!
//! Within a layer, provisioners keep their configuration order.

use std::collections::{HashMap, VecDeque};

use crate::{
    config::{OrderRef, Placement, ProvisionerEntry},
    MachinaError, MachinaResult,
};

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Returns the run order as indices into `entries`.
///
/// Indices of `:each` provisioners appear once per wrapped provisioner, so the result can be
/// longer than the input.
///
/// ## Errors
/// Returns [`MachinaError::UnknownProvisionerReference`] if a provisioner is ordered against a
/// name that no placed provisioner has.
///
/// ## Example
/// ```no_run
/// use machina_core::{config::ProvisionerEntry, provision::run_order};
///
/// # fn example() -> anyhow::Result<()> {
/// let entries = vec![
///     ProvisionerEntry::builder().name("main").kind("shell").build(),
///     ProvisionerEntry::builder().name("setup").kind("shell").before("main").build(),
/// ];
///
/// assert_eq!(run_order(&entries)?, vec![1, 0]);
/// # Ok(())
/// # }
/// ```
pub fn run_order(entries: &[ProvisionerEntry]) -> MachinaResult<Vec<usize>> {
    if entries.iter().all(|entry| entry.constraint().is_none()) {
        return Ok((0..entries.len()).collect());
    }

    let mut order = Vec::new();
    let mut named = VecDeque::new();
    let mut each_before = Vec::new();
    let mut each_after = Vec::new();
    let mut all_before = Vec::new();
    let mut all_after = Vec::new();

    for (index, entry) in entries.iter().enumerate() {
        match entry.constraint() {
            None => order.push(index),
            Some((placement, OrderRef::Named(target))) => named.push_back((index, placement, target)),
            Some((Placement::Before, OrderRef::Each)) => each_before.push(index),
            Some((Placement::After, OrderRef::Each)) => each_after.push(index),
            Some((Placement::Before, OrderRef::All)) => all_before.push(index),
            Some((Placement::After, OrderRef::All)) => all_after.push(index),
        }
    }

    // Last provisioner placed after each target, so later ones line up behind it
    let mut after_cursor: HashMap<&str, usize> = HashMap::new();

    // Named constraints may point at provisioners that are themselves constrained, so keep
    // sweeping until a pass places nothing.
    while !named.is_empty() {
        let pending = named.len();
        for _ in 0..pending {
            let Some((index, placement, target)) = named.pop_front() else {
                break;
            };

            match position_of(entries, &order, target) {
                Some(position) => {
                    let at = match placement {
                        Placement::Before => position,
                        Placement::After => {
                            let anchor = after_cursor
                                .get(target.as_str())
                                .and_then(|last| order.iter().position(|placed| placed == last))
                                .unwrap_or(position);
                            after_cursor.insert(target.as_str(), index);
                            anchor + 1
                        }
                    };
                    order.insert(at, index);
                }
                None => named.push_back((index, placement, target)),
            }
        }

        if named.len() == pending {
            if let Some((index, _, target)) = named.front() {
                return Err(MachinaError::UnknownProvisionerReference {
                    name: entries[*index].display_name(),
                    reference: target.to_string(),
                });
            }
        }
    }

    let mut wrapped = Vec::with_capacity(order.len() * (1 + each_before.len() + each_after.len()));
    for index in order {
        wrapped.extend_from_slice(&each_before);
        wrapped.push(index);
        wrapped.extend_from_slice(&each_after);
    }

    let mut result = all_before;
    result.extend(wrapped);
    result.extend(all_after);

    Ok(result)
}

//--------------------------------------------------------------------------------------------------
// Functions: Helpers
//--------------------------------------------------------------------------------------------------

fn position_of(entries: &[ProvisionerEntry], order: &[usize], name: &str) -> Option<usize> {
    order
        .iter()
        .position(|index| entries[*index].get_name().as_deref() == Some(name))
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
