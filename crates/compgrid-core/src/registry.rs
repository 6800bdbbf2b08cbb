use std::{collections::BTreeMap, sync::Arc, time::Duration};

use parking_lot::RwLock;
use tracing::{debug, info};

use compgrid_model::{ComponentInfo, ComponentStatus, GroupId, Slot, Symbol};

use crate::{
    error::{CoreError, CoreResult},
    group::Group,
};

/// All groups of the process and the one commands currently address.
///
/// Groups are never removed.
#[derive(Debug)]
pub struct GroupRegistry {
    groups: RwLock<BTreeMap<GroupId, Arc<Group>>>,
    current: RwLock<Option<Arc<Group>>>,
    slot_limit: usize,
}

impl GroupRegistry {
    /// `slot_limit` is the number of service endpoints, the upper bound for component slots.
    pub fn new(slot_limit: usize) -> Self {
        Self {
            groups: RwLock::new(BTreeMap::new()),
            current: RwLock::new(None),
            slot_limit,
        }
    }

    pub fn slot_limit(&self) -> usize {
        self.slot_limit
    }

    /// Create group `id` if unseen and make it current.
    pub fn create_or_switch(&self, id: GroupId) -> CoreResult<Arc<Group>> {
        if id == 0 {
            return Err(CoreError::InvalidGroupId(id));
        }

        let group = {
            let mut groups = self.groups.write();
            Arc::clone(groups.entry(id).or_insert_with(|| {
                debug!(group = id, "group created");
                Arc::new(Group::new(id))
            }))
        };
        *self.current.write() = Some(Arc::clone(&group));
        info!(group = id, "switched group");
        Ok(group)
    }

    pub fn current(&self) -> CoreResult<Arc<Group>> {
        self.current
            .read()
            .as_ref()
            .cloned()
            .ok_or(CoreError::NoGroupSelected)
    }

    pub fn get(&self, id: GroupId) -> Option<Arc<Group>> {
        self.groups.read().get(&id).cloned()
    }

    pub fn group_ids(&self) -> Vec<GroupId> {
        self.groups.read().keys().copied().collect()
    }

    /// Add a component with `symbol` to the current group.
    pub fn add_component(&self, symbol: char) -> CoreResult<(GroupId, Slot, Symbol)> {
        let group = self.current()?;
        let symbol = Symbol::try_from(symbol)?;
        let slot = group.add_component(symbol, self.slot_limit)?;
        Ok((group.id(), slot, symbol))
    }

    pub fn status(&self, slot: Slot) -> CoreResult<ComponentStatus> {
        self.current()?.status(slot)
    }

    pub fn component(&self, slot: Slot) -> CoreResult<ComponentInfo> {
        self.current()?.component(slot)
    }

    pub fn summary(&self) -> CoreResult<(GroupId, Vec<ComponentInfo>)> {
        let group = self.current()?;
        Ok((group.id(), group.summary()))
    }

    /// Set or clear the deadline of the current group.
    pub fn set_group_deadline(&self, deadline: Option<Duration>) -> CoreResult<GroupId> {
        let group = self.current()?;
        group.set_deadline(deadline);
        debug!(group = group.id(), ?deadline, "group deadline set");
        Ok(group.id())
    }

    /// Set or clear the deadline override of one component of the current group.
    pub fn set_component_deadline(&self, slot: Slot, deadline: Option<Duration>) -> CoreResult<()> {
        let group = self.current()?;
        group.set_component_deadline(slot, deadline)?;
        debug!(group = group.id(), slot, ?deadline, "component deadline set");
        Ok(())
    }
}
