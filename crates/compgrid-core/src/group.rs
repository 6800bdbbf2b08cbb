use std::{collections::BTreeMap, time::Duration};

use parking_lot::RwLock;
use tracing::debug;

use compgrid_model::{ComponentInfo, ComponentStatus, GroupId, Slot, Symbol};

use crate::{
    component::Component,
    error::{CoreError, CoreResult},
};

/// A named set of components that run together.
///
/// The component map is swapped wholesale at the start of a run; queries always see one coherent map.
#[derive(Debug)]
pub struct Group {
    id: GroupId,
    inner: RwLock<GroupInner>,
}

#[derive(Debug, Default)]
struct GroupInner {
    components: BTreeMap<Slot, Component>,
    running: bool,
    deadline: Option<Duration>,
}

impl Group {
    pub fn new(id: GroupId) -> Self {
        Self {
            id,
            inner: RwLock::new(GroupInner::default()),
        }
    }

    pub fn id(&self) -> GroupId {
        self.id
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.inner.read().deadline
    }

    pub fn set_deadline(&self, deadline: Option<Duration>) {
        self.inner.write().deadline = deadline;
    }

    pub fn is_running(&self) -> bool {
        self.inner.read().running
    }

    pub fn len(&self) -> usize {
        self.inner.read().components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().components.is_empty()
    }

    /// Create a `CREATED` component in the next free slot.
    ///
    /// The slot is the current component count, moved past any slot still taken in a sparse map.
    /// `slot_limit` is the number of service endpoints. Rejected while a run owns the map.
    pub fn add_component(&self, symbol: Symbol, slot_limit: usize) -> CoreResult<Slot> {
        let mut inner = self.inner.write();
        if inner.running {
            return Err(CoreError::GroupRunning(self.id));
        }
        let mut slot = inner.components.len();
        while inner.components.contains_key(&slot) {
            slot += 1;
        }
        if slot >= slot_limit {
            return Err(CoreError::SlotOutOfRange {
                slot,
                endpoints: slot_limit,
            });
        }

        inner.components.insert(slot, Component::new(slot, symbol));
        debug!(group = self.id, slot, %symbol, "component created");
        Ok(slot)
    }

    pub fn set_component_deadline(&self, slot: Slot, deadline: Option<Duration>) -> CoreResult<()> {
        let mut inner = self.inner.write();
        if inner.running {
            return Err(CoreError::GroupRunning(self.id));
        }
        let component = inner
            .components
            .get_mut(&slot)
            .ok_or(CoreError::ComponentNotFound(slot))?;
        component.set_deadline(deadline);
        Ok(())
    }

    pub fn status(&self, slot: Slot) -> CoreResult<ComponentStatus> {
        self.inner
            .read()
            .components
            .get(&slot)
            .map(Component::status)
            .ok_or(CoreError::ComponentNotFound(slot))
    }

    pub fn component(&self, slot: Slot) -> CoreResult<ComponentInfo> {
        self.inner
            .read()
            .components
            .get(&slot)
            .map(Component::info)
            .ok_or(CoreError::ComponentNotFound(slot))
    }

    /// Snapshot of every live component, ordered by slot.
    pub fn summary(&self) -> Vec<ComponentInfo> {
        self.inner
            .read()
            .components
            .values()
            .map(Component::info)
            .collect()
    }

    /// Set the running flag, or fail if a run is already in flight.
    pub(crate) fn begin_run(&self) -> CoreResult<()> {
        let mut inner = self.inner.write();
        if inner.running {
            return Err(CoreError::GroupRunning(self.id));
        }
        inner.running = true;
        Ok(())
    }

    pub(crate) fn end_run(&self) {
        self.inner.write().running = false;
    }

    /// Fresh successors of every live component, with any earlier run abandoned.
    pub(crate) fn successors(&self) -> Vec<Component> {
        let inner = self.inner.read();
        inner
            .components
            .values()
            .map(|c| {
                c.release();
                c.successor()
            })
            .collect()
    }

    /// Swap in the components of a new run.
    pub(crate) fn replace_components(&self, components: BTreeMap<Slot, Component>) {
        let mut inner = self.inner.write();
        inner.components = components;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_are_dense_at_creation() {
        let g = Group::new(1);
        assert_eq!(g.add_component(Symbol::Factorial, 10).unwrap(), 0);
        assert_eq!(g.add_component(Symbol::Fibonacci, 10).unwrap(), 1);
        assert_eq!(g.add_component(Symbol::Primality, 10).unwrap(), 2);
        assert_eq!(g.len(), 3);
    }

    #[test]
    fn sparse_map_never_reuses_a_live_slot() {
        let g = Group::new(1);
        for s in [Symbol::Factorial, Symbol::Fibonacci, Symbol::Primality] {
            g.add_component(s, 10).unwrap();
        }
        // a run that could not reconnect slot 0
        let survivors: BTreeMap<_, _> = g
            .successors()
            .into_iter()
            .filter(|c| c.slot() != 0)
            .map(|c| (c.slot(), c))
            .collect();
        g.replace_components(survivors);

        assert_eq!(g.add_component(Symbol::SquareRoot, 10).unwrap(), 3);
        assert_eq!(g.status(1).unwrap(), ComponentStatus::Created);
        assert_eq!(g.component(3).unwrap().symbol, Symbol::SquareRoot);
    }

    #[test]
    fn slot_beyond_endpoints_is_rejected() {
        let g = Group::new(2);
        g.add_component(Symbol::Factorial, 1).unwrap();
        assert_eq!(
            g.add_component(Symbol::Factorial, 1),
            Err(CoreError::SlotOutOfRange {
                slot: 1,
                endpoints: 1
            })
        );
    }

    #[test]
    fn unknown_slot_is_not_found() {
        let g = Group::new(1);
        assert_eq!(g.status(0), Err(CoreError::ComponentNotFound(0)));
        assert_eq!(
            g.set_component_deadline(4, Some(Duration::from_secs(1))),
            Err(CoreError::ComponentNotFound(4))
        );
    }

    #[test]
    fn second_run_is_rejected_until_first_ends() {
        let g = Group::new(7);
        g.begin_run().unwrap();
        assert!(g.is_running());
        assert_eq!(g.begin_run(), Err(CoreError::GroupRunning(7)));
        g.end_run();
        assert!(!g.is_running());
        assert!(g.begin_run().is_ok());
    }

    #[test]
    fn component_map_is_frozen_while_running() {
        let g = Group::new(3);
        g.add_component(Symbol::Factorial, 10).unwrap();
        g.begin_run().unwrap();

        assert_eq!(
            g.add_component(Symbol::Fibonacci, 10),
            Err(CoreError::GroupRunning(3))
        );
        assert_eq!(
            g.set_component_deadline(0, Some(Duration::from_secs(1))),
            Err(CoreError::GroupRunning(3))
        );
        assert_eq!(g.len(), 1);
        assert_eq!(g.component(0).unwrap().deadline_secs, None);

        g.end_run();
        assert_eq!(g.add_component(Symbol::Fibonacci, 10).unwrap(), 1);
    }

    #[test]
    fn deadlines_are_stored() {
        let g = Group::new(1);
        assert_eq!(g.deadline(), None);
        g.set_deadline(Some(Duration::from_secs(3)));
        assert_eq!(g.deadline(), Some(Duration::from_secs(3)));

        g.add_component(Symbol::Factorial, 10).unwrap();
        g.set_component_deadline(0, Some(Duration::from_secs(1))).unwrap();
        assert_eq!(g.component(0).unwrap().deadline_secs, Some(1));
    }

    #[test]
    fn summary_is_ordered_by_slot() {
        let g = Group::new(1);
        g.add_component(Symbol::SquareRoot, 10).unwrap();
        g.add_component(Symbol::Factorial, 10).unwrap();
        let slots: Vec<_> = g.summary().into_iter().map(|i| i.slot).collect();
        assert_eq!(slots, vec![0, 1]);
    }
}
