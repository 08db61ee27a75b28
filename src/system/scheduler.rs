use std::collections::{BTreeMap, BTreeSet};

use crate::material::GraphKey;
use crate::util::ids::RenderUid;

/// The render queue and the bookkeeping of in-flight batches.
///
/// `pending` and `graph_uids` only shrink in [`RenderScheduler::reconcile`] (the renderer
/// confirmed the batch), [`RenderScheduler::clear_pending`] (fence) and
/// [`RenderScheduler::purge_graphs`] (destruction).
#[derive(Debug, Default)]
pub struct RenderScheduler {
    queue: Vec<GraphKey>,
    pending: BTreeSet<RenderUid>,
    graph_uids: BTreeMap<GraphKey, RenderUid>,
}

impl RenderScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when `graph` is already queued.
    pub fn enqueue(&mut self, graph: GraphKey) -> bool {
        if self.queue.contains(&graph) {
            return false;
        }
        self.queue.push(graph);
        true
    }

    pub fn queued(&self) -> &[GraphKey] {
        &self.queue
    }

    pub fn is_queued(&self, graph: GraphKey) -> bool {
        self.queue.contains(&graph)
    }

    /// The graphs to submit next, in queue order. Without `submit_all`, graphs whose last batch
    /// is still rendering stay queued, intermediate edits are skipped that way.
    pub fn select(&self, submit_all: bool, is_pending: impl Fn(RenderUid) -> bool) -> Vec<GraphKey> {
        self.queue
            .iter()
            .copied()
            .filter(|graph| {
                submit_all
                    || self
                        .graph_uids
                        .get(graph)
                        .is_none_or(|uid| !is_pending(*uid))
            })
            .collect()
    }

    /// Records that `submitted` went out as batch `uid`.
    pub fn commit(&mut self, uid: RenderUid, submitted: &[GraphKey]) {
        self.pending.insert(uid);
        self.queue.retain(|graph| !submitted.contains(graph));
        for graph in submitted {
            self.graph_uids.insert(*graph, uid);
        }
    }

    /// Unknown handles count as complete.
    pub fn is_complete(&self, uid: RenderUid) -> bool {
        !self.pending.contains(&uid)
    }

    pub fn pending(&self) -> impl Iterator<Item = RenderUid> + '_ {
        self.pending.iter().copied()
    }

    pub fn last_uid(&self, graph: GraphKey) -> Option<RenderUid> {
        self.graph_uids.get(&graph).copied()
    }

    /// Drops every batch the renderer no longer works on and returns them.
    pub fn reconcile(&mut self, is_pending: impl Fn(RenderUid) -> bool) -> Vec<RenderUid> {
        let finished: Vec<RenderUid> = self
            .pending
            .iter()
            .copied()
            .filter(|uid| !is_pending(*uid))
            .collect();

        if !finished.is_empty() {
            self.pending.retain(|uid| !finished.contains(uid));
            self.graph_uids.retain(|_, uid| !finished.contains(uid));
        }
        finished
    }

    pub fn clear_pending(&mut self) {
        self.pending.clear();
        self.graph_uids.clear();
    }

    /// Forgets destroyed graphs. Their batches stay pending until the renderer is done.
    pub fn purge_graphs(&mut self, graphs: &[GraphKey]) {
        self.queue.retain(|graph| !graphs.contains(graph));
        self.graph_uids.retain(|graph, _| !graphs.contains(graph));
    }
}

#[cfg(test)]
mod tests {
    use slotmap::SlotMap;

    use super::*;

    fn graphs(count: usize) -> Vec<GraphKey> {
        let mut arena = SlotMap::<GraphKey, ()>::with_key();
        (0..count).map(|_| arena.insert(())).collect()
    }

    #[test]
    fn enqueue_is_idempotent() {
        let keys = graphs(2);
        let mut scheduler = RenderScheduler::new();

        assert!(scheduler.enqueue(keys[0]));
        assert!(!scheduler.enqueue(keys[0]));
        assert!(scheduler.enqueue(keys[1]));
        assert_eq!(scheduler.queued(), &keys[..]);
    }

    #[test]
    fn forced_selection_empties_the_queue() {
        let keys = graphs(3);
        let mut scheduler = RenderScheduler::new();
        keys.iter().for_each(|key| {
            scheduler.enqueue(*key);
        });
        scheduler.commit(RenderUid(1), &keys[..1]);
        scheduler.enqueue(keys[0]);

        let selected = scheduler.select(true, |_| true);
        assert_eq!(selected.len(), 3);
        scheduler.commit(RenderUid(2), &selected);
        assert!(scheduler.queued().is_empty());
        assert_eq!(scheduler.last_uid(keys[0]), Some(RenderUid(2)));
    }

    #[test]
    fn async_selection_skips_graphs_still_rendering() {
        let keys = graphs(2);
        let mut scheduler = RenderScheduler::new();
        scheduler.enqueue(keys[0]);
        scheduler.commit(RenderUid(7), &keys[..1]);

        scheduler.enqueue(keys[0]);
        scheduler.enqueue(keys[1]);

        let busy = |uid: RenderUid| uid == RenderUid(7);
        assert_eq!(scheduler.select(false, busy), vec![keys[1]]);
        assert_eq!(scheduler.select(false, |_| false), keys);
    }

    #[test]
    fn reconcile_drops_finished_batches_only() {
        let keys = graphs(2);
        let mut scheduler = RenderScheduler::new();
        scheduler.commit(RenderUid(1), &keys[..1]);
        scheduler.commit(RenderUid(2), &keys[1..]);

        let finished = scheduler.reconcile(|uid| uid == RenderUid(2));
        assert_eq!(finished, vec![RenderUid(1)]);
        assert!(scheduler.is_complete(RenderUid(1)));
        assert!(!scheduler.is_complete(RenderUid(2)));
        assert_eq!(scheduler.last_uid(keys[0]), None);
        assert_eq!(scheduler.last_uid(keys[1]), Some(RenderUid(2)));

        assert!(scheduler.reconcile(|uid| uid == RenderUid(2)).is_empty());
        assert!(scheduler.is_complete(RenderUid(99)));
    }

    #[test]
    fn purging_keeps_the_batch_pending() {
        let keys = graphs(2);
        let mut scheduler = RenderScheduler::new();
        scheduler.commit(RenderUid(3), &keys);
        scheduler.enqueue(keys[0]);

        scheduler.purge_graphs(&keys[..1]);
        assert!(!scheduler.is_queued(keys[0]));
        assert_eq!(scheduler.last_uid(keys[0]), None);
        assert!(!scheduler.is_complete(RenderUid(3)));

        scheduler.clear_pending();
        assert!(scheduler.is_complete(RenderUid(3)));
        assert_eq!(scheduler.last_uid(keys[1]), None);
    }
}
