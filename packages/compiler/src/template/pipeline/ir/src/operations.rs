//! IR Operations
//!
//! Defines the base `Op` trait and `OpList`, the ordered container every phase rewrites.
//!
//! An `OpList` is an arena of nodes linked by index. Nodes 0 and 1 are the head and tail
//! sentinels; every other node holds one operation. Operations are addressed by `OpId`, which
//! carries the owning list and a generation counter so that ids of removed or replaced operations
//! are detected instead of silently aliasing whatever reuses their node.

use std::fmt;

use crate::error::{PipelineError, Result};
use crate::template::pipeline::ir::enums::OpKind;

/// Base trait for semantic operations being performed within a template.
pub trait Op {
    fn kind(&self) -> OpKind;
}

/// Identity of one `OpList`, minted by the owning job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListId(pub usize);

/// Stable handle to an operation inside a specific list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OpId {
    list: ListId,
    index: u32,
    generation: u32,
}

impl OpId {
    pub fn list(&self) -> ListId {
        self.list
    }

    /// Whether this id names one of the two sentinels.
    pub fn is_sentinel(&self) -> bool {
        self.index == HEAD || self.index == TAIL
    }
}

const HEAD: u32 = 0;
const TAIL: u32 = 1;

struct Node<T> {
    op: Option<T>,
    prev: u32,
    next: u32,
    generation: u32,
}

impl<T> Node<T> {
    fn sentinel(prev: u32, next: u32) -> Self {
        Node {
            op: None,
            prev,
            next,
            generation: 0,
        }
    }
}

/// A doubly linked list of `Op` nodes of a given subtype.
///
/// All mutations are O(1) except `prepend`, which is linear in the number of prepended ops.
pub struct OpList<T> {
    id: ListId,
    nodes: Vec<Node<T>>,
    free: Vec<u32>,
    len: usize,
}

impl<T> OpList<T> {
    pub fn new(id: ListId) -> Self {
        OpList {
            id,
            nodes: vec![Node::sentinel(HEAD, TAIL), Node::sentinel(HEAD, TAIL)],
            free: Vec::new(),
            len: 0,
        }
    }

    pub fn id(&self) -> ListId {
        self.id
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn id_at(&self, index: u32) -> OpId {
        OpId {
            list: self.id,
            index,
            generation: self.nodes[index as usize].generation,
        }
    }

    /// The head sentinel. Inserting after it prepends.
    pub fn head(&self) -> OpId {
        self.id_at(HEAD)
    }

    /// The tail sentinel. Inserting before it appends.
    pub fn tail(&self) -> OpId {
        self.id_at(TAIL)
    }

    pub fn first(&self) -> Option<OpId> {
        let next = self.nodes[HEAD as usize].next;
        (next != TAIL).then(|| self.id_at(next))
    }

    pub fn last(&self) -> Option<OpId> {
        let prev = self.nodes[TAIL as usize].prev;
        (prev != HEAD).then(|| self.id_at(prev))
    }

    /// The operation after `id`, or `None` at the end of the list or for a stale id.
    pub fn next(&self, id: OpId) -> Option<OpId> {
        let index = self.resolve(id).ok()?;
        let next = self.nodes[index as usize].next;
        (next != TAIL).then(|| self.id_at(next))
    }

    pub fn prev(&self, id: OpId) -> Option<OpId> {
        let index = self.resolve(id).ok()?;
        let prev = self.nodes[index as usize].prev;
        (prev != HEAD).then(|| self.id_at(prev))
    }

    /// Whether `id` names a live operation of this list.
    pub fn contains(&self, id: OpId) -> bool {
        self.resolve_op(id).is_ok()
    }

    /// Resolves an id to a node index; sentinels are accepted.
    fn resolve(&self, id: OpId) -> Result<u32> {
        if id.list != self.id {
            return Err(PipelineError::OpNotOwned {
                op: id,
                list: self.id,
            });
        }
        match self.nodes.get(id.index as usize) {
            Some(node)
                if node.generation == id.generation
                    && (node.op.is_some() || id.is_sentinel()) =>
            {
                Ok(id.index)
            }
            _ => Err(PipelineError::StaleOp(id)),
        }
    }

    /// Resolves an id to a node index holding an operation.
    fn resolve_op(&self, id: OpId) -> Result<u32> {
        let index = self.resolve(id)?;
        if id.is_sentinel() {
            return Err(PipelineError::SentinelMutation(self.id));
        }
        Ok(index)
    }

    pub fn get(&self, id: OpId) -> Result<&T> {
        let index = self.resolve_op(id)?;
        self.nodes[index as usize]
            .op
            .as_ref()
            .ok_or(PipelineError::StaleOp(id))
    }

    pub fn get_mut(&mut self, id: OpId) -> Result<&mut T> {
        let index = self.resolve_op(id)?;
        self.nodes[index as usize]
            .op
            .as_mut()
            .ok_or(PipelineError::StaleOp(id))
    }

    fn allocate(&mut self, op: T) -> u32 {
        match self.free.pop() {
            Some(index) => {
                let node = &mut self.nodes[index as usize];
                node.op = Some(op);
                index
            }
            None => {
                self.nodes.push(Node {
                    op: Some(op),
                    prev: HEAD,
                    next: TAIL,
                    generation: 0,
                });
                (self.nodes.len() - 1) as u32
            }
        }
    }

    fn link_between(&mut self, index: u32, prev: u32, next: u32) {
        self.nodes[index as usize].prev = prev;
        self.nodes[index as usize].next = next;
        self.nodes[prev as usize].next = index;
        self.nodes[next as usize].prev = index;
        self.len += 1;
    }

    fn unlink(&mut self, index: u32) {
        let (prev, next) = {
            let node = &self.nodes[index as usize];
            (node.prev, node.next)
        };
        self.nodes[prev as usize].next = next;
        self.nodes[next as usize].prev = prev;
        self.len -= 1;
    }

    /// Push a new operation to the tail of the list.
    pub fn push(&mut self, op: T) -> OpId {
        let index = self.allocate(op);
        let prev = self.nodes[TAIL as usize].prev;
        self.link_between(index, prev, TAIL);
        self.id_at(index)
    }

    pub fn push_all(&mut self, ops: impl IntoIterator<Item = T>) {
        for op in ops {
            self.push(op);
        }
    }

    /// Prepend operations to the start of the list, keeping their relative order.
    pub fn prepend(&mut self, ops: Vec<T>) {
        let mut after = HEAD;
        for op in ops {
            let index = self.allocate(op);
            let next = self.nodes[after as usize].next;
            self.link_between(index, after, next);
            after = index;
        }
    }

    /// Insert `op` before `anchor`. The tail sentinel is a valid anchor.
    pub fn insert_before(&mut self, anchor: OpId, op: T) -> Result<OpId> {
        let anchor_index = self.resolve(anchor)?;
        if anchor_index == HEAD {
            return Err(PipelineError::SentinelMutation(self.id));
        }
        let prev = self.nodes[anchor_index as usize].prev;
        let index = self.allocate(op);
        self.link_between(index, prev, anchor_index);
        Ok(self.id_at(index))
    }

    /// Insert `op` after `anchor`. The head sentinel is a valid anchor.
    pub fn insert_after(&mut self, anchor: OpId, op: T) -> Result<OpId> {
        let anchor_index = self.resolve(anchor)?;
        if anchor_index == TAIL {
            return Err(PipelineError::SentinelMutation(self.id));
        }
        let next = self.nodes[anchor_index as usize].next;
        let index = self.allocate(op);
        self.link_between(index, anchor_index, next);
        Ok(self.id_at(index))
    }

    /// Insert several operations before `anchor`, keeping their relative order.
    pub fn insert_all_before(&mut self, anchor: OpId, ops: Vec<T>) -> Result<()> {
        for op in ops {
            self.insert_before(anchor, op)?;
        }
        Ok(())
    }

    /// Unlink an operation and hand it back. Its id becomes stale.
    pub fn remove(&mut self, id: OpId) -> Result<T> {
        let index = self.resolve_op(id)?;
        self.unlink(index);
        let node = &mut self.nodes[index as usize];
        node.generation = node.generation.wrapping_add(1);
        let op = node.op.take().ok_or(PipelineError::StaleOp(id))?;
        self.free.push(index);
        Ok(op)
    }

    /// Replace an operation in place. The old id becomes stale; the returned id names `new_op`.
    pub fn replace(&mut self, id: OpId, new_op: T) -> Result<(OpId, T)> {
        let index = self.resolve_op(id)?;
        let node = &mut self.nodes[index as usize];
        node.generation = node.generation.wrapping_add(1);
        let old = node.op.replace(new_op).ok_or(PipelineError::StaleOp(id))?;
        Ok((self.id_at(index), old))
    }

    /// Replace an operation with one built from it.
    pub fn replace_with(&mut self, id: OpId, build: impl FnOnce(T) -> T) -> Result<OpId> {
        let index = self.resolve_op(id)?;
        let node = &mut self.nodes[index as usize];
        let old = node.op.take().ok_or(PipelineError::StaleOp(id))?;
        node.op = Some(build(old));
        node.generation = node.generation.wrapping_add(1);
        Ok(self.id_at(index))
    }

    /// Node indices in list order.
    fn order(&self) -> Vec<u32> {
        let mut order = Vec::with_capacity(self.len);
        let mut cursor = self.nodes[HEAD as usize].next;
        while cursor != TAIL {
            order.push(cursor);
            cursor = self.nodes[cursor as usize].next;
        }
        order
    }

    /// Snapshot of the ids currently in the list, in order.
    pub fn ids(&self) -> Vec<OpId> {
        self.order().into_iter().map(|i| self.id_at(i)).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        let mut cursor = self.nodes[HEAD as usize].next;
        std::iter::from_fn(move || {
            if cursor == TAIL {
                return None;
            }
            let node = &self.nodes[cursor as usize];
            cursor = node.next;
            node.op.as_ref()
        })
    }

    pub fn iter_with_ids(&self) -> impl Iterator<Item = (OpId, &T)> + '_ {
        self.order()
            .into_iter()
            .filter_map(move |i| self.nodes[i as usize].op.as_ref().map(|op| (self.id_at(i), op)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> + '_ {
        let order = self.order();
        let mut slots: Vec<Option<&mut T>> =
            self.nodes.iter_mut().map(|node| node.op.as_mut()).collect();
        order
            .into_iter()
            .filter_map(move |i| slots.get_mut(i as usize).and_then(Option::take))
    }

    /// Unlink every operation, returning them in order.
    pub fn take_all(&mut self) -> Vec<T> {
        let ids = self.ids();
        ids.into_iter().filter_map(|id| self.remove(id).ok()).collect()
    }

    /// Check the link structure: both directions agree, the sentinels bound the chain and the
    /// live node count matches.
    pub fn validate(&self) -> Result<()> {
        let mut count = 0usize;
        let mut prev = HEAD;
        let mut cursor = self.nodes[HEAD as usize].next;
        while cursor != TAIL {
            let node = self
                .nodes
                .get(cursor as usize)
                .ok_or_else(|| PipelineError::assertion("op list link out of bounds"))?;
            if node.prev != prev {
                return Err(PipelineError::assertion(format!(
                    "op list {:?}: node {} has prev {} but was reached from {}",
                    self.id, cursor, node.prev, prev
                )));
            }
            if node.op.is_none() {
                return Err(PipelineError::assertion(format!(
                    "op list {:?}: linked node {} holds no operation",
                    self.id, cursor
                )));
            }
            count += 1;
            if count > self.nodes.len() {
                return Err(PipelineError::assertion("op list contains a cycle"));
            }
            prev = cursor;
            cursor = node.next;
        }
        if self.nodes[TAIL as usize].prev != prev {
            return Err(PipelineError::assertion(format!(
                "op list {:?}: tail sentinel does not point back at the last node",
                self.id
            )));
        }
        if count != self.len {
            return Err(PipelineError::assertion(format!(
                "op list {:?}: {} linked nodes but length is {}",
                self.id, count, self.len
            )));
        }
        Ok(())
    }
}

impl<T: Op> OpList<T> {
    /// The kind of the node `id` names; sentinels report `ListEnd`.
    pub fn kind(&self, id: OpId) -> Result<OpKind> {
        let index = self.resolve(id)?;
        Ok(self.nodes[index as usize]
            .op
            .as_ref()
            .map_or(OpKind::ListEnd, Op::kind))
    }
}

impl<T: fmt::Debug> fmt::Debug for OpList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpList")
            .field("id", &self.id)
            .field("ops", &self.iter().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Dummy(u32);

    impl Op for Dummy {
        fn kind(&self) -> OpKind {
            OpKind::Statement
        }
    }

    fn values(list: &OpList<Dummy>) -> Vec<u32> {
        list.iter().map(|d| d.0).collect()
    }

    #[test]
    fn test_push_insert_remove_keep_order() {
        let mut list = OpList::new(ListId(0));
        let a = list.push(Dummy(1));
        let c = list.push(Dummy(3));
        list.insert_before(c, Dummy(2)).unwrap();
        list.insert_after(a, Dummy(10)).unwrap();
        assert_eq!(values(&list), vec![1, 10, 2, 3]);
        assert_eq!(list.remove(a).unwrap(), Dummy(1));
        assert_eq!(values(&list), vec![10, 2, 3]);
        list.validate().unwrap();
    }

    #[test]
    fn test_removed_id_is_stale_even_after_reuse() {
        let mut list = OpList::new(ListId(0));
        let a = list.push(Dummy(1));
        list.remove(a).unwrap();
        let b = list.push(Dummy(2));
        assert_ne!(a, b);
        assert_eq!(list.get(a).unwrap_err(), PipelineError::StaleOp(a));
        assert_eq!(list.get(b).unwrap(), &Dummy(2));
    }

    #[test]
    fn test_sentinels_cannot_be_removed() {
        let mut list: OpList<Dummy> = OpList::new(ListId(3));
        let head = list.head();
        assert_eq!(
            list.remove(head).unwrap_err(),
            PipelineError::SentinelMutation(ListId(3))
        );
        assert_eq!(list.kind(list.tail()).unwrap(), OpKind::ListEnd);
    }

    #[test]
    fn test_foreign_id_is_rejected() {
        let mut a = OpList::new(ListId(0));
        let mut b: OpList<Dummy> = OpList::new(ListId(1));
        let id = a.push(Dummy(1));
        assert!(matches!(
            b.remove(id),
            Err(PipelineError::OpNotOwned { .. })
        ));
    }

    #[test]
    fn test_prepend_and_replace() {
        let mut list = OpList::new(ListId(0));
        let x = list.push(Dummy(5));
        list.prepend(vec![Dummy(1), Dummy(2)]);
        let (y, old) = list.replace(x, Dummy(6)).unwrap();
        assert_eq!(old, Dummy(5));
        assert!(!list.contains(x));
        assert!(list.contains(y));
        assert_eq!(values(&list), vec![1, 2, 6]);
        list.validate().unwrap();
    }

    #[test]
    fn test_iter_mut_in_list_order() {
        let mut list = OpList::new(ListId(0));
        let first = list.push(Dummy(1));
        list.push(Dummy(2));
        list.remove(first).unwrap();
        list.prepend(vec![Dummy(0)]);
        for op in list.iter_mut() {
            op.0 *= 10;
        }
        assert_eq!(values(&list), vec![0, 20]);
    }
}
