/// A slab of doubly linked nodes addressed by stable indices.
///
/// Nodes never move once allocated, so an index handed out by [`LinkedArena::insert`]
/// stays valid until [`LinkedArena::remove`] frees it. Lists are described by a
/// [`Links`] handle owned by the caller, which lets several lists (e.g. LFU frequency
/// buckets) share one arena.
///
/// Useful for creating various caching policies
pub(crate) struct LinkedArena<T> {
    nodes: Vec<Option<Node<T>>>,
    free: Vec<usize>,
    len: usize,
}

struct Node<T> {
    item: T,
    prev: Option<usize>,
    next: Option<usize>,
}

/// The head (oldest) and tail (newest) of one list inside a [`LinkedArena`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Links {
    pub(crate) head: Option<usize>,
    pub(crate) tail: Option<usize>,
    pub(crate) len: usize,
}

impl Links {
    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<T> LinkedArena<T> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        LinkedArena {
            nodes: Vec::with_capacity(capacity),
            free: Vec::new(),
            len: 0,
        }
    }

    /// Number of allocated nodes, linked or not.
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn get(&self, idx: usize) -> Option<&T> {
        self.node(idx).map(|n| &n.item)
    }

    pub(crate) fn get_mut(&mut self, idx: usize) -> Option<&mut T> {
        self.node_mut(idx).map(|n| &mut n.item)
    }

    /// Allocate a detached node, reusing a freed slot if one exists.
    pub(crate) fn insert(&mut self, item: T) -> usize {
        let node = Node {
            item,
            prev: None,
            next: None,
        };

        self.len += 1;

        if let Some(idx) = self.free.pop() {
            self.nodes[idx] = Some(node);
            idx
        } else {
            self.nodes.push(Some(node));
            self.nodes.len() - 1
        }
    }

    /// Free the node at idx and return its item.
    ///
    /// The node must already be unlinked from whatever list held it.
    pub(crate) fn remove(&mut self, idx: usize) -> Option<T> {
        let node = self.nodes.get_mut(idx)?.take()?;
        debug_assert!(node.prev.is_none() && node.next.is_none(), "removed a linked node");

        self.free.push(idx);
        self.len -= 1;

        Some(node.item)
    }

    /// Append the detached node at idx to the tail of `list`.
    pub(crate) fn push_back(&mut self, list: &mut Links, idx: usize) {
        let old_tail = list.tail;

        if let Some(node) = self.node_mut(idx) {
            node.prev = old_tail;
            node.next = None;
        } else {
            return;
        }

        match old_tail {
            Some(tail) => {
                if let Some(node) = self.node_mut(tail) {
                    node.next = Some(idx);
                }
            }
            None => list.head = Some(idx),
        }

        list.tail = Some(idx);
        list.len += 1;
    }

    /// Remove the node at idx from `list`, passing its prev and next to each other.
    ///
    /// The node stays allocated.
    pub(crate) fn unlink(&mut self, list: &mut Links, idx: usize) {
        let (prev, next) = match self.node_mut(idx) {
            Some(node) => (node.prev.take(), node.next.take()),
            None => return,
        };

        match prev {
            Some(prev) => {
                if let Some(node) = self.node_mut(prev) {
                    node.next = next;
                }
            }
            None => list.head = next,
        }

        match next {
            Some(next) => {
                if let Some(node) = self.node_mut(next) {
                    node.prev = prev;
                }
            }
            None => list.tail = prev,
        }

        list.len -= 1;
    }

    /// Move the node at idx to the tail of `list`
    pub(crate) fn move_to_back(&mut self, list: &mut Links, idx: usize) {
        if list.tail == Some(idx) {
            return;
        }

        self.unlink(list, idx);
        self.push_back(list, idx);
    }

    /// Unlink and free the head of `list`.
    pub(crate) fn pop_front(&mut self, list: &mut Links) -> Option<T> {
        let head = list.head?;
        self.unlink(list, head);
        self.remove(head)
    }

    /// Iterate `list` from head to tail.
    pub(crate) fn iter<'a>(&'a self, list: &Links) -> impl Iterator<Item = &'a T> + 'a {
        let mut cursor = list.head;

        std::iter::from_fn(move || {
            let node = self.node(cursor?)?;
            cursor = node.next;
            Some(&node.item)
        })
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.len = 0;
    }

    /// Walk `list` in both directions and check the links agree with its length.
    #[cfg(test)]
    pub(crate) fn check_list(&self, list: &Links) -> Result<(), String> {
        let mut count = 0;
        let mut prev = None;
        let mut cursor = list.head;

        while let Some(idx) = cursor {
            let node = self.node(idx).ok_or_else(|| format!("dangling index {idx}"))?;
            if node.prev != prev {
                return Err(format!("node {idx} has prev {:?}, expected {:?}", node.prev, prev));
            }

            count += 1;
            if count > self.len {
                return Err("list contains a cycle".into());
            }

            prev = Some(idx);
            cursor = node.next;
        }

        if prev != list.tail {
            return Err(format!("tail is {:?}, walk ended at {:?}", list.tail, prev));
        }

        if count != list.len {
            return Err(format!("list len is {}, walked {count} nodes", list.len));
        }

        Ok(())
    }

    fn node(&self, idx: usize) -> Option<&Node<T>> {
        self.nodes.get(idx).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, idx: usize) -> Option<&mut Node<T>> {
        self.nodes.get_mut(idx).and_then(Option::as_mut)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn arena_with(items: &[i32]) -> (LinkedArena<i32>, Links, Vec<usize>) {
        let mut arena = LinkedArena::with_capacity(items.len());
        let mut list = Links::default();

        let idxs = items
            .iter()
            .map(|item| {
                let idx = arena.insert(*item);
                arena.push_back(&mut list, idx);
                idx
            })
            .collect();

        (arena, list, idxs)
    }

    fn collect(arena: &LinkedArena<i32>, list: &Links) -> Vec<i32> {
        arena.iter(list).copied().collect()
    }

    #[test]
    fn test_push_back_keeps_order() {
        let (arena, list, _) = arena_with(&[1, 2, 3]);

        assert_eq!(collect(&arena, &list), vec![1, 2, 3]);
        assert_eq!(list.len, 3);
        arena.check_list(&list).unwrap();
    }

    #[test]
    fn test_move_to_back() {
        let (mut arena, mut list, idxs) = arena_with(&[1, 2, 3]);

        arena.move_to_back(&mut list, idxs[0]);
        assert_eq!(collect(&arena, &list), vec![2, 3, 1]);

        arena.move_to_back(&mut list, idxs[2]);
        assert_eq!(collect(&arena, &list), vec![2, 1, 3]);

        // already the tail
        arena.move_to_back(&mut list, idxs[2]);
        assert_eq!(collect(&arena, &list), vec![2, 1, 3]);
        arena.check_list(&list).unwrap();
    }

    #[test]
    fn test_unlink_middle_and_ends() {
        let (mut arena, mut list, idxs) = arena_with(&[1, 2, 3, 4]);

        arena.unlink(&mut list, idxs[1]);
        assert_eq!(collect(&arena, &list), vec![1, 3, 4]);

        arena.unlink(&mut list, idxs[0]);
        arena.unlink(&mut list, idxs[3]);
        assert_eq!(collect(&arena, &list), vec![3]);
        assert_eq!(list.head, list.tail);
        arena.check_list(&list).unwrap();
    }

    #[test]
    fn test_pop_front_and_slot_reuse() {
        let (mut arena, mut list, idxs) = arena_with(&[1, 2]);

        assert_eq!(arena.pop_front(&mut list), Some(1));
        assert_eq!(arena.len(), 1);

        // the freed slot is handed out again and other indices are untouched
        let idx = arena.insert(5);
        assert_eq!(idx, idxs[0]);
        assert_eq!(arena.get(idxs[1]), Some(&2));

        arena.push_back(&mut list, idx);
        assert_eq!(collect(&arena, &list), vec![2, 5]);
        arena.check_list(&list).unwrap();
    }

    #[test]
    fn test_two_lists_share_one_arena() {
        let mut arena = LinkedArena::with_capacity(4);
        let mut odd = Links::default();
        let mut even = Links::default();

        for i in 0..4 {
            let idx = arena.insert(i);
            if i % 2 == 0 {
                arena.push_back(&mut even, idx);
            } else {
                arena.push_back(&mut odd, idx);
            }
        }

        assert_eq!(collect(&arena, &even), vec![0, 2]);
        assert_eq!(collect(&arena, &odd), vec![1, 3]);

        let first = even.head.unwrap();
        arena.unlink(&mut even, first);
        arena.push_back(&mut odd, first);

        assert_eq!(collect(&arena, &even), vec![2]);
        assert_eq!(collect(&arena, &odd), vec![1, 3, 0]);
        arena.check_list(&even).unwrap();
        arena.check_list(&odd).unwrap();
    }
}
