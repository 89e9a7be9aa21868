// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

use ::slab::Slab;

// Doubly-linked lists whose links live inside the elements themselves.
//
// Elements are owned by a ListArena and addressed by stable slab keys. Any number of IntrusiveLists may thread through
// the same arena, but an element is a member of at most one of them at a time: moving an element between lists is an
// unlink followed by a link, and never copies or reallocates the element. All operations besides iteration are O(1).

// Links of an element.
#[derive(Debug, Default)]
struct Link {
    prev: Option<usize>,
    next: Option<usize>,
    linked: bool,
}

#[derive(Debug)]
struct Linked<T> {
    link: Link,
    value: T,
}

/// Storage shared by a set of intrusive lists.
#[derive(Debug)]
pub struct ListArena<T> {
    slab: Slab<Linked<T>>,
}

impl<T> ListArena<T> {
    pub fn new() -> Self {
        Self { slab: Slab::new() }
    }

    /// Number of elements stored, linked or not.
    #[inline]
    pub fn len(&self) -> usize {
        self.slab.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slab.is_empty()
    }

    /// Stores an unlinked element and returns its key.
    pub fn insert(&mut self, value: T) -> usize {
        self.slab.insert(Linked {
            link: Link::default(),
            value,
        })
    }

    /// Takes an element out of the arena. The element must have been unlinked first.
    pub fn remove(&mut self, key: usize) -> T {
        let linked: Linked<T> = self.slab.remove(key);
        debug_assert!(!linked.link.linked, "removing element {} while it is still linked", key);
        linked.value
    }

    #[inline]
    pub fn get(&self, key: usize) -> &T {
        &self.slab[key].value
    }

    #[inline]
    pub fn get_mut(&mut self, key: usize) -> &mut T {
        &mut self.slab[key].value
    }

    /// Element following `key` in whatever list it belongs to.
    #[inline]
    pub fn next_of(&self, key: usize) -> Option<usize> {
        self.slab[key].link.next
    }

    /// Element preceding `key` in whatever list it belongs to.
    #[inline]
    pub fn prev_of(&self, key: usize) -> Option<usize> {
        self.slab[key].link.prev
    }

    #[inline]
    fn link(&self, key: usize) -> &Link {
        &self.slab[key].link
    }

    #[inline]
    fn link_mut(&mut self, key: usize) -> &mut Link {
        &mut self.slab[key].link
    }
}

impl<T> Default for ListArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A list threaded through the elements of a [ListArena].
#[derive(Debug, Default)]
pub struct IntrusiveList {
    // Key of the first element.
    head: Option<usize>,
    // Key of the last element.
    tail: Option<usize>,
    // Length of the list in elements.
    len: usize,
}

impl IntrusiveList {
    #[inline]
    pub const fn new() -> Self {
        Self {
            head: None,
            tail: None,
            len: 0,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn front(&self) -> Option<usize> {
        self.head
    }

    #[inline]
    pub fn back(&self) -> Option<usize> {
        self.tail
    }

    /// Links `key` at the back of the list.
    pub fn push_back<T>(&mut self, arena: &mut ListArena<T>, key: usize) {
        let tail: Option<usize> = self.tail;
        self.insert_after(arena, tail, key);
    }

    /// Links `key` right after `anchor`, or at the front of the list when there is no anchor.
    pub fn insert_after<T>(&mut self, arena: &mut ListArena<T>, anchor: Option<usize>, key: usize) {
        debug_assert!(!arena.link(key).linked, "element {} is already linked", key);

        let next: Option<usize> = match anchor {
            Some(anchor) => arena.link(anchor).next,
            None => self.head,
        };

        {
            let link: &mut Link = arena.link_mut(key);
            link.prev = anchor;
            link.next = next;
            link.linked = true;
        }

        match anchor {
            Some(anchor) => arena.link_mut(anchor).next = Some(key),
            None => self.head = Some(key),
        }
        match next {
            Some(next) => arena.link_mut(next).prev = Some(key),
            None => self.tail = Some(key),
        }

        self.len += 1;
    }

    /// Unlinks `key`, which must be a member of this list. The element stays in the arena.
    pub fn unlink<T>(&mut self, arena: &mut ListArena<T>, key: usize) {
        debug_assert!(arena.link(key).linked, "element {} is not linked", key);

        let (prev, next): (Option<usize>, Option<usize>) = {
            let link: &mut Link = arena.link_mut(key);
            let neighbours: (Option<usize>, Option<usize>) = (link.prev.take(), link.next.take());
            link.linked = false;
            neighbours
        };

        match prev {
            Some(prev) => arena.link_mut(prev).next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => arena.link_mut(next).prev = prev,
            None => self.tail = prev,
        }

        self.len -= 1;
    }

    /// Unlinks the first element and returns its key.
    pub fn pop_front<T>(&mut self, arena: &mut ListArena<T>) -> Option<usize> {
        let head: usize = self.head?;
        self.unlink(arena, head);
        Some(head)
    }

    /// Iterates over the keys and values of the list, front to back.
    pub fn iter<'a, T>(&self, arena: &'a ListArena<T>) -> Iter<'a, T> {
        Iter {
            arena,
            cursor: self.head,
        }
    }
}

/// Front-to-back iterator over an [IntrusiveList].
pub struct Iter<'a, T> {
    arena: &'a ListArena<T>,
    cursor: Option<usize>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (usize, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let key: usize = self.cursor?;
        self.cursor = self.arena.next_of(key);
        Some((key, self.arena.get(key)))
    }
}

// Unit tests for IntrusiveList and ListArena types.
#[cfg(test)]
mod tests {
    use super::{
        IntrusiveList,
        ListArena,
    };
    use ::anyhow::Result;

    fn values(list: &IntrusiveList, arena: &ListArena<u32>) -> Vec<u32> {
        list.iter(arena).map(|(_, value)| *value).collect()
    }

    #[test]
    fn push_and_pop() -> Result<()> {
        let mut arena: ListArena<u32> = ListArena::new();
        let mut list: IntrusiveList = IntrusiveList::new();
        crate::ensure_eq!(list.is_empty(), true);

        for value in 0..4 {
            let key: usize = arena.insert(value);
            list.push_back(&mut arena, key);
        }
        crate::ensure_eq!(list.len(), 4);
        crate::ensure_eq!(values(&list, &arena), vec![0, 1, 2, 3]);

        while let Some(key) = list.pop_front(&mut arena) {
            arena.remove(key);
        }
        crate::ensure_eq!(list.is_empty(), true);
        crate::ensure_eq!(list.back(), None);
        crate::ensure_eq!(arena.is_empty(), true);

        Ok(())
    }

    #[test]
    fn insert_after_and_unlink() -> Result<()> {
        let mut arena: ListArena<u32> = ListArena::new();
        let mut list: IntrusiveList = IntrusiveList::new();

        let one: usize = arena.insert(1);
        let three: usize = arena.insert(3);
        let zero: usize = arena.insert(0);
        let two: usize = arena.insert(2);
        list.push_back(&mut arena, one);
        list.push_back(&mut arena, three);
        list.insert_after(&mut arena, None, zero);
        list.insert_after(&mut arena, Some(one), two);
        crate::ensure_eq!(values(&list, &arena), vec![0, 1, 2, 3]);
        crate::ensure_eq!(list.front(), Some(zero));
        crate::ensure_eq!(list.back(), Some(three));

        list.unlink(&mut arena, two);
        crate::ensure_eq!(values(&list, &arena), vec![0, 1, 3]);
        list.unlink(&mut arena, three);
        crate::ensure_eq!(list.back(), Some(one));
        crate::ensure_eq!(arena.next_of(one), None);
        list.unlink(&mut arena, zero);
        crate::ensure_eq!(list.front(), Some(one));
        crate::ensure_eq!(arena.prev_of(one), None);
        crate::ensure_eq!(list.len(), 1);

        // Unlinked elements remain in the arena until removed.
        crate::ensure_eq!(arena.len(), 4);
        crate::ensure_eq!(arena.remove(two), 2);

        Ok(())
    }

    #[test]
    fn move_between_lists() -> Result<()> {
        let mut arena: ListArena<u32> = ListArena::new();
        let mut from: IntrusiveList = IntrusiveList::new();
        let mut to: IntrusiveList = IntrusiveList::new();

        for value in 0..3 {
            let key: usize = arena.insert(value);
            from.push_back(&mut arena, key);
        }

        while let Some(key) = from.pop_front(&mut arena) {
            *arena.get_mut(key) += 10;
            to.push_back(&mut arena, key);
        }

        crate::ensure_eq!(from.len(), 0);
        crate::ensure_eq!(values(&to, &arena), vec![10, 11, 12]);
        crate::ensure_eq!(arena.len(), 3);

        Ok(())
    }
}
