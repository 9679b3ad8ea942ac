//! A single LSH table with arena bucket storage.
//!
//! Point ids live in one flat array per table. Each bucket is a chain through
//! a parallel `next` array, and the map only stores `(head, tail, len)` per
//! composite code, so inserting never allocates a per-bucket list. After a
//! batch insert, [`HashTable::compact`] rewrites the arena so each bucket's ids
//! are contiguous and a lookup is a linear scan. Batch inserts go through
//! [`HashTable::compact_if_fragmented`], which only rewrites once the ids
//! chained on since the last rewrite outnumber the compacted ones, keeping the
//! total rewrite cost linear in the number of inserts.

use std::collections::HashMap;
use std::iter::FusedIterator;

use crate::error::Result;
use crate::hash::CompositeHash;
use crate::PointId;

const NIL: u32 = u32::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BucketSpan {
    head: u32,
    tail: u32,
    len: u32,
}

/// One composite hash and the buckets it induces.
#[derive(Debug, Clone)]
pub struct HashTable {
    hash: CompositeHash,
    buckets: HashMap<u64, BucketSpan>,
    ids: Vec<PointId>,
    next: Vec<u32>,
    /// Arena slots laid out contiguously by the last compaction.
    compacted: usize,
}

impl HashTable {
    pub fn new(hash: CompositeHash) -> Self {
        Self {
            hash,
            buckets: HashMap::new(),
            ids: Vec::new(),
            next: Vec::new(),
            compacted: 0,
        }
    }

    /// Inserts `id` into the bucket of `vector`, returning the composite code.
    ///
    /// Inserting the same id twice is the caller's bug; the table does not check.
    pub fn insert(&mut self, id: PointId, vector: &[f32]) -> Result<u64> {
        let code = self.hash.code(vector)?;
        self.insert_code(code, id);
        Ok(code)
    }

    fn insert_code(&mut self, code: u64, id: PointId) {
        let slot = self.ids.len() as u32;
        self.ids.push(id);
        self.next.push(NIL);

        match self.buckets.get_mut(&code) {
            Some(span) => {
                self.next[span.tail as usize] = slot;
                span.tail = slot;
                span.len += 1;
            }
            None => {
                self.buckets.insert(
                    code,
                    BucketSpan {
                        head: slot,
                        tail: slot,
                        len: 1,
                    },
                );
            }
        }
    }

    /// Composite code of `vector` in this table.
    pub fn bucket_id(&self, vector: &[f32]) -> Result<u64> {
        self.hash.code(vector)
    }

    /// Ids sharing `query`'s bucket, in insertion order. A miss is an empty bucket.
    pub fn bucket(&self, query: &[f32]) -> Result<Bucket<'_>> {
        let code = self.hash.code(query)?;
        Ok(self.bucket_for_code(code))
    }

    /// Ids stored under a composite code.
    pub fn bucket_for_code(&self, code: u64) -> Bucket<'_> {
        match self.buckets.get(&code) {
            Some(span) => Bucket {
                ids: &self.ids,
                next: &self.next,
                cursor: span.head,
                remaining: span.len as usize,
            },
            None => Bucket {
                ids: &self.ids,
                next: &self.next,
                cursor: NIL,
                remaining: 0,
            },
        }
    }

    /// Owned copy of [`HashTable::bucket`].
    pub fn candidates(&self, query: &[f32]) -> Result<Vec<PointId>> {
        Ok(self.bucket(query)?.collect())
    }

    /// Rewrites the arena so every bucket occupies one contiguous run.
    ///
    /// Buckets are laid out in order of their first insertion; ids within a
    /// bucket keep insertion order.
    pub fn compact(&mut self) {
        let mut spans: Vec<(u64, BucketSpan)> =
            self.buckets.iter().map(|(&code, &span)| (code, span)).collect();
        spans.sort_unstable_by_key(|(_, span)| span.head);

        let mut ids = Vec::with_capacity(self.ids.len());
        let mut next = Vec::with_capacity(self.next.len());
        for (code, span) in spans {
            let head = ids.len() as u32;
            let mut cursor = span.head;
            while cursor != NIL {
                ids.push(self.ids[cursor as usize]);
                next.push(ids.len() as u32);
                cursor = self.next[cursor as usize];
            }
            if let Some(last) = next.last_mut() {
                *last = NIL;
            }
            let tail = ids.len() as u32 - 1;
            self.buckets.insert(
                code,
                BucketSpan {
                    head,
                    tail,
                    len: span.len,
                },
            );
        }
        self.ids = ids;
        self.next = next;
        self.compacted = self.ids.len();
    }

    /// Compacts when at least as many ids were inserted since the last
    /// compaction as it laid out. Returns whether the arena was rewritten.
    pub fn compact_if_fragmented(&mut self) -> bool {
        let loose = self.fragmented_len();
        if loose == 0 || loose < self.compacted {
            return false;
        }
        self.compact();
        true
    }

    /// Ids inserted since the last compaction.
    pub fn fragmented_len(&self) -> usize {
        self.ids.len() - self.compacted
    }

    /// Number of ids stored.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Number of non-empty buckets.
    pub fn num_buckets(&self) -> usize {
        self.buckets.len()
    }

    /// Size of the largest bucket.
    pub fn max_bucket_len(&self) -> usize {
        self.buckets
            .values()
            .map(|s| s.len as usize)
            .max()
            .unwrap_or(0)
    }

    /// `(code, ids)` for every bucket, ordered by code.
    pub fn buckets(&self) -> Vec<(u64, Vec<PointId>)> {
        let mut out: Vec<(u64, Vec<PointId>)> = self
            .buckets
            .keys()
            .map(|&code| (code, self.bucket_for_code(code).collect()))
            .collect();
        out.sort_unstable_by_key(|(code, _)| *code);
        out
    }

    pub fn hash(&self) -> &CompositeHash {
        &self.hash
    }

    /// Approximate heap footprint in bytes.
    pub fn size_bytes(&self) -> usize {
        self.ids.capacity() * std::mem::size_of::<PointId>()
            + self.next.capacity() * std::mem::size_of::<u32>()
            + self.buckets.capacity()
                * (std::mem::size_of::<u64>() + std::mem::size_of::<BucketSpan>())
    }
}

/// Iterator over the ids of one bucket.
#[derive(Debug, Clone)]
pub struct Bucket<'a> {
    ids: &'a [PointId],
    next: &'a [u32],
    cursor: u32,
    remaining: usize,
}

impl Iterator for Bucket<'_> {
    type Item = PointId;

    #[inline]
    fn next(&mut self) -> Option<PointId> {
        if self.remaining == 0 {
            return None;
        }
        let slot = self.cursor as usize;
        self.cursor = self.next[slot];
        self.remaining -= 1;
        Some(self.ids[slot])
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Bucket<'_> {}

impl FusedIterator for Bucket<'_> {}
