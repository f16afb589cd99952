//! Reverse traversal of a stored chain, tip first.

use std::iter::FusedIterator;
use std::sync::Arc;

use super::block::{Block, BlockHash};
use super::chain::ChainError;
use super::db::ChainStore;

/// Cursor walking from a starting hash back to genesis by following each
/// block's `prev_hash`.
///
/// The only state is the hash to fetch next, so blocks appended after the
/// iterator was created are never seen by it. Any error ends the
/// traversal: it is yielded once and every later call returns `None`.
pub struct ChainIterator {
    store: Arc<dyn ChainStore>,
    current: Option<BlockHash>,
}

impl ChainIterator {
    pub(crate) fn new(store: Arc<dyn ChainStore>, start: Option<BlockHash>) -> Self {
        Self {
            store,
            current: start,
        }
    }

    /// Hash of the block the next call to `next` will fetch.
    pub fn current_hash(&self) -> Option<&BlockHash> {
        self.current.as_ref()
    }
}

impl Iterator for ChainIterator {
    type Item = Result<Block, ChainError>;

    fn next(&mut self) -> Option<Self::Item> {
        let hash = self.current.take()?;
        match self.store.load_block(&hash) {
            Ok(Some(block)) => {
                self.current = block.prev_hash;
                Some(Ok(block))
            }
            Ok(None) => Some(Err(ChainError::NotFound {
                hash: hex::encode(hash),
            })),
            Err(e) => Some(Err(e)),
        }
    }
}

impl FusedIterator for ChainIterator {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Difficulty, TIP_KEY};
    use crate::storage::db::SledStore;

    fn sealed(data: &[u8], prev: Option<BlockHash>) -> Block {
        Block::with_timestamp(77, data.to_vec(), prev, Difficulty::new(4).unwrap())
    }

    #[test]
    fn empty_start_yields_nothing() {
        let store: Arc<dyn ChainStore> = Arc::new(SledStore::open_temporary().unwrap());
        let mut it = ChainIterator::new(store, None);
        assert!(it.current_hash().is_none());
        assert!(it.next().is_none());
    }

    #[test]
    fn follows_prev_hash_links() {
        let backing = SledStore::open_temporary().unwrap();
        let g = sealed(b"g", None);
        let a = sealed(b"a", Some(g.hash));
        for b in [&g, &a] {
            backing
                .put_block_and_advance_tip(&b.hash, &b.encode().unwrap())
                .unwrap();
        }

        let store: Arc<dyn ChainStore> = Arc::new(backing);
        let mut it = ChainIterator::new(store, Some(a.hash));
        assert_eq!(it.current_hash(), Some(&a.hash));
        assert_eq!(it.next().unwrap().unwrap(), a);
        assert_eq!(it.current_hash(), Some(&g.hash));
        assert_eq!(it.next().unwrap().unwrap(), g);
        assert!(it.current_hash().is_none());
        assert!(it.next().is_none());
        assert!(it.next().is_none());
    }

    #[test]
    fn missing_block_aborts_traversal() {
        let backing = SledStore::open_temporary().unwrap();
        let g = sealed(b"g", None);
        // `a` points at `g`, but `g` was never written.
        let a = sealed(b"a", Some(g.hash));
        backing.put(&a.hash, &a.encode().unwrap()).unwrap();
        backing.put(TIP_KEY, &a.hash).unwrap();

        let store: Arc<dyn ChainStore> = Arc::new(backing);
        let mut it = ChainIterator::new(store, Some(a.hash));
        assert!(it.next().unwrap().is_ok());
        match it.next() {
            Some(Err(ChainError::NotFound { hash })) => assert_eq!(hash, hex::encode(g.hash)),
            other => panic!("expected NotFound, got {other:?}"),
        }
        assert!(it.next().is_none());
    }
}
