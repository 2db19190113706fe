// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::{Mutex, PoisonError};

use tracing::{debug, instrument};

use crate::record_store::{Message, SharedRecordStore, read_store, write_store};

/// Allocates message ids. Ids are never reused, even after the message is deleted.
#[derive(Debug)]
struct IdSequence {
    next: u64,
}

impl IdSequence {
    fn allocate(&mut self) -> String {
        let id = self.next;
        self.next += 1;
        id.to_string()
    }
}

/// The only writer of the record store.
///
/// Lock order: the id sequence, then the store.
pub struct MutationCoordinator {
    store: SharedRecordStore,
    sequence: Mutex<IdSequence>,
}

impl MutationCoordinator {
    /// The first allocated id follows the highest numeric message id already in the store.
    pub fn new(store: SharedRecordStore) -> Self {
        let next = read_store(&store).highest_numeric_message_id() + 1;

        Self {
            store,
            sequence: Mutex::new(IdSequence { next }),
        }
    }

    /// Create a message with a freshly allocated id. The author id is stored as given.
    #[instrument(skip(self, text))]
    pub fn post_message(&self, text: &str, author_id: &str) -> Message {
        let mut sequence = self
            .sequence
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let message = Message::new(&sequence.allocate(), text, author_id);
        write_store(&self.store).insert(message.clone());

        debug!(id = %message.id, "Posted message");
        message
    }

    /// Returns whether a message with the id existed (and was removed).
    #[instrument(skip(self))]
    pub fn delete_message(&self, id: &str) -> bool {
        write_store(&self.store).remove_by_id(id)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use crate::record_store::RecordStore;

    use super::*;

    #[test]
    fn ids_follow_seed_data() {
        let store = RecordStore::seeded().into_shared();
        let coordinator = MutationCoordinator::new(store.clone());

        let first = coordinator.post_message("Third", "1");
        let second = coordinator.post_message("Fourth", "7");

        assert_eq!(first.id, "3");
        assert_eq!(second.id, "4");
        assert_eq!(read_store(&store).message("4"), Some(&second));
    }

    #[test]
    fn ids_are_not_reused_after_deletion() {
        let store = RecordStore::seeded().into_shared();
        let coordinator = MutationCoordinator::new(store.clone());

        let posted = coordinator.post_message("Short-lived", "1");
        assert!(coordinator.delete_message(&posted.id));
        assert!(!coordinator.delete_message(&posted.id));

        assert_eq!(coordinator.post_message("Next", "1").id, "4");
    }

    #[test]
    fn concurrent_posts_get_distinct_ids() {
        let store = RecordStore::seeded().into_shared();
        let coordinator = MutationCoordinator::new(store.clone());

        let ids: Vec<String> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let coordinator = &coordinator;
                    scope.spawn(move || {
                        (0..25)
                            .map(|j| coordinator.post_message(&format!("{i}-{j}"), "1").id)
                            .collect::<Vec<_>>()
                    })
                })
                .collect();

            handles
                .into_iter()
                .flat_map(|handle| handle.join().unwrap())
                .collect()
        });

        let unique: HashSet<u64> = ids.iter().map(|id| id.parse().unwrap()).collect();
        assert_eq!(unique.len(), 200);
        assert_eq!(unique.iter().min(), Some(&3));
        assert_eq!(unique.iter().max(), Some(&202));
        assert_eq!(read_store(&store).messages().len(), 202);
    }
}
