// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

/// The store shared between read resolvers and the [MutationCoordinator](crate::mutation_coordinator::MutationCoordinator).
pub type SharedRecordStore = Arc<RwLock<RecordStore>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
}

impl Author {
    pub fn new(id: &str, first_name: &str, last_name: &str) -> Self {
        Self {
            id: id.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub text: String,
    /// Not checked against the known authors.
    pub author_id: String,
}

impl Message {
    pub fn new(id: &str, text: &str, author_id: &str) -> Self {
        Self {
            id: id.to_string(),
            text: text.to_string(),
            author_id: author_id.to_string(),
        }
    }
}

/// Authors and messages, in insertion order.
///
/// Holds no lock of its own; see [SharedRecordStore].
#[derive(Debug, Default)]
pub struct RecordStore {
    authors: Vec<Author>,
    messages: Vec<Message>,
}

impl RecordStore {
    pub fn new(authors: Vec<Author>, messages: Vec<Message>) -> Self {
        Self { authors, messages }
    }

    /// The store with the initial data the service starts with.
    pub fn seeded() -> Self {
        Self::new(
            vec![
                Author::new("1", "John", "Doe"),
                Author::new("2", "Yusung", "Kim"),
            ],
            vec![
                Message::new("1", "Hello world", "1"),
                Message::new("2", "Second tweet", "2"),
            ],
        )
    }

    pub fn into_shared(self) -> SharedRecordStore {
        Arc::new(RwLock::new(self))
    }

    pub fn authors(&self) -> &[Author] {
        &self.authors
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn author(&self, id: &str) -> Option<&Author> {
        self.authors.iter().find(|author| author.id == id)
    }

    pub fn message(&self, id: &str) -> Option<&Message> {
        self.messages.iter().find(|message| message.id == id)
    }

    /// The largest message id that is a number (0 if there is none).
    pub fn highest_numeric_message_id(&self) -> u64 {
        self.messages
            .iter()
            .filter_map(|message| message.id.parse::<u64>().ok())
            .max()
            .unwrap_or(0)
    }

    pub(crate) fn insert(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Returns whether a message was removed.
    pub(crate) fn remove_by_id(&mut self, id: &str) -> bool {
        let count = self.messages.len();
        self.messages.retain(|message| message.id != id);
        self.messages.len() != count
    }
}

// Every write completes without panicking halfway, so the data behind a poisoned lock is still
// consistent.
pub fn read_store(store: &RwLock<RecordStore>) -> RwLockReadGuard<'_, RecordStore> {
    store.read().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn write_store(store: &RwLock<RecordStore>) -> RwLockWriteGuard<'_, RecordStore> {
    store.write().unwrap_or_else(PoisonError::into_inner)
}
