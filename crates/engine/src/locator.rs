//! Predecessor locator: finds the splice point for a vault in the remote list.
//!
//! The Vaults contract keeps one ascending singly-linked list per currency and
//! needs the key of the node that must precede a vault to insert, move or remove
//! it in O(1). The list can be arbitrarily long, so it is walked forward in
//! bounded pages and only a single candidate key is carried between pages.
//!
//! Placement rules, matching what the contract accepts:
//! - a target below the head (or an empty list) has no predecessor;
//! - a vault's own node is never its own predecessor;
//! - a target equal to existing indices lands after all of them.
//!
//! The answer is a hint. The contract re-validates it and rejects stale keys.

use alloy::primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use fxdao_common::types::{Denomination, Vault, VaultKey};

use crate::reader::{ListReader, ReaderError};

/// Default number of vaults requested per page.
pub const DEFAULT_PAGE_SIZE: u32 = 15;

/// A single predecessor query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocateRequest {
    /// Index the vault has (or will have) in the list.
    pub target: U256,
    /// Owner of the vault being inserted, updated or removed.
    pub account: Address,
    pub denomination: Denomination,
    /// `false` when looking up the vault's current predecessor: a node whose
    /// `next` is this vault ends the walk. `true` when looking up where the vault
    /// lands after a change.
    pub exclude_self: bool,
}

/// Stateless walker over a [`ListReader`].
#[derive(Debug, Clone, Copy)]
pub struct PredecessorLocator {
    page_size: u32,
}

impl PredecessorLocator {
    pub fn new() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Use a custom page size (clamped to at least 1).
    pub fn with_page_size(page_size: u32) -> Self {
        Self {
            page_size: page_size.max(1),
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Find the key that must precede `request.target`, or `None` if the vault
    /// becomes (or stays) the head of the list.
    ///
    /// Every call re-reads the list. Any reader failure aborts the call.
    pub async fn locate<R>(
        &self,
        reader: &R,
        request: &LocateRequest,
    ) -> Result<Option<VaultKey>, ReaderError>
    where
        R: ListReader + ?Sized,
    {
        let info = reader.get_head(request.denomination).await?;

        let Some(lowest) = info.lowest_key else {
            tracing::debug!(
                denomination = %request.denomination,
                "Vault list is empty, target becomes the head"
            );
            return Ok(None);
        };

        if lowest.index > request.target {
            tracing::debug!(
                denomination = %request.denomination,
                lowest_index = %lowest.index,
                target = %request.target,
                "Target is below the lowest vault, target becomes the head"
            );
            return Ok(None);
        }

        if lowest.index == request.target {
            if lowest.account == request.account {
                // Already the head, and stays there.
                return Ok(None);
            }

            let head = reader
                .get_node(lowest.account, request.denomination)
                .await?;
            if self.ends_walk(&head, request) {
                tracing::debug!(
                    denomination = %request.denomination,
                    prev = %lowest.account,
                    "Target shares the head's index and nothing equal follows it"
                );
                return Ok(Some(lowest));
            }
        }

        self.walk(reader, request).await
    }

    /// Forward walk from the head of the list.
    ///
    /// `cursor` is the best predecessor seen so far. `anchor` is where the next
    /// page starts, which is the last node of the previous page regardless of
    /// whether that node was a candidate.
    async fn walk<R>(
        &self,
        reader: &R,
        request: &LocateRequest,
    ) -> Result<Option<VaultKey>, ReaderError>
    where
        R: ListReader + ?Sized,
    {
        let mut cursor: Option<VaultKey> = None;
        let mut anchor: Option<VaultKey> = None;
        let mut pages: u32 = 0;

        loop {
            let page = reader
                .get_page(anchor.as_ref(), request.denomination, self.page_size)
                .await?;
            pages += 1;

            tracing::debug!(
                denomination = %request.denomination,
                page = pages,
                vaults = page.len(),
                "Fetched vault page"
            );

            for vault in &page {
                if vault.is_owned_by(request.account) {
                    continue;
                }

                if vault.index <= request.target {
                    cursor = Some(vault.key());
                }

                if self.ends_walk(vault, request) {
                    tracing::debug!(
                        denomination = %request.denomination,
                        pages,
                        prev = ?cursor.as_ref().map(|k| k.account),
                        "Predecessor located"
                    );
                    return Ok(cursor);
                }
            }

            if page.len() < self.page_size as usize {
                break;
            }

            let last = page.last().map(Vault::key);
            if last == anchor {
                tracing::warn!(
                    denomination = %request.denomination,
                    pages,
                    "Vault page did not advance, treating as end of list"
                );
                break;
            }
            anchor = last;
        }

        tracing::debug!(
            denomination = %request.denomination,
            pages,
            prev = ?cursor.as_ref().map(|k| k.account),
            "Reached end of vault list"
        );
        Ok(cursor)
    }

    /// Whether the walk stops at `vault`: it is the tail, its successor sorts
    /// after the target, or (when self may be a neighbour) its successor is the
    /// vault being looked up.
    fn ends_walk(&self, vault: &Vault, request: &LocateRequest) -> bool {
        match &vault.next_key {
            None => true,
            Some(next) => {
                next.index > request.target
                    || (!request.exclude_self && next.account == request.account)
            }
        }
    }
}

impl Default for PredecessorLocator {
    fn default() -> Self {
        Self::new()
    }
}
