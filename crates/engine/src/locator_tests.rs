//! Behavioural tests for `PredecessorLocator` against in-memory vault lists.
//!
//! Lists are built in list order from `(account byte, index)` pairs. Results
//! are compared by the first byte of the returned account.

use alloy::primitives::{Address, U256};
use async_trait::async_trait;

use fxdao_common::types::{Denomination, Vault, VaultKey, VaultsInfo};

use crate::locator::{LocateRequest, PredecessorLocator};
use crate::memory::MemoryListReader;
use crate::reader::{ListReader, ReaderError, VaultsReader};

// ───────────────────────────── helpers ──────────────────────────────

/// Account that owns no vault in any fixture list.
const NEWCOMER: u8 = 0xEE;

const A: u8 = 0x0A;
const B: u8 = 0x0B;
const C: u8 = 0x0C;
const D: u8 = 0x0D;
const E: u8 = 0x0E;

fn account(byte: u8) -> Address {
    Address::repeat_byte(byte)
}

/// Vault whose totals reproduce `index` exactly.
fn vault(byte: u8, index: u64) -> Vault {
    Vault {
        account: account(byte),
        denomination: Denomination::Usd,
        index: U256::from(index),
        next_key: None,
        total_collateral: U256::from(index),
        total_debt: U256::from(1_000_000_000u64),
    }
}

fn list(entries: &[(u8, u64)]) -> MemoryListReader {
    MemoryListReader::new().with_vaults(
        Denomination::Usd,
        entries.iter().map(|(b, i)| vault(*b, *i)).collect(),
    )
}

/// `[100:A, 200:B, 300:C, 300:D, 500:E]`
fn sample() -> MemoryListReader {
    list(&[(A, 100), (B, 200), (C, 300), (D, 300), (E, 500)])
}

fn request(owner: u8, target: u64, exclude_self: bool) -> LocateRequest {
    LocateRequest {
        target: U256::from(target),
        account: account(owner),
        denomination: Denomination::Usd,
        exclude_self,
    }
}

async fn locate_with(
    reader: &MemoryListReader,
    page_size: u32,
    req: LocateRequest,
) -> Option<u8> {
    PredecessorLocator::with_page_size(page_size)
        .locate(reader, &req)
        .await
        .unwrap()
        .map(|key| key.account.as_slice()[0])
}

async fn locate(reader: &MemoryListReader, req: LocateRequest) -> Option<u8> {
    locate_with(reader, 15, req).await
}

// ═══════════════════════════════════════════════════════════════════
//  Head cases
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_empty_list_has_no_predecessor() {
    let reader = list(&[]);
    assert_eq!(locate(&reader, request(NEWCOMER, 100, true)).await, None);
    assert_eq!(reader.page_requests(), 0);
}

#[tokio::test]
async fn test_single_node() {
    let reader = list(&[(A, 100)]);
    assert_eq!(locate(&reader, request(NEWCOMER, 150, true)).await, Some(A));
    assert_eq!(locate(&reader, request(NEWCOMER, 50, true)).await, None);
    // The only vault moving never precedes itself.
    assert_eq!(locate(&reader, request(A, 150, true)).await, None);
    assert_eq!(locate(&reader, request(A, 100, false)).await, None);
}

#[tokio::test]
async fn test_below_head_skips_paging() {
    let reader = sample();
    assert_eq!(locate(&reader, request(NEWCOMER, 50, true)).await, None);
    assert_eq!(reader.head_requests(), 1);
    assert_eq!(reader.node_requests(), 0);
    assert_eq!(reader.page_requests(), 0);
}

#[tokio::test]
async fn test_equal_to_head_resolves_from_head_node() {
    let reader = sample();
    assert_eq!(locate(&reader, request(NEWCOMER, 100, true)).await, Some(A));
    assert_eq!(reader.node_requests(), 1);
    assert_eq!(reader.page_requests(), 0);
}

#[tokio::test]
async fn test_head_vault_keeps_head_position() {
    let reader = sample();
    assert_eq!(locate(&reader, request(A, 100, false)).await, None);
    assert_eq!(reader.node_requests(), 0);
    assert_eq!(reader.page_requests(), 0);
}

#[tokio::test]
async fn test_equal_to_head_with_duplicate_walks_cluster() {
    let reader = list(&[(A, 100), (B, 100), (C, 200)]);
    assert_eq!(locate(&reader, request(NEWCOMER, 100, true)).await, Some(B));
}

// ═══════════════════════════════════════════════════════════════════
//  Walk cases
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_target_between_nodes() {
    let reader = sample();
    let key = PredecessorLocator::new()
        .locate(&reader, &request(NEWCOMER, 250, true))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(key.account, account(B));
    assert_eq!(key.index, U256::from(200u64));
    assert_eq!(key.denomination, Denomination::Usd);
}

#[tokio::test]
async fn test_equal_indices_land_after_cluster() {
    let reader = sample();
    assert_eq!(locate(&reader, request(NEWCOMER, 300, true)).await, Some(D));
}

#[tokio::test]
async fn test_target_above_tail() {
    let reader = sample();
    assert_eq!(locate(&reader, request(NEWCOMER, 600, true)).await, Some(E));
}

#[tokio::test]
async fn test_moving_vault_skips_own_node() {
    let reader = sample();
    assert_eq!(locate(&reader, request(C, 450, true)).await, Some(D));
}

#[tokio::test]
async fn test_current_predecessor_stops_before_self() {
    let reader = sample();
    assert_eq!(locate(&reader, request(C, 300, false)).await, Some(B));
    assert_eq!(locate(&reader, request(D, 300, false)).await, Some(C));
    assert_eq!(locate(&reader, request(E, 500, false)).await, Some(D));
}

#[tokio::test]
async fn test_current_predecessor_directly_behind_head() {
    let reader = sample();
    assert_eq!(locate(&reader, request(B, 200, false)).await, Some(A));
}

#[tokio::test]
async fn test_result_never_self_and_never_above_target() {
    let reader = sample();
    for owner in [NEWCOMER, A, B, C, D, E] {
        for target in [0u64, 99, 100, 150, 200, 300, 301, 500, 900] {
            for exclude_self in [true, false] {
                let found = PredecessorLocator::new()
                    .locate(&reader, &request(owner, target, exclude_self))
                    .await
                    .unwrap();
                if let Some(key) = found {
                    assert_ne!(key.account, account(owner));
                    assert!(key.index <= U256::from(target));
                }
            }
        }
    }
}

#[tokio::test]
async fn test_denominations_are_separate_lists() {
    let reader = sample().with_vaults(Denomination::Eur, vec![vault(E, 1_000)]);

    let mut req = request(NEWCOMER, 600, true);
    req.denomination = Denomination::Eur;
    assert_eq!(locate(&reader, req).await, None);
    assert_eq!(locate(&reader, request(NEWCOMER, 600, true)).await, Some(E));
}

// ═══════════════════════════════════════════════════════════════════
//  Paging
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_page_size_does_not_change_result() {
    let targets = [0u64, 50, 99, 100, 101, 200, 250, 300, 301, 499, 500, 501, 1_000];

    for owner in [NEWCOMER, A, B, C, D, E] {
        for target in targets {
            for exclude_self in [true, false] {
                let expected = locate_with(&sample(), 15, request(owner, target, exclude_self)).await;
                for page_size in [1, 2, 3, 4] {
                    let got =
                        locate_with(&sample(), page_size, request(owner, target, exclude_self))
                            .await;
                    assert_eq!(
                        got, expected,
                        "owner {owner:#x} target {target} exclude {exclude_self} page {page_size}"
                    );
                }
            }
        }
    }
}

#[tokio::test]
async fn test_walk_stops_at_first_terminating_page() {
    let reader = sample();
    assert_eq!(locate_with(&reader, 2, request(NEWCOMER, 250, true)).await, Some(B));
    assert_eq!(reader.page_requests(), 1);

    let reader = sample();
    assert_eq!(locate_with(&reader, 2, request(NEWCOMER, 600, true)).await, Some(E));
    assert_eq!(reader.page_requests(), 3);
}

#[tokio::test]
async fn test_zero_page_size_is_clamped() {
    assert_eq!(PredecessorLocator::with_page_size(0).page_size(), 1);
    assert_eq!(locate_with(&sample(), 0, request(NEWCOMER, 250, true)).await, Some(B));
}

#[tokio::test]
async fn test_repeated_queries_agree() {
    let reader = sample();
    let first = locate_with(&reader, 2, request(C, 450, true)).await;
    let second = locate_with(&reader, 2, request(C, 450, true)).await;
    assert_eq!(first, second);
    assert_eq!(reader.head_requests(), 2);
}

// ═══════════════════════════════════════════════════════════════════
//  Contract-sized indices
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_opened_vaults_list() {
    let reader = list(&[
        (1, 17_564_285_714),
        (2, 18_571_428_571),
        (3, 20_000_000_000),
        (4, 32_500_000_000),
        (5, 32_500_000_000),
        (6, 50_000_000_000),
        (7, 60_000_000_000),
    ]);

    assert_eq!(locate(&reader, request(NEWCOMER, 19_000_000_000, true)).await, Some(2));
    assert_eq!(locate(&reader, request(NEWCOMER, 32_500_000_000, true)).await, Some(5));
    assert_eq!(locate(&reader, request(NEWCOMER, 17_000_000_000, true)).await, None);

    assert_eq!(locate(&reader, request(1, 17_564_285_714, false)).await, None);
    assert_eq!(locate(&reader, request(4, 32_500_000_000, false)).await, Some(3));
    assert_eq!(locate(&reader, request(5, 32_500_000_000, false)).await, Some(4));
    assert_eq!(locate(&reader, request(7, 60_000_000_000, false)).await, Some(6));

    assert_eq!(locate(&reader, request(3, 55_000_000_000, true)).await, Some(6));
    assert_eq!(locate(&reader, request(6, 18_000_000_000, true)).await, Some(1));
    assert_eq!(locate(&reader, request(1, 70_000_000_000, true)).await, Some(7));
    assert_eq!(locate(&reader, request(2, 10_000_000_000, true)).await, None);
}

#[tokio::test]
async fn test_paying_debt_moves_vault_up() {
    let reader = list(&[
        (1, 14_962_500_000),
        (2, 14_962_500_000),
        (3, 15_597_272_727),
        (4, 33_310_367_980),
    ]);

    assert_eq!(locate(&reader, request(1, 33_310_367_981, true)).await, Some(4));
    assert_eq!(locate(&reader, request(1, 33_310_367_970, true)).await, Some(3));
    assert_eq!(locate(&reader, request(3, 15_597_272_728, true)).await, Some(2));
    assert_eq!(locate(&reader, request(3, 14_962_500_000, true)).await, Some(2));
}

// ═══════════════════════════════════════════════════════════════════
//  Reader failures
// ═══════════════════════════════════════════════════════════════════

struct DownReader;

#[async_trait]
impl ListReader for DownReader {
    async fn get_head(&self, _denomination: Denomination) -> Result<VaultsInfo, ReaderError> {
        Err(ReaderError::Unavailable("connection refused".into()))
    }

    async fn get_node(
        &self,
        _account: Address,
        _denomination: Denomination,
    ) -> Result<Vault, ReaderError> {
        Err(ReaderError::Unavailable("connection refused".into()))
    }

    async fn get_page(
        &self,
        _after_key: Option<&VaultKey>,
        _denomination: Denomination,
        _page_size: u32,
    ) -> Result<Vec<Vault>, ReaderError> {
        Err(ReaderError::Unavailable("connection refused".into()))
    }
}

/// Returns the same full page whatever the anchor.
struct StuckReader;

impl StuckReader {
    fn page() -> Vec<Vault> {
        let mut a = vault(A, 100);
        let mut b = vault(B, 200);
        a.next_key = Some(b.key());
        b.next_key = Some(vault(C, 300).key());
        vec![a, b]
    }
}

#[async_trait]
impl ListReader for StuckReader {
    async fn get_head(&self, denomination: Denomination) -> Result<VaultsInfo, ReaderError> {
        let mut info = VaultsInfo::empty(denomination);
        info.lowest_key = Some(vault(A, 100).key());
        Ok(info)
    }

    async fn get_node(
        &self,
        _account: Address,
        _denomination: Denomination,
    ) -> Result<Vault, ReaderError> {
        Ok(Self::page()[0].clone())
    }

    async fn get_page(
        &self,
        _after_key: Option<&VaultKey>,
        _denomination: Denomination,
        _page_size: u32,
    ) -> Result<Vec<Vault>, ReaderError> {
        Ok(Self::page())
    }
}

#[tokio::test]
async fn test_head_failure_propagates() {
    let err = PredecessorLocator::new()
        .locate(&DownReader, &request(NEWCOMER, 100, true))
        .await
        .unwrap_err();
    assert!(matches!(err, ReaderError::Unavailable(_)));
}

#[tokio::test]
async fn test_page_failure_mid_walk_propagates() {
    let reader = sample().with_page_failure_after(1);
    let err = PredecessorLocator::with_page_size(2)
        .locate(&reader, &request(NEWCOMER, 600, true))
        .await
        .unwrap_err();
    assert!(matches!(err, ReaderError::Unavailable(_)));
}

#[tokio::test]
async fn test_stalled_page_ends_walk() {
    let found = PredecessorLocator::with_page_size(2)
        .locate(&StuckReader, &request(NEWCOMER, 1_000, true))
        .await
        .unwrap();
    assert_eq!(found.map(|k| k.account), Some(account(B)));
}

#[tokio::test]
async fn test_works_through_trait_object() {
    let reader: Box<dyn ListReader> = Box::new(sample());
    let found = PredecessorLocator::new()
        .locate(reader.as_ref(), &request(NEWCOMER, 250, true))
        .await
        .unwrap();
    assert_eq!(found.map(|k| k.account), Some(account(B)));
}

#[tokio::test]
async fn test_works_through_vaults_reader_object() {
    let reader: Box<dyn VaultsReader> = Box::new(sample());
    let found = PredecessorLocator::new()
        .locate(reader.as_ref(), &request(NEWCOMER, 600, true))
        .await
        .unwrap();
    assert_eq!(found.map(|k| k.account), Some(account(E)));
}
