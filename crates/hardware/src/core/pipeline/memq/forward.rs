//! Store-to-load forwarding and ambiguity scan.
//!
//! A load scans older writes youngest first. Unresolved addresses are
//! collected as the load's limbo set; the first resolved overlapping write
//! decides the outcome.

use crate::common::data::{MemWidth, overlaps};
use crate::common::tag::Tag;

use super::entry::{MemEntry, MemKind};

/// Result of scanning older writes for a load.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ForwardResult {
    /// An older store supplies the whole value.
    Hit {
        /// Extended value.
        value: u64,
        /// Supplying store.
        from: Tag,
        /// Unresolved stores younger than the supplier.
        limbo: Vec<Tag>,
    },
    /// No resolved overlapping write; read memory.
    Miss {
        /// Unresolved older stores.
        limbo: Vec<Tag>,
    },
    /// The supplying store's data is not ready, or disambiguation is not speculative.
    Wait,
    /// A write overlaps without forwarding; wait until it leaves the queue.
    Partial(Tag),
}

/// Value a store of `store_width` at `store_addr` supplies to a load, if the
/// pair is forwardable.
///
/// Same width at the same address forwards with the load's own extension. A
/// doubleword store also feeds a word load from either half.
pub fn forward_value(
    store_addr: u64,
    store_width: MemWidth,
    data: u64,
    load_addr: u64,
    load_width: MemWidth,
    signed: bool,
) -> Option<u64> {
    if store_addr == load_addr && store_width == load_width {
        return Some(load_width.extend(data & load_width.mask(), signed));
    }
    if store_width == MemWidth::Double && load_width == MemWidth::Word {
        let shift = match load_addr.checked_sub(store_addr)? {
            0 => 0,
            4 => 32,
            _ => return None,
        };
        return Some(MemWidth::Word.extend((data >> shift) & MemWidth::Word.mask(), signed));
    }
    None
}

/// Scans `older` (oldest first) on behalf of `load`.
pub fn scan<'a>(
    load: &MemEntry,
    older: impl DoubleEndedIterator<Item = &'a MemEntry>,
    speculative: bool,
) -> ForwardResult {
    let mut limbo = Vec::new();
    for w in older.rev().filter(|e| e.kind.writes()) {
        if !w.addr_ready {
            if !speculative {
                return ForwardResult::Wait;
            }
            limbo.push(w.tag);
            continue;
        }
        if !overlaps(w.paddr, w.width, load.paddr, load.width) {
            continue;
        }
        if matches!(w.kind, MemKind::Rmw(_)) {
            return ForwardResult::Partial(w.tag);
        }
        return match forward_value(w.paddr, w.width, w.data, load.paddr, load.width, load.signed) {
            Some(_) if !w.data_ready => ForwardResult::Wait,
            Some(value) => ForwardResult::Hit {
                value,
                from: w.tag,
                limbo,
            },
            None => ForwardResult::Partial(w.tag),
        };
    }
    ForwardResult::Miss { limbo }
}
