//! Reference Data TLB.
//!
//! A page-granular translator. With no pages mapped it translates every
//! address to itself; once a page is mapped, unmapped pages miss. Each page
//! carries write and user permissions checked on every lookup.

use std::collections::HashMap;

use serde::Deserialize;

use crate::soc::traits::{AddressTranslator, TlbOutcome, TranslationRequest};

/// A mapped page.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct PageEntry {
    /// Physical page number.
    pub ppn: u64,
    /// Stores and atomics allowed.
    #[serde(default = "PageEntry::default_true")]
    pub writable: bool,
    /// Accessible in user mode.
    #[serde(default = "PageEntry::default_true")]
    pub user: bool,
}

impl PageEntry {
    const fn default_true() -> bool {
        true
    }
}

/// Page-map translator.
#[derive(Clone, Debug)]
pub struct PageTranslator {
    page_shift: u32,
    pages: HashMap<u64, PageEntry>,
    identity: bool,
}

impl PageTranslator {
    /// Creates an identity translator with pages of `1 << page_shift` bytes.
    pub fn identity(page_shift: u32) -> Self {
        Self {
            page_shift,
            pages: HashMap::new(),
            identity: true,
        }
    }

    /// Creates a translator in which only mapped pages translate.
    pub fn mapped(page_shift: u32) -> Self {
        Self {
            identity: false,
            ..Self::identity(page_shift)
        }
    }

    /// Maps virtual page `vpn`. Switches the translator out of identity mode.
    pub fn map(&mut self, vpn: u64, entry: PageEntry) {
        self.identity = false;
        let _ = self.pages.insert(vpn, entry);
    }

    /// Removes a mapping, returning it.
    pub fn unmap(&mut self, vpn: u64) -> Option<PageEntry> {
        self.pages.remove(&vpn)
    }

    /// Page size in bytes.
    pub const fn page_size(&self) -> u64 {
        1 << self.page_shift
    }
}

impl AddressTranslator for PageTranslator {
    fn lookup(&mut self, req: &TranslationRequest) -> TlbOutcome {
        if self.identity {
            return TlbOutcome::Hit(req.vaddr);
        }
        let vpn = req.vaddr >> self.page_shift;
        let offset = req.vaddr & (self.page_size() - 1);
        let Some(page) = self.pages.get(&vpn) else {
            return TlbOutcome::Miss;
        };
        if (req.is_write && !page.writable) || (!req.privileged && !page.user) {
            return TlbOutcome::Fault;
        }
        TlbOutcome::Hit((page.ppn << self.page_shift) | offset)
    }
}
