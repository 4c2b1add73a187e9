//! Page Translator Tests.

use mcsim_core::common::data::MemWidth;
use mcsim_core::common::tag::Tag;
use mcsim_core::soc::traits::{AddressTranslator, TlbOutcome, TranslationRequest};
use mcsim_core::soc::{PageEntry, PageTranslator};
use rstest::rstest;

fn req(vaddr: u64, is_write: bool, privileged: bool) -> TranslationRequest {
    TranslationRequest {
        vaddr,
        width: MemWidth::Double,
        is_write,
        privileged,
        tag: Tag(1),
        context: 0,
    }
}

#[rstest]
#[case::user_read(false, false, TlbOutcome::Hit(0x6010))]
#[case::user_write(true, false, TlbOutcome::Fault)]
#[case::privileged_read(false, true, TlbOutcome::Hit(0x6010))]
fn kernel_page_permissions(#[case] write: bool, #[case] privileged: bool, #[case] expected: TlbOutcome) {
    let mut tlb = PageTranslator::mapped(12);
    tlb.map(2, PageEntry { ppn: 6, writable: false, user: true });
    assert_eq!(tlb.lookup(&req(0x2010, write, privileged)), expected);
}

#[test]
fn supervisor_only_page_faults_in_user_mode() {
    let mut tlb = PageTranslator::mapped(12);
    tlb.map(0, PageEntry { ppn: 0, writable: true, user: false });
    assert_eq!(tlb.lookup(&req(0x10, false, false)), TlbOutcome::Fault);
    assert_eq!(tlb.lookup(&req(0x10, true, true)), TlbOutcome::Hit(0x10));
}

#[test]
fn unmapped_page_misses_until_mapped() {
    let mut tlb = PageTranslator::mapped(13);
    assert_eq!(tlb.lookup(&req(0x4000, false, false)), TlbOutcome::Miss);
    tlb.map(2, PageEntry { ppn: 2, writable: true, user: true });
    assert_eq!(tlb.lookup(&req(0x4000, false, false)), TlbOutcome::Hit(0x4000));
    assert!(tlb.unmap(2).is_some());
    assert_eq!(tlb.lookup(&req(0x4000, false, false)), TlbOutcome::Miss);
    assert_eq!(tlb.page_size(), 8192);
}
