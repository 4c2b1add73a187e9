use mockall::mock;
use mcsim_core::soc::traits::{
    AddressTranslator, FetchedInst, InstructionSupply, MemEvent, MemRequest, MemorySystem,
    TlbOutcome, TranslationRequest,
};

mock! {
    pub Memory {}
    impl MemorySystem for Memory {
        fn submit(&mut self, cpu: usize, req: MemRequest, now: u64);
        fn poll(&mut self, cpu: usize, now: u64) -> Vec<MemEvent>;
        fn line_size(&self) -> u64;
        fn busy(&self, cpu: usize) -> bool;
    }
}

mock! {
    pub Translator {}
    impl AddressTranslator for Translator {
        fn lookup(&mut self, req: &TranslationRequest) -> TlbOutcome;
    }
}

mock! {
    pub Supply {}
    impl InstructionSupply for Supply {
        fn fetch(&mut self, pc: u64, privileged: bool) -> FetchedInst;
    }
}
