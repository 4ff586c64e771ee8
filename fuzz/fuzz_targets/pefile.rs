#![no_main]

use libfuzzer_sys::fuzz_target;
use pescope::{PeFile, ResourceLimits};

fuzz_target!(|data: &[u8]| {
    if let Ok(pe) = PeFile::from_mem(data.to_vec()) {
        let _ = pe.architecture();
        let _ = pe.resources(&[]);
        let _ = pe.best_icon_with(&ResourceLimits::strict());
    }
});
