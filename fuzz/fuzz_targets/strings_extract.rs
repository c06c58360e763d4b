#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let cfg = mzlayout::config::StringsConfig::default();
    let _ = mzlayout::extract_strings(data, &cfg);
});
