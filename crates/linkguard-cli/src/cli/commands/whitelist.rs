//! `linkguard whitelist` – show the trusted-host whitelist.

use linkguard_core::whitelist::Whitelist;

pub fn run_whitelist(whitelist: &Whitelist) {
    if whitelist.is_empty() {
        println!("Whitelist is empty.");
        return;
    }
    println!("{:<24} {}", "TRUSTED HOST", "OFFICIAL URL");
    for (host, url) in whitelist.iter() {
        println!("{host:<24} {url}");
    }
}
