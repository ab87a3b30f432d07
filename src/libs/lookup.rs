use std::env;
use std::fs::{create_dir_all, OpenOptions};
use std::io::{self, Write};

use alloy::primitives::{Address, B256};

/// Shortened `0xabcdef…123456` form for progress lines.
pub fn short_addr(addr: Address) -> String {
    let s = addr.as_slice();
    format!(
        "0x{}…{}",
        hex::encode(&s[0..3]),
        hex::encode(&s[17..20])
    )
}

pub fn short_hash(hash: B256) -> String {
    let s = hash.as_slice();
    format!("0x{}…{}", hex::encode(&s[0..4]), hex::encode(&s[28..32]))
}

pub fn save_log_to_file(log: &str) {
    // skip if not enabled
    if !is_debug_logs_enabled() {
        return;
    }

    if let Err(e) = create_dir_all("logs") {
        eprintln!("save_log_to_file mkdir error: {e}");
        return;
    }
    let now = chrono::Utc::now().format("%H-%d-%m-%Y").to_string();
    let file_name = format!("logs/celotx_{}.txt", now);
    let time_now = chrono::Utc::now().format("%H:%M:%S%.3f").to_string();
    let log_with_time = format!("[{}] {log}", time_now);

    if let Err(e) = append_line(&file_name, &log_with_time) {
        eprintln!("save_log_to_file error: {e}");
    }
}

fn is_debug_logs_enabled() -> bool {
    match env::var("DEBUG_LOGS") {
        Ok(val) => val.eq_ignore_ascii_case("true"),
        Err(_) => false,
    }
}

fn append_line(path: &str, line: &str) -> io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{line}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{address, b256};

    #[test]
    fn shortens_addresses_and_hashes() {
        let a = address!("cdd1151b2bC256103FA2565475e686346CeFd813");
        assert_eq!(short_addr(a), "0xcdd115…efd813");
        let h = b256!("00000000000000000000000000000000000000000000000000000000000000ff");
        assert_eq!(short_hash(h), "0x00000000…000000ff");
    }
}
