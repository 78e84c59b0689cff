//! Extraction of item identifiers from scanned label text.
//!
//! Labels encode either a bare item id (`ITM00042`), a compound
//! `TASK-ITEM` code, or only the numeric part of the id.

use once_cell::sync::Lazy;
use regex::Regex;

pub const UNRECOGNIZED_CODE: &str = "無法識別的條碼/二維碼";

const ITEM_PREFIX: &str = "ITM";

static ITEM_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)ITM([0-9]+)").expect("item id pattern compiles"));
static DIGIT_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[0-9]+").expect("digit pattern compiles"));

fn item_id_in(text: &str) -> Option<String> {
    ITEM_ID
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|digits| format!("{}{}", ITEM_PREFIX, digits.as_str()))
}

fn is_all_digits(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}

/// Normalizes scanned text into `ITM<digits>`, or `None` when nothing in it
/// looks like an item id.
pub fn parse_item_id(raw: &str) -> Option<String> {
    let text = raw.trim();
    if text.is_empty() {
        return None;
    }

    if text.contains('-') {
        let parts: Vec<&str> = text.split('-').map(str::trim).collect();

        if let Some(id) = parts.iter().find_map(|part| item_id_in(part)) {
            return Some(id);
        }

        if let Some(digits) = parts.last().and_then(|last| DIGIT_RUN.find(last)) {
            return Some(format!("{}{}", ITEM_PREFIX, digits.as_str()));
        }
    }

    if let Some(id) = item_id_in(text) {
        return Some(id);
    }

    if is_all_digits(text) {
        return Some(format!("{}{}", ITEM_PREFIX, text));
    }

    None
}
