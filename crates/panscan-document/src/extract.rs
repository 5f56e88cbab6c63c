// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PAN extraction from recognized text.

use std::sync::LazyLock;

use panscan_core::PanNumber;
use regex::Regex;

use crate::scan::recognize::TextRegion;

/// Five uppercase letters, four digits, one uppercase letter. ASCII only.
static PAN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Z]{5}[0-9]{4}[A-Z]").expect("PAN pattern is valid"));

/// Finds PAN-shaped tokens in recognized text.
///
/// No word boundaries are required: recognizers routinely glue neighbouring
/// tokens together, so `XABCDE1234FY` still yields `ABCDE1234F`.
pub struct PanExtractor;

impl PanExtractor {
    /// Space-join the recognized strings in the order the recognizer gave them.
    pub fn join(regions: &[TextRegion]) -> String {
        regions
            .iter()
            .map(|r| r.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// The leftmost match in `text`, if any.
    pub fn first_match(text: &str) -> Option<PanNumber> {
        PAN_PATTERN
            .find(text)
            .and_then(|m| PanNumber::parse(m.as_str()).ok())
    }

    /// Every non-overlapping match, left to right.
    pub fn all_matches(text: &str) -> Vec<PanNumber> {
        PAN_PATTERN
            .find_iter(text)
            .filter_map(|m| PanNumber::parse(m.as_str()).ok())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_uses_single_spaces_in_order() {
        let regions = vec![
            TextRegion::text("INCOME TAX DEPARTMENT"),
            TextRegion::text("ABCDE1234F"),
            TextRegion::text("GOVT. OF INDIA"),
        ];
        assert_eq!(
            PanExtractor::join(&regions),
            "INCOME TAX DEPARTMENT ABCDE1234F GOVT. OF INDIA"
        );
        assert_eq!(PanExtractor::join(&[]), "");
    }

    #[test]
    fn finds_pan_in_card_text() {
        let text = "Permanent Account Number Card ABCPK1234Q Name RAVI KUMAR";
        assert_eq!(
            PanExtractor::first_match(text).unwrap().as_str(),
            "ABCPK1234Q"
        );
    }

    #[test]
    fn first_in_scan_order_wins() {
        let text = "ZZZZZ9999Z then AAAAA0000A";
        assert_eq!(PanExtractor::first_match(text).unwrap().as_str(), "ZZZZZ9999Z");
        let all: Vec<String> = PanExtractor::all_matches(text)
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(all, ["ZZZZZ9999Z", "AAAAA0000A"]);
    }

    #[test]
    fn matches_inside_longer_runs() {
        assert_eq!(
            PanExtractor::first_match("XABCDE1234FY").unwrap().as_str(),
            "ABCDE1234F"
        );
    }

    #[test]
    fn split_across_regions_is_not_a_match() {
        let regions = vec![TextRegion::text("ABCDE"), TextRegion::text("1234F")];
        assert!(PanExtractor::first_match(&PanExtractor::join(&regions)).is_none());
    }

    #[test]
    fn rejects_near_misses() {
        for text in ["abcde1234f", "ABCD1234F", "ABCDE123F", "ABCDE１２３４F", ""] {
            assert!(PanExtractor::first_match(text).is_none(), "{text:?}");
        }
    }
}
