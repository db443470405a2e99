//! Symbol resolver: maps a raw alert token onto a catalog underlying symbol.
//!
//! Lookup order:
//! 1. exact, case-sensitive membership → returned unchanged
//! 2. best approximate match with similarity ≥ cutoff
//! 3. otherwise unresolved; the calling parser decides whether that is fatal

pub mod similarity;

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Minimum similarity an approximate candidate needs.
pub const DEFAULT_CUTOFF: f64 = 0.6;

/// How a token was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    Approximate { score: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedSymbol {
    pub symbol: String,
    pub kind: MatchKind,
}

impl ResolvedSymbol {
    pub fn is_exact(&self) -> bool {
        matches!(self.kind, MatchKind::Exact)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SymbolResolver {
    cutoff: f64,
}

impl Default for SymbolResolver {
    fn default() -> Self {
        Self {
            cutoff: DEFAULT_CUTOFF,
        }
    }
}

impl SymbolResolver {
    /// `cutoff` is clamped into `[0.0, 1.0]`.
    pub fn new(cutoff: f64) -> Self {
        Self {
            cutoff: cutoff.clamp(0.0, 1.0),
        }
    }

    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    /// Resolve `token` against `known`. `None` means unresolved.
    pub fn resolve<'k, I>(&self, token: &str, known: I) -> Option<ResolvedSymbol>
    where
        I: IntoIterator<Item = &'k String>,
        I::IntoIter: Clone,
    {
        let known = known.into_iter();
        if known.clone().any(|s| s == token) {
            return Some(ResolvedSymbol {
                symbol: token.to_string(),
                kind: MatchKind::Exact,
            });
        }

        known
            .map(|candidate| (similarity::ratio(candidate, token), candidate))
            .filter(|(score, _)| *score >= self.cutoff)
            .max_by(|(sa, ca), (sb, cb)| {
                sa.partial_cmp(sb)
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| ca.cmp(cb))
            })
            .map(|(score, candidate)| ResolvedSymbol {
                symbol: candidate.clone(),
                kind: MatchKind::Approximate { score },
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn known() -> BTreeSet<String> {
        ["NIFTY", "BANKNIFTY", "FINNIFTY", "MIDCPNIFTY", "SENSEX", "BANKEX", "RELIANCE"]
            .into_iter()
            .map(String::from)
            .collect()
    }

    #[test]
    fn exact_match_is_returned_unchanged() {
        let r = SymbolResolver::default().resolve("BANKNIFTY", &known()).unwrap();
        assert_eq!(r.symbol, "BANKNIFTY");
        assert!(r.is_exact());
    }

    #[test]
    fn exact_match_is_case_sensitive() {
        let r = SymbolResolver::default().resolve("nifty", &known());
        // lower-case shares no characters with the catalog symbols
        assert!(r.is_none());
    }

    #[test]
    fn typo_resolves_to_closest() {
        let r = SymbolResolver::default().resolve("BANKNIFY", &known()).unwrap();
        assert_eq!(r.symbol, "BANKNIFTY");
        assert!(matches!(r.kind, MatchKind::Approximate { score } if score > 0.9));
    }

    #[test]
    fn candidate_is_scored_as_first_sequence() {
        // NIFTY scores 0.6 against FNBIT; FINNIFTY only clears the cutoff
        // when the token is taken as the first sequence
        let r = SymbolResolver::default().resolve("FNBIT", &known()).unwrap();
        assert_eq!(r.symbol, "NIFTY");
        assert!(SymbolResolver::default().resolve("ESX", &known()).is_none());
    }

    #[test]
    fn unrelated_token_is_unresolved() {
        assert!(SymbolResolver::default().resolve("ZOMATO", &known()).is_none());
    }

    #[test]
    fn empty_catalog_is_unresolved() {
        let empty = BTreeSet::new();
        assert!(SymbolResolver::default().resolve("NIFTY", &empty).is_none());
    }

    #[test]
    fn ties_prefer_larger_symbol() {
        let known: BTreeSet<String> = ["AB", "AC"].into_iter().map(String::from).collect();
        let r = SymbolResolver::default().resolve("A", &known);
        // both score 2/3; the lexicographically larger candidate wins
        assert_eq!(r.unwrap().symbol, "AC");
    }

    #[test]
    fn cutoff_is_clamped() {
        assert_eq!(SymbolResolver::new(3.0).cutoff(), 1.0);
        assert_eq!(SymbolResolver::new(-1.0).cutoff(), 0.0);
    }
}
