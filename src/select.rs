use crate::canon::{BibleStructure, Book};
use crate::clock::TimeSlot;

// ------------- Candidate -------------
/// A book that can carry the requested chapter/verse. `exact` records
/// whether the validated verse equals the one asked for; the validator never
/// adjusts a verse downward, so today every candidate is exact, but the
/// ordering contract (exact matches first) is kept in case an adjustment
/// policy is ever introduced.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Candidate {
    pub book: Book,
    pub verse: u32,
    pub exact: bool,
}

/// Enumerate every book that validly contains the chapter/verse pair, exact
/// matches before non-exact ones, canonical book order within each group.
pub fn candidates(structure: &BibleStructure, chapter: u32, verse: u32) -> Vec<Candidate> {
    let mut exact = Vec::new();
    let mut adjusted = Vec::new();
    for book in Book::all() {
        if !structure.has_chapter(book, chapter) {
            continue;
        }
        if let Some(found) = structure.validate(book, chapter, verse) {
            let candidate = Candidate {
                book,
                verse: found,
                exact: found == verse,
            };
            if candidate.exact {
                exact.push(candidate);
            } else {
                adjusted.push(candidate);
            }
        }
    }
    exact.extend(adjusted);
    exact
}

/// Pick one candidate: prefer the exact-match sublist when it is non-empty,
/// then rotate through it by (hour + minute + day of year) mod count.
pub fn choose(slot: TimeSlot, candidates: &[Candidate]) -> Option<Candidate> {
    if candidates.is_empty() {
        return None;
    }
    let exact_count = candidates.iter().take_while(|c| c.exact).count();
    let pool = if exact_count > 0 {
        &candidates[..exact_count]
    } else {
        candidates
    };
    Some(pool[slot.rotation(pool.len())])
}
