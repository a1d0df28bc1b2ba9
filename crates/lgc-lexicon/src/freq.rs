//! Transitive frequency computation over the part→whole graph.
//!
//! The frequency of a form is its direct occurrence count plus the
//! frequency contributed by every larger form that contains it as a
//! constituent. The graph is expected to be a DAG; a cycle is a
//! data-entry error and is reported, never auto-broken.
//!
//! The traversal is iterative: an explicit frame stack carries the
//! partial sums, a memo map gives each node one computation regardless of
//! graph shape, and a visiting set detects revisits of in-progress nodes
//! at no extra asymptotic cost. Keeping all of this as data rather than
//! call-stack state also avoids recursion limits on deep compound chains.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::backlinks::LexiconBacklinks;
use crate::error::{LexiconError, LexiconResult};
use crate::index::TokenIndex;
use crate::lexicon::Lexicon;
use crate::loc::Loc;

struct Frame {
    form: String,
    /// Direct count plus the frequencies of wholes summed so far.
    total: u64,
    wholes: Vec<String>,
    next: usize,
}

fn make_frame(
    form: &str,
    backlinks: &LexiconBacklinks,
    index: &TokenIndex,
) -> LexiconResult<Frame> {
    Ok(Frame {
        form: form.to_string(),
        total: index.occurrence_count(form)? as u64,
        wholes: backlinks.wholes(form).to_vec(),
        next: 0,
    })
}

/// Compute the frequency of `start`, filling `memo` for it and every
/// form reached along the way.
fn compute_into(
    memo: &mut HashMap<String, u64>,
    backlinks: &LexiconBacklinks,
    index: &TokenIndex,
    start: &str,
) -> LexiconResult<()> {
    if memo.contains_key(start) {
        return Ok(());
    }

    let mut visiting: Vec<String> = vec![start.to_string()];
    let mut on_stack: HashSet<String> = visiting.iter().cloned().collect();
    let mut stack: Vec<Frame> = vec![make_frame(start, backlinks, index)?];

    while let Some(top) = stack.last_mut() {
        if top.next < top.wholes.len() {
            let whole = top.wholes[top.next].clone();
            top.next += 1;
            if let Some(&known) = memo.get(&whole) {
                top.total += known;
                continue;
            }
            if on_stack.contains(&whole) {
                visiting.push(whole);
                return Err(LexiconError::CycleDetected { chain: visiting });
            }
            on_stack.insert(whole.clone());
            visiting.push(whole.clone());
            let frame = make_frame(&whole, backlinks, index)?;
            stack.push(frame);
        } else {
            let done = stack.pop().expect("frame stack is non-empty");
            memo.insert(done.form.clone(), done.total);
            on_stack.remove(&done.form);
            visiting.pop();
            if let Some(parent) = stack.last_mut() {
                parent.total += done.total;
            }
        }
    }

    Ok(())
}

/// Transitive frequency of one form. The form must have a lexicon entry.
pub(crate) fn frequency_of(lexicon: &Lexicon, form: &str) -> LexiconResult<u64> {
    if !lexicon.contains(form)? {
        return Err(LexiconError::FormNotFound(form.to_string()));
    }
    let backlinks = lexicon.backlinks()?;
    let index = lexicon.token_index()?;
    let mut memo = HashMap::new();
    compute_into(&mut memo, &backlinks, &index, form)?;
    Ok(memo[form])
}

/// Transitive frequency of every form, sharing one memo across the
/// whole table.
pub(crate) fn all_frequencies(lexicon: &Lexicon) -> LexiconResult<BTreeMap<String, u64>> {
    let backlinks = lexicon.backlinks()?;
    let index = lexicon.token_index()?;
    let mut memo = HashMap::new();
    let mut out = BTreeMap::new();
    for form in lexicon.forms()? {
        compute_into(&mut memo, &backlinks, &index, &form)?;
        out.insert(form.clone(), memo[&form]);
    }
    Ok(out)
}

/// Every location where `form` occurs, directly or inside any larger
/// form that transitively contains it. Each containing form contributes
/// its locations once, so shared ancestors in a diamond do not double up.
pub(crate) fn all_locations_of(lexicon: &Lexicon, form: &str) -> LexiconResult<Vec<Loc>> {
    if !lexicon.contains(form)? {
        return Err(LexiconError::FormNotFound(form.to_string()));
    }
    let backlinks = lexicon.backlinks()?;
    let index = lexicon.token_index()?;

    let mut seen: HashSet<String> = HashSet::new();
    seen.insert(form.to_string());
    let mut stack = vec![form.to_string()];
    let mut out = Vec::new();
    while let Some(current) = stack.pop() {
        out.extend(index.locations(&current)?);
        for whole in backlinks.wholes(&current) {
            if seen.insert(whole.clone()) {
                stack.push(whole.clone());
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lgc_store::{ItemDisk, MemDisk, VirtualDisk};
    use std::sync::Arc;

    fn make_lexicon() -> (Arc<ItemDisk>, Lexicon) {
        let disk = ItemDisk::open(Arc::new(MemDisk::new()) as Arc<dyn VirtualDisk>);
        let lexicon = Lexicon::open(&disk, "eng").unwrap();
        (disk, lexicon)
    }

    fn record_occurrences(lexicon: &Lexicon, form: &str, count: usize) {
        let index = lexicon.token_index().unwrap();
        for i in 0..count {
            index.add_location(form, &Loc::word("t01", i + 1, 0)).unwrap();
        }
    }

    /// dog occurs twice; dogs (= dog + s) occurs once; s never occurs
    /// directly.
    fn build_dog_lexicon(lexicon: &Lexicon) {
        for form in ["dog", "dogs", "s"] {
            lexicon.intern(form).unwrap();
        }
        lexicon.set_parts("dogs", &["dog", "s"]).unwrap();
        record_occurrences(lexicon, "dog", 2);
        record_occurrences(lexicon, "dogs", 1);
    }

    // -----------------------------------------------------------------------
    // Transitivity
    // -----------------------------------------------------------------------

    #[test]
    fn frequency_includes_containing_wholes() {
        let (_disk, lex) = make_lexicon();
        build_dog_lexicon(&lex);

        assert_eq!(lex.frequency("dogs").unwrap(), 1);
        assert_eq!(lex.frequency("dog").unwrap(), 3);
        assert_eq!(lex.frequency("s").unwrap(), 1);
    }

    #[test]
    fn frequencies_cover_the_whole_table() {
        let (_disk, lex) = make_lexicon();
        build_dog_lexicon(&lex);

        let freqs = lex.frequencies().unwrap();
        assert_eq!(freqs["dog"], 3);
        assert_eq!(freqs["dogs"], 1);
        assert_eq!(freqs["s"], 1);
    }

    #[test]
    fn chained_compounds_sum_transitively() {
        let (_disk, lex) = make_lexicon();
        for form in ["dog", "dogs", "dogsbody", "s", "body"] {
            lex.intern(form).unwrap();
        }
        lex.set_parts("dogs", &["dog", "s"]).unwrap();
        lex.set_parts("dogsbody", &["dogs", "body"]).unwrap();
        record_occurrences(&lex, "dog", 2);
        record_occurrences(&lex, "dogs", 1);
        record_occurrences(&lex, "dogsbody", 4);

        // dogs = 1 + 4; dog = 2 + dogs = 7; body = 0 + 4.
        assert_eq!(lex.frequency("dogs").unwrap(), 5);
        assert_eq!(lex.frequency("dog").unwrap(), 7);
        assert_eq!(lex.frequency("body").unwrap(), 4);
    }

    #[test]
    fn diamond_wholes_count_once_each() {
        let (_disk, lex) = make_lexicon();
        // a is part of b and c; both b and c are parts of d.
        for form in ["a", "b", "c", "d"] {
            lex.intern(form).unwrap();
        }
        lex.set_parts("b", &["a"]).unwrap();
        lex.set_parts("c", &["a"]).unwrap();
        lex.set_parts("d", &["b", "c"]).unwrap();
        record_occurrences(&lex, "d", 1);

        // b = c = 1; a = 0 + b + c = 2: d's count reaches a once per
        // distinct path, because the sum runs over wholes, not ancestors.
        assert_eq!(lex.frequency("a").unwrap(), 2);
    }

    #[test]
    fn frequency_of_missing_form_fails() {
        let (_disk, lex) = make_lexicon();
        assert!(matches!(
            lex.frequency("ghost"),
            Err(LexiconError::FormNotFound(_))
        ));
    }

    // -----------------------------------------------------------------------
    // Cycle rejection
    // -----------------------------------------------------------------------

    #[test]
    fn mutual_containment_is_rejected() {
        let (_disk, lex) = make_lexicon();
        lex.intern("a").unwrap();
        lex.intern("b").unwrap();
        lex.set_parts("a", &["b"]).unwrap();
        lex.set_parts("b", &["a"]).unwrap();

        for start in ["a", "b"] {
            match lex.frequency(start) {
                Err(LexiconError::CycleDetected { chain }) => {
                    assert_eq!(chain.first().unwrap(), start);
                    assert_eq!(chain.last().unwrap(), start);
                    assert_eq!(chain.len(), 3);
                }
                other => panic!("expected cycle error, got {other:?}"),
            }
        }
    }

    #[test]
    fn self_containment_is_rejected() {
        let (_disk, lex) = make_lexicon();
        lex.intern("a").unwrap();
        lex.set_parts("a", &["a"]).unwrap();
        assert!(matches!(
            lex.frequency("a"),
            Err(LexiconError::CycleDetected { .. })
        ));
    }

    #[test]
    fn cycle_error_names_the_offending_chain() {
        let (_disk, lex) = make_lexicon();
        for form in ["a", "b", "c"] {
            lex.intern(form).unwrap();
        }
        lex.set_parts("b", &["a"]).unwrap();
        lex.set_parts("c", &["b"]).unwrap();
        lex.set_parts("a", &["c"]).unwrap();

        match lex.frequency("a") {
            Err(LexiconError::CycleDetected { chain }) => {
                assert_eq!(chain, vec!["a", "b", "c", "a"]);
            }
            other => panic!("expected cycle error, got {other:?}"),
        }
    }

    // -----------------------------------------------------------------------
    // all_locations
    // -----------------------------------------------------------------------

    #[test]
    fn all_locations_include_containing_wholes() {
        let (_disk, lex) = make_lexicon();
        build_dog_lexicon(&lex);

        let mut locs = lex.all_locations("dog").unwrap();
        locs.sort();
        // Two direct dog occurrences plus the one dogs occurrence.
        assert_eq!(locs.len(), 3);
        let mut expected = vec![
            Loc::word("t01", 1, 0),
            Loc::word("t01", 2, 0),
            Loc::word("t01", 1, 0),
        ];
        expected.sort();
        assert_eq!(locs, expected);
    }

    #[test]
    fn all_locations_tolerate_diamonds() {
        let (_disk, lex) = make_lexicon();
        for form in ["a", "b", "c", "d"] {
            lex.intern(form).unwrap();
        }
        lex.set_parts("b", &["a"]).unwrap();
        lex.set_parts("c", &["a"]).unwrap();
        lex.set_parts("d", &["b", "c"]).unwrap();
        record_occurrences(&lex, "d", 1);

        // d is reached through both b and c but contributes once.
        assert_eq!(lex.all_locations("a").unwrap().len(), 1);
    }
}
