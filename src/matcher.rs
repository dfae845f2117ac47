//! Path matching against a parsed [`Filter`].
//!
//! The matcher never materializes a full path string; it threads a small
//! [`MatcherState`] — an explicit frontier of candidate nodes plus a
//! persistent set of `**` nodes — down through the walker's recursion one
//! key at a time. This keeps an any-deep match alive at every depth below
//! where it was declared without re-scanning ancestors on every step.

use crate::ast::{ExpressionKind, ExpressionNode, Filter, NodeId};

/// Result of matching one key against the current frontier.
#[derive(Debug, Clone, Copy)]
pub enum MatchOutcome<'a> {
    /// A non-negated node won; its `should_descend()`/`children()` tell the
    /// walker whether to recurse with a new frontier or copy the subtree
    /// as-is.
    Include(ExpressionNode<'a>),
    /// A negated node won: the property is dropped entirely.
    Exclude,
    /// No candidate — explicit or any-deep — matched this key at all.
    NeverMatch,
}

/// The frontier threaded between one key and the next.
#[derive(Debug, Clone)]
pub struct MatcherState {
    normal: Vec<NodeId>,
    deep: Vec<NodeId>,
}

impl MatcherState {
    /// The state at the document root: every statement's root node is a
    /// candidate, nothing is yet promoted to the persistent any-deep set.
    pub fn root(filter: &Filter) -> Self {
        Self {
            normal: filter.statements().map(|n| n.id()).collect(),
            deep: Vec::new(),
        }
    }

    /// True when no candidate remains and none ever will (empty filter, or
    /// a branch pruned by an earlier `NeverMatch`/`Exclude`).
    pub fn is_exhausted(&self) -> bool {
        self.normal.is_empty() && self.deep.is_empty()
    }

    /// Any-deep nodes are depth-invariant: once in the candidate pool at
    /// one level, they stay in the pool at every level below, independent
    /// of which key is being matched or who wins at it.
    fn deep_for_children(&self, arena: &ExpressionArenaRef<'_>) -> Vec<NodeId> {
        let mut next = self.deep.clone();
        for &id in &self.normal {
            if arena.kind_of(id) == ExpressionKind::AnyDeep && !next.contains(&id) {
                next.push(id);
            }
        }
        next
    }

    /// Matches `key` against the current frontier, returning the outcome
    /// and the [`MatcherState`] to use for `key`'s own children (if any).
    pub fn step<'a>(&self, key: &str, filter: &'a Filter) -> (MatchOutcome<'a>, MatcherState) {
        let arena = ExpressionArenaRef::new(filter);
        let deep_next = self.deep_for_children(&arena);

        let mut best: Option<(usize, NodeId)> = None;
        for &id in self.normal.iter().chain(self.deep.iter()) {
            let node = arena.node(id);
            if match_leaf(&node, key) {
                let score = specificity(&node);
                let better = best.map_or(true, |(s, bid)| (score, id.0) > (s, bid.0));
                if better {
                    best = Some((score, id));
                }
            }
        }

        match best {
            None => (MatchOutcome::NeverMatch, MatcherState { normal: Vec::new(), deep: deep_next }),
            Some((_, id)) => {
                let node = arena.node(id);
                if node.negated() {
                    (MatchOutcome::Exclude, MatcherState { normal: Vec::new(), deep: deep_next })
                } else {
                    let normal_next = if node.should_descend() {
                        node.children().map(|c| c.id()).collect()
                    } else {
                        Vec::new()
                    };
                    (MatchOutcome::Include(node), MatcherState { normal: normal_next, deep: deep_next })
                }
            }
        }
    }
}

/// Thin indirection so `MatcherState` doesn't need to hold a borrow of the
/// arena across calls; it borrows fresh from the `Filter` each `step`.
struct ExpressionArenaRef<'a> {
    filter: &'a Filter,
}

impl<'a> ExpressionArenaRef<'a> {
    fn new(filter: &'a Filter) -> Self {
        Self { filter }
    }

    fn node(&self, id: NodeId) -> ExpressionNode<'a> {
        ExpressionNode::new(&self.filter.arena, id)
    }

    fn kind_of(&self, id: NodeId) -> ExpressionKind {
        self.node(id).kind()
    }
}

/// Exact equality always wins regardless of name length. Glob and regex
/// share one class scored by `length(raw_name) + 2`, so a longer, more
/// selective pattern outranks a shorter one instead of tying on kind alone.
fn specificity(node: &ExpressionNode<'_>) -> usize {
    match node.kind() {
        ExpressionKind::Exact => usize::MAX,
        ExpressionKind::Glob | ExpressionKind::Regex => node.raw_name().len() + 2,
        ExpressionKind::AnyShallow => 1,
        ExpressionKind::AnyDeep => 0,
    }
}

fn match_leaf(node: &ExpressionNode<'_>, key: &str) -> bool {
    match node.kind() {
        ExpressionKind::Exact => node.name() == key,
        ExpressionKind::AnyShallow | ExpressionKind::AnyDeep => true,
        ExpressionKind::Glob | ExpressionKind::Regex => node.regex().is_some_and(|r| r.is_match(key)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::FilterParser;

    fn parse(text: &str) -> Filter {
        FilterParser::new().parse(text).expect("parses")
    }

    fn walk<'a>(filter: &'a Filter, state: &MatcherState, path: &[&str]) -> MatchOutcome<'a> {
        let mut state = MatcherState { normal: state.normal.clone(), deep: state.deep.clone() };
        let mut outcome = MatchOutcome::NeverMatch;
        for key in path {
            let (o, next) = state.step(key, filter);
            outcome = o;
            state = next;
        }
        outcome
    }

    #[test]
    fn exact_field_is_included() {
        let f = parse("id,title");
        let root = MatcherState::root(&f);
        let outcome = walk(&f, &root, &["id"]);
        assert!(matches!(outcome, MatchOutcome::Include(n) if n.name() == "id"));
    }

    #[test]
    fn unlisted_field_is_never_matched() {
        let f = parse("id,title");
        let root = MatcherState::root(&f);
        let outcome = walk(&f, &root, &["description"]);
        assert!(matches!(outcome, MatchOutcome::NeverMatch));
    }

    #[test]
    fn negated_field_is_excluded() {
        let f = parse("*,-secret");
        let root = MatcherState::root(&f);
        assert!(matches!(walk(&f, &root, &["secret"]), MatchOutcome::Exclude));
        assert!(matches!(walk(&f, &root, &["other"]), MatchOutcome::Include(_)));
    }

    #[test]
    fn exact_beats_any_deep_but_any_deep_persists_beneath() {
        // "**,reporter[-firstName]": reporter itself is more specific than
        // **, but ** still reaches lastName inside reporter once we descend.
        let f = parse("**,reporter[-firstName]");
        let root = MatcherState::root(&f);

        let (reporter_outcome, reporter_state) = root.step("reporter", &f);
        assert!(matches!(reporter_outcome, MatchOutcome::Include(n) if n.name() == "reporter"));

        let (first_name_outcome, _) = reporter_state.step("firstName", &f);
        assert!(matches!(first_name_outcome, MatchOutcome::Exclude));

        let (last_name_outcome, _) = reporter_state.step("lastName", &f);
        assert!(matches!(last_name_outcome, MatchOutcome::Include(n) if n.kind() == ExpressionKind::AnyDeep));
    }

    #[test]
    fn later_declaration_wins_equal_specificity_tie() {
        let f = parse("status,-status");
        let root = MatcherState::root(&f);
        assert!(matches!(walk(&f, &root, &["status"]), MatchOutcome::Exclude));
    }

    #[test]
    fn empty_filter_never_matches_anything() {
        let f = parse("");
        let root = MatcherState::root(&f);
        assert!(root.is_exhausted());
        assert!(matches!(walk(&f, &root, &["anything"]), MatchOutcome::NeverMatch));
    }

    #[test]
    fn bare_include_without_nested_signals_passthrough() {
        let f = parse("reporter");
        let root = MatcherState::root(&f);
        let (outcome, next) = root.step("reporter", &f);
        let MatchOutcome::Include(node) = outcome else { panic!("expected include") };
        assert!(!node.should_descend());
        assert!(next.is_exhausted());
    }

    #[test]
    fn dot_sugar_descends_like_brace_nesting() {
        let f = parse("a.b");
        let root = MatcherState::root(&f);
        let (outcome, next) = root.step("a", &f);
        let MatchOutcome::Include(node) = outcome else { panic!("expected include") };
        assert!(!node.squiggly());
        assert!(node.should_descend());
        assert!(!next.is_exhausted());
        assert!(matches!(next.step("b", &f).0, MatchOutcome::Include(_)));
    }

    #[test]
    fn longer_glob_outranks_shorter_glob() {
        let f = parse("firstName*,*Name");
        let root = MatcherState::root(&f);
        let outcome = walk(&f, &root, &["firstName"]);
        assert!(matches!(outcome, MatchOutcome::Include(n) if n.raw_name() == "firstName"));

        let f = parse("*Name,firstName*");
        let root = MatcherState::root(&f);
        let outcome = walk(&f, &root, &["firstName"]);
        assert!(matches!(outcome, MatchOutcome::Include(n) if n.raw_name() == "firstName"));
    }

    #[test]
    fn exact_outranks_glob_regardless_of_glob_length() {
        let f = parse("firstNam*,firstName");
        let root = MatcherState::root(&f);
        let outcome = walk(&f, &root, &["firstName"]);
        assert!(matches!(outcome, MatchOutcome::Include(n) if n.kind() == ExpressionKind::Exact));
    }
}
