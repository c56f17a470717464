//! Pairwise association rules over per-document item sets
//!
//! Two statistics are supported:
//! - lift: `freq2 * N / (freq1[a] * freq1[b])`, one unordered rule per pair
//! - interest: `freq2 / freq1[a] - freq1[b] / N`, one rule per direction
//!
//! Pair enumeration is quadratic in the size of a single transaction, which
//! stays small (tens of items per document).

use crate::model::{sorted_pair, Rule};
use litgraph_common::config::CooccurrenceStatistic;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::hash::Hash;

/// 1- and 2-itemset frequencies of a transaction list
#[derive(Debug, Clone)]
pub struct ItemsetCounts<I> {
    /// Transactions containing each item
    pub singles: HashMap<I, usize>,

    /// Transactions containing both items, keyed by the ordered pair
    pub pairs: BTreeMap<(I, I), usize>,

    /// Number of transactions
    pub transactions: usize,
}

impl<I> ItemsetCounts<I>
where
    I: Clone + Eq + Hash + Ord,
{
    /// Count items and unordered item pairs. Repeated items inside one
    /// transaction count once.
    pub fn count<T>(transactions: &[T]) -> Self
    where
        T: AsRef<[I]>,
    {
        let mut singles: HashMap<I, usize> = HashMap::new();
        let mut pairs: BTreeMap<(I, I), usize> = BTreeMap::new();

        for transaction in transactions {
            let items: BTreeSet<&I> = transaction.as_ref().iter().collect();

            for &item in &items {
                *singles.entry(item.clone()).or_insert(0) += 1;
            }

            if items.len() < 2 {
                continue;
            }

            let items: Vec<&I> = items.into_iter().collect();
            for (i, &first) in items.iter().enumerate() {
                for &second in &items[i + 1..] {
                    let key = sorted_pair(first.clone(), second.clone());
                    *pairs.entry(key).or_insert(0) += 1;
                }
            }
        }

        Self {
            singles,
            pairs,
            transactions: transactions.len(),
        }
    }

    fn single(&self, item: &I) -> f64 {
        self.singles.get(item).copied().unwrap_or(0) as f64
    }
}

/// Unordered rules whose lift is at least `min_lift`
pub fn rules_by_lift<I, T>(transactions: &[T], min_lift: f64) -> Vec<Rule<I>>
where
    I: Clone + Eq + Hash + Ord,
    T: AsRef<[I]>,
{
    let counts = ItemsetCounts::count(transactions);
    let n = counts.transactions as f64;

    let mut rules = Vec::new();
    for ((first, second), &together) in &counts.pairs {
        // every paired item was counted as a single too, so this is never 0
        let lift = together as f64 * n / (counts.single(first) * counts.single(second));

        if lift >= min_lift {
            rules.push(Rule {
                antecedent: first.clone(),
                consequent: second.clone(),
                score: lift,
            });
        }
    }

    rules
}

/// Directional rules whose interest is at least `min_interest`, most
/// frequent pairs first
pub fn rules_by_interest<I, T>(transactions: &[T], min_interest: f64) -> Vec<Rule<I>>
where
    I: Clone + Eq + Hash + Ord,
    T: AsRef<[I]>,
{
    let counts = ItemsetCounts::count(transactions);
    let n = counts.transactions as f64;

    let mut pairs: Vec<(&(I, I), &usize)> = counts.pairs.iter().collect();
    pairs.sort_by(|a, b| b.1.cmp(a.1));

    let mut rules = Vec::new();
    for ((first, second), &together) in pairs {
        let together = together as f64;
        let forward = together / counts.single(first) - counts.single(second) / n;
        let backward = together / counts.single(second) - counts.single(first) / n;

        if forward >= min_interest {
            rules.push(Rule {
                antecedent: first.clone(),
                consequent: second.clone(),
                score: forward,
            });
        }
        if backward >= min_interest {
            rules.push(Rule {
                antecedent: second.clone(),
                consequent: first.clone(),
                score: backward,
            });
        }
    }

    rules
}

/// Mine rules with the configured statistic
pub fn mine_rules<I, T>(
    transactions: &[T],
    statistic: CooccurrenceStatistic,
    min_score: f64,
) -> Vec<Rule<I>>
where
    I: Clone + Eq + Hash + Ord,
    T: AsRef<[I]>,
{
    match statistic {
        CooccurrenceStatistic::Lift => rules_by_lift(transactions, min_score),
        CooccurrenceStatistic::Interest => rules_by_interest(transactions, min_score),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> Vec<Vec<&'static str>> {
        vec![vec!["a", "b"], vec!["a", "b"], vec!["a"], vec!["b"], vec!["c"]]
    }

    #[test]
    fn test_counts() {
        let counts = ItemsetCounts::count(&fixture());
        assert_eq!(counts.singles["a"], 3);
        assert_eq!(counts.singles["b"], 3);
        assert_eq!(counts.singles["c"], 1);
        assert_eq!(counts.pairs[&("a", "b")], 2);
        assert_eq!(counts.transactions, 5);
    }

    #[test]
    fn test_lift_fixture() {
        let rules = rules_by_lift(&fixture(), 1.0);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].antecedent, "a");
        assert_eq!(rules[0].consequent, "b");
        assert!((rules[0].score - 10.0 / 9.0).abs() < 1e-12);

        assert!(rules_by_lift(&fixture(), 1.2).is_empty());
    }

    #[test]
    fn test_pair_key_ignores_order() {
        let transactions = vec![vec!["b", "a"], vec!["a", "b"]];
        let counts = ItemsetCounts::count(&transactions);
        assert_eq!(counts.pairs.len(), 1);
        assert_eq!(counts.pairs[&("a", "b")], 2);
    }

    #[test]
    fn test_repeated_items_count_once() {
        let transactions = vec![vec!["a", "a", "b"]];
        let counts = ItemsetCounts::count(&transactions);
        assert_eq!(counts.singles["a"], 1);
        assert_eq!(counts.pairs.len(), 1);
    }

    #[test]
    fn test_absent_item_never_in_rules() {
        let transactions = vec![vec!["x", "p"], vec!["x", "q"], vec!["x", "p", "q"]];
        for rule in rules_by_lift(&transactions, 0.0) {
            assert_ne!(rule.antecedent, "y");
            assert_ne!(rule.consequent, "y");
        }
    }

    #[test]
    fn test_empty_and_singleton_transactions() {
        let transactions: Vec<Vec<i32>> = vec![vec![], vec![1], vec![2]];
        assert!(rules_by_lift(&transactions, 0.0).is_empty());
        assert!(rules_by_interest(&transactions, -1.0).is_empty());

        let none: Vec<Vec<i32>> = vec![];
        assert!(rules_by_lift(&none, 0.0).is_empty());
    }

    #[test]
    fn test_interest_is_directional() {
        // freq1[1] = 2, freq1[2] = 4, freq2 = 2, N = 4
        let transactions = vec![vec![1, 2], vec![1, 2], vec![2], vec![2]];
        let rules = rules_by_interest(&transactions, -10.0);
        assert_eq!(rules.len(), 2);

        let forward = rules.iter().find(|r| r.antecedent == 1).unwrap();
        let backward = rules.iter().find(|r| r.antecedent == 2).unwrap();

        // 2/2 - 4/4 = 0.0 and 2/4 - 2/4 = 0.0
        assert!((forward.score - 0.0).abs() < 1e-12);
        assert!((backward.score - 0.0).abs() < 1e-12);

        let transactions = vec![vec![1, 2], vec![3], vec![3], vec![3]];
        let rules = rules_by_interest(&transactions, 0.5);
        // 1 -> 2: 1/1 - 1/4 = 0.75 and 2 -> 1 likewise
        assert_eq!(rules.len(), 2);
        assert!(rules.iter().all(|r| (r.score - 0.75).abs() < 1e-12));
    }

    #[test]
    fn test_interest_threshold_per_direction() {
        // freq1[1] = 1, freq1[2] = 3, freq2 = 1, N = 4
        let transactions = vec![vec![1, 2], vec![2], vec![2], vec![4]];
        let rules = rules_by_interest(&transactions, 0.2);
        // 1 -> 2: 1 - 0.75 = 0.25 passes; 2 -> 1: 1/3 - 0.25 ≈ 0.083 fails
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].antecedent, 1);
        assert_eq!(rules[0].consequent, 2);
    }

    #[test]
    fn test_mine_rules_dispatch() {
        let lift = mine_rules(&fixture(), CooccurrenceStatistic::Lift, 1.0);
        assert_eq!(lift.len(), 1);

        let interest = mine_rules(&fixture(), CooccurrenceStatistic::Interest, -1.0);
        assert_eq!(interest.len(), 2);
    }
}
