//! "Most popular" rating summary for a movie.
//!
//! Two nested modes followed by a mean:
//! 1. the rating name used by the most ratings,
//! 2. among ratings with that name, the upperbound used most often,
//! 3. the arithmetic mean of `userRating` over ratings matching both.
//!
//! Ties are resolved deterministically: the lexicographically smallest name
//! wins, then the numerically smallest upperbound.

use crate::domain::model::Rating;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub struct PopularRating {
    pub rating_name: String,
    pub upperbound: String,
    pub average: f64,
    /// Number of ratings the average was taken over.
    pub sample_size: usize,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PopularityError {
    #[error("rating {id} has a non-numeric {field}: {value:?}")]
    Unparsable {
        id: String,
        field: &'static str,
        value: String,
    },
}

/// Returns `Ok(None)` when `ratings` is empty.
pub fn most_popular(ratings: &[Rating]) -> Result<Option<PopularRating>, PopularityError> {
    let Some(rating_name) = mode(ratings.iter().map(|r| r.rating_name.clone())) else {
        return Ok(None);
    };

    let same_name: Vec<&Rating> = ratings
        .iter()
        .filter(|r| r.rating_name == rating_name)
        .collect();

    let mut parsed_bounds = Vec::with_capacity(same_name.len());
    for r in &same_name {
        parsed_bounds.push((parse_field(r, "upperbound", &r.upperbound)?, *r));
    }
    let Some(upperbound) = mode(parsed_bounds.iter().map(|(bound, _)| *bound)) else {
        return Ok(None);
    };

    // scales are uncapped, so two i64 scores can already overflow an i64 sum
    let mut sum = 0i128;
    let mut sample_size = 0usize;
    let mut upperbound_text = None;
    for (bound, r) in &parsed_bounds {
        if *bound != upperbound {
            continue;
        }
        sum += i128::from(parse_field(r, "userRating", &r.user_rating)?);
        sample_size += 1;
        upperbound_text.get_or_insert_with(|| r.upperbound.trim().to_string());
    }

    Ok(Some(PopularRating {
        rating_name,
        upperbound: upperbound_text.unwrap_or_else(|| upperbound.to_string()),
        average: sum as f64 / sample_size as f64,
        sample_size,
    }))
}

/// Most frequent key; the smallest key wins a tie because `BTreeMap`
/// iterates in ascending order and only a strictly larger count replaces
/// the current best.
fn mode<K: Ord>(keys: impl Iterator<Item = K>) -> Option<K> {
    let mut counts: BTreeMap<K, usize> = BTreeMap::new();
    for key in keys {
        *counts.entry(key).or_default() += 1;
    }

    let mut best: Option<(K, usize)> = None;
    for (k, count) in counts {
        let better = match &best {
            Some((_, best_count)) => count > *best_count,
            None => true,
        };
        if better {
            best = Some((k, count));
        }
    }
    best.map(|(k, _)| k)
}

fn parse_field(rating: &Rating, field: &'static str, value: &str) -> Result<i64, PopularityError> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| PopularityError::Unparsable {
            id: rating.id.clone(),
            field,
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn rating(name: &str, score: &str, bound: &str) -> Rating {
        Rating {
            id: format!("{}-{}-{}", name, score, bound),
            user_name: "u".to_string(),
            rating_name: name.to_string(),
            user_rating: score.to_string(),
            upperbound: bound.to_string(),
            movie_title: "Up".to_string(),
            movie_id: "m1".to_string(),
            date_time_created: Utc::now(),
            privacy: "public".to_string(),
        }
    }

    #[test]
    fn picks_most_used_name_and_averages_its_scores() {
        let ratings = vec![
            rating("A", "5", "10"),
            rating("A", "7", "10"),
            rating("A", "3", "10"),
            rating("B", "8", "10"),
        ];
        let popular = most_popular(&ratings).unwrap().unwrap();
        assert_eq!(popular.rating_name, "A");
        assert_eq!(popular.upperbound, "10");
        assert_eq!(popular.average, 5.0);
        assert_eq!(popular.sample_size, 3);
    }

    #[test]
    fn averages_only_the_winning_upperbound() {
        let ratings = vec![
            rating("A", "4", "5"),
            rating("A", "2", "5"),
            rating("A", "9", "10"),
        ];
        let popular = most_popular(&ratings).unwrap().unwrap();
        assert_eq!(popular.upperbound, "5");
        assert_eq!(popular.average, 3.0);
        assert_eq!(popular.sample_size, 2);
    }

    #[test]
    fn name_ties_go_to_the_smallest_name() {
        let ratings = vec![rating("Zany", "1", "3"), rating("Artsy", "2", "3")];
        let popular = most_popular(&ratings).unwrap().unwrap();
        assert_eq!(popular.rating_name, "Artsy");
    }

    #[test]
    fn upperbound_ties_compare_numerically() {
        // "10" sorts before "5" as text; numerically 5 is smaller.
        let ratings = vec![rating("A", "9", "10"), rating("A", "4", "5")];
        let popular = most_popular(&ratings).unwrap().unwrap();
        assert_eq!(popular.upperbound, "5");
        assert_eq!(popular.average, 4.0);
    }

    #[test]
    fn huge_scores_do_not_overflow_the_sum() {
        let max = i64::MAX.to_string();
        let mut first = rating("A", &max, &max);
        first.user_name = "alice".to_string();
        let mut second = rating("A", &max, &max);
        second.user_name = "bob".to_string();

        let popular = most_popular(&[first, second]).unwrap().unwrap();
        assert_eq!(popular.average, 9.223372036854776e18);
        assert_eq!(popular.sample_size, 2);
    }

    #[test]
    fn no_ratings_is_none() {
        assert_eq!(most_popular(&[]).unwrap(), None);
    }

    #[test]
    fn garbage_score_is_reported() {
        let ratings = vec![rating("A", "lots", "10")];
        let err = most_popular(&ratings).unwrap_err();
        assert!(matches!(err, PopularityError::Unparsable { field: "userRating", .. }));
    }
}
