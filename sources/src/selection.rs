//! Source selection policy.

use dailyread_types::{ContentSource, PollingAlgorithm};
use rand::Rng;

/// Enabled sources, ascending `order_index` (ties by id).
pub fn enabled_in_order(sources: &[ContentSource]) -> Vec<ContentSource> {
    let mut enabled: Vec<ContentSource> = sources.iter().filter(|s| s.enabled).cloned().collect();
    dailyread_store::sort_sources(&mut enabled);
    enabled
}

/// The source to try first.
///
/// `Sequential` always starts from the first enabled source; the caller's
/// fallback loop advances past failures. `Random` draws uniformly.
pub fn select_next<R: Rng + ?Sized>(
    sources: &[ContentSource],
    algorithm: PollingAlgorithm,
    rng: &mut R,
) -> Option<ContentSource> {
    let enabled = enabled_in_order(sources);
    if enabled.is_empty() {
        return None;
    }
    let index = match algorithm {
        PollingAlgorithm::Sequential => 0,
        PollingAlgorithm::Random => rng.gen_range(0..enabled.len()),
    };
    enabled.into_iter().nth(index)
}

/// Every enabled source exactly once: the selected one, then the others
/// in order.
pub fn fallback_order<R: Rng + ?Sized>(
    sources: &[ContentSource],
    algorithm: PollingAlgorithm,
    rng: &mut R,
) -> Vec<ContentSource> {
    let Some(first) = select_next(sources, algorithm, rng) else {
        return Vec::new();
    };
    let mut order = Vec::with_capacity(sources.len());
    order.extend(
        enabled_in_order(sources)
            .into_iter()
            .filter(|s| s.id != first.id),
    );
    order.insert(0, first);
    order
}

/// Algorithm for one fetch: the override on the highest-priority enabled
/// source, else the global setting, else `default`.
pub fn effective_algorithm(
    sources: &[ContentSource],
    setting: Option<PollingAlgorithm>,
    default: PollingAlgorithm,
) -> PollingAlgorithm {
    enabled_in_order(sources)
        .first()
        .and_then(|s| s.polling_algorithm)
        .or(setting)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dailyread_types::{SourceId, Timestamp};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn source(id: SourceId, name: &str, enabled: bool, order_index: u32) -> ContentSource {
        ContentSource {
            id,
            name: name.into(),
            url: format!("https://{name}.example/api"),
            enabled,
            order_index,
            polling_algorithm: None,
            created_at: Timestamp::EPOCH,
        }
    }

    fn names(sources: &[ContentSource]) -> Vec<&str> {
        sources.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn sequential_skips_disabled_sources() {
        let sources = vec![
            source(1, "A", true, 0),
            source(2, "B", false, 1),
            source(3, "C", true, 2),
        ];
        let mut rng = StdRng::seed_from_u64(0);
        let order = fallback_order(&sources, PollingAlgorithm::Sequential, &mut rng);
        assert_eq!(names(&order), vec!["A", "C"]);
    }

    #[test]
    fn order_follows_order_index_not_insertion() {
        let sources = vec![source(1, "late", true, 9), source(2, "early", true, 1)];
        let first = select_next(&sources, PollingAlgorithm::Sequential, &mut StdRng::seed_from_u64(0));
        assert_eq!(first.unwrap().name, "early");
    }

    #[test]
    fn random_balances_two_sources() {
        let sources = vec![source(1, "A", true, 0), source(2, "B", true, 1)];
        let mut rng = StdRng::seed_from_u64(42);
        let mut a = 0;
        for _ in 0..1000 {
            if select_next(&sources, PollingAlgorithm::Random, &mut rng).unwrap().id == 1 {
                a += 1;
            }
        }
        assert!((400..=600).contains(&a), "A chosen {a} times out of 1000");
    }

    #[test]
    fn random_fallback_visits_every_enabled_source_once() {
        let sources = vec![
            source(1, "A", true, 0),
            source(2, "B", true, 1),
            source(3, "C", false, 2),
            source(4, "D", true, 3),
        ];
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..50 {
            let mut ids: Vec<_> = fallback_order(&sources, PollingAlgorithm::Random, &mut rng)
                .into_iter()
                .map(|s| s.id)
                .collect();
            ids.sort();
            assert_eq!(ids, vec![1, 2, 4]);
        }
    }

    #[test]
    fn nothing_enabled_selects_nothing() {
        let sources = vec![source(1, "A", false, 0)];
        let mut rng = StdRng::seed_from_u64(0);
        assert!(select_next(&sources, PollingAlgorithm::Random, &mut rng).is_none());
        assert!(fallback_order(&sources, PollingAlgorithm::Sequential, &mut rng).is_empty());
    }

    #[test]
    fn algorithm_precedence() {
        let mut first = source(1, "A", true, 0);
        let sources = vec![first.clone(), source(2, "B", true, 1)];
        assert_eq!(
            effective_algorithm(&sources, None, PollingAlgorithm::Sequential),
            PollingAlgorithm::Sequential
        );
        assert_eq!(
            effective_algorithm(&sources, Some(PollingAlgorithm::Random), PollingAlgorithm::Sequential),
            PollingAlgorithm::Random
        );

        first.polling_algorithm = Some(PollingAlgorithm::Sequential);
        let sources = vec![first, source(2, "B", true, 1)];
        assert_eq!(
            effective_algorithm(&sources, Some(PollingAlgorithm::Random), PollingAlgorithm::Random),
            PollingAlgorithm::Sequential
        );
    }

    #[test]
    fn disabled_source_override_is_ignored() {
        let mut disabled = source(1, "A", false, 0);
        disabled.polling_algorithm = Some(PollingAlgorithm::Random);
        let sources = vec![disabled, source(2, "B", true, 1)];
        assert_eq!(
            effective_algorithm(&sources, None, PollingAlgorithm::Sequential),
            PollingAlgorithm::Sequential
        );
    }
}
