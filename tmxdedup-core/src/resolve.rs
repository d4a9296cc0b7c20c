//! Deterministic survivor selection for duplicate groups
//!
//! Orders a group's members with a multi-key comparator and keeps exactly
//! the first. The sort is stable, so fully tied members fall back to file
//! order rather than arbitrary reordering.

use std::cmp::Ordering;

use crate::config::PriorityConfig;
use crate::model::{ResolvedUnit, TranslationUnit, UnitStatus};

/// Tag every group member `Keep` or `Delete`
///
/// Returns members in their original file order with exactly one `Keep`
/// (the comparator's winner). An empty input yields an empty output.
pub fn resolve(members: Vec<TranslationUnit>, config: &PriorityConfig) -> Vec<ResolvedUnit> {
    let mut order: Vec<usize> = (0..members.len()).collect();
    // Vec::sort_by is a stable sort; equal members keep their file order
    order.sort_by(|&i, &j| compare_units(&members[i], &members[j], config));
    let winner = order.first().copied();

    members
        .into_iter()
        .enumerate()
        .map(|(i, unit)| ResolvedUnit {
            unit,
            status: if Some(i) == winner {
                UnitStatus::Keep
            } else {
                UnitStatus::Delete
            },
        })
        .collect()
}

/// Priority comparator between two candidates
///
/// Negative means `a` survives over `b`. Comparison blocks in order:
/// dates (when `date_first`), creation-id list, change-id list, dates
/// (when not `date_first`). Dates are ISO-8601 strings, so lexicographic
/// descending order is reverse-chronological.
pub fn compare_units(
    a: &TranslationUnit,
    b: &TranslationUnit,
    config: &PriorityConfig,
) -> Ordering {
    if config.date_first {
        let ord = compare_dates(a, b, config);
        if ord != Ordering::Equal {
            return ord;
        }
    }

    let ord = rank_in_list(
        &config.creation_ids,
        &a.attrs.creation_id,
        &b.attrs.creation_id,
    );
    if ord != Ordering::Equal {
        return ord;
    }

    let ord = rank_in_list(&config.change_ids, &a.attrs.change_id, &b.attrs.change_id);
    if ord != Ordering::Equal {
        return ord;
    }

    if !config.date_first {
        return compare_dates(a, b, config);
    }
    Ordering::Equal
}

/// A unit whose id is absent from the list sorts after any unit whose id is
/// present; among present ids, lower list index wins
fn rank_in_list(list: &[String], a_id: &str, b_id: &str) -> Ordering {
    let a_pos = list.iter().position(|id| id == a_id);
    let b_pos = list.iter().position(|id| id == b_id);
    match (a_pos, b_pos) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare_dates(a: &TranslationUnit, b: &TranslationUnit, config: &PriorityConfig) -> Ordering {
    if config.prefer_latest_change_date {
        let ord = b.attrs.change_date.cmp(&a.attrs.change_date);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    if config.prefer_latest_creation_date {
        let ord = b.attrs.creation_date.cmp(&a.attrs.creation_date);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{UnitAttrs, Variant};

    fn unit(attrs: UnitAttrs) -> TranslationUnit {
        TranslationUnit::new(
            vec![
                Variant {
                    lang: "en".into(),
                    text: "Hello".into(),
                },
                Variant {
                    lang: "fr".into(),
                    text: "Bonjour".into(),
                },
            ],
            attrs,
        )
        .unwrap()
    }

    fn with_creation_id(id: &str) -> TranslationUnit {
        unit(UnitAttrs {
            creation_id: id.into(),
            ..UnitAttrs::default()
        })
    }

    fn kept_index(resolved: &[ResolvedUnit]) -> usize {
        let kept: Vec<usize> = resolved
            .iter()
            .enumerate()
            .filter(|(_, r)| r.status == UnitStatus::Keep)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(kept.len(), 1, "exactly one keep expected");
        kept[0]
    }

    #[test]
    fn privileged_creation_id_wins() {
        // Three units sharing text; only "id2" is privileged
        let members = vec![
            with_creation_id("id1"),
            with_creation_id("id2"),
            with_creation_id("id3"),
        ];
        let config = PriorityConfig {
            creation_ids: vec!["id2".into()],
            ..PriorityConfig::default()
        };

        let resolved = resolve(members, &config);
        assert_eq!(kept_index(&resolved), 1);
        assert_eq!(resolved[1].unit.attrs.creation_id, "id2");
    }

    #[test]
    fn earlier_list_index_beats_later() {
        let members = vec![with_creation_id("low"), with_creation_id("high")];
        let config = PriorityConfig {
            creation_ids: vec!["high".into(), "low".into()],
            ..PriorityConfig::default()
        };
        assert_eq!(kept_index(&resolve(members, &config)), 1);
    }

    #[test]
    fn absent_id_sorts_after_present() {
        let members = vec![with_creation_id("unlisted"), with_creation_id("listed")];
        let config = PriorityConfig {
            creation_ids: vec!["listed".into()],
            ..PriorityConfig::default()
        };
        assert_eq!(kept_index(&resolve(members, &config)), 1);
    }

    #[test]
    fn latest_change_date_wins_when_ids_tie() {
        let old = unit(UnitAttrs {
            change_date: "20230101T000000Z".into(),
            ..UnitAttrs::default()
        });
        let new = unit(UnitAttrs {
            change_date: "20240101T000000Z".into(),
            ..UnitAttrs::default()
        });
        let resolved = resolve(vec![old, new], &PriorityConfig::default());
        assert_eq!(kept_index(&resolved), 1);
    }

    #[test]
    fn date_first_flag_reorders_precedence() {
        // "late" has the newer date, "listed" the privileged id
        let late = unit(UnitAttrs {
            creation_id: "other".into(),
            change_date: "20240601T000000Z".into(),
            ..UnitAttrs::default()
        });
        let listed = unit(UnitAttrs {
            creation_id: "listed".into(),
            change_date: "20230101T000000Z".into(),
            ..UnitAttrs::default()
        });

        let ids_first = PriorityConfig {
            creation_ids: vec!["listed".into()],
            ..PriorityConfig::default()
        };
        let dates_first = PriorityConfig {
            date_first: true,
            ..ids_first.clone()
        };

        let resolved = resolve(vec![late.clone(), listed.clone()], &ids_first);
        assert_eq!(resolved[kept_index(&resolved)].unit.attrs.creation_id, "listed");

        let resolved = resolve(vec![late, listed], &dates_first);
        assert_eq!(resolved[kept_index(&resolved)].unit.attrs.creation_id, "other");
    }

    #[test]
    fn empty_date_loses_to_any_date() {
        let dated = unit(UnitAttrs {
            change_date: "20240101T000000Z".into(),
            ..UnitAttrs::default()
        });
        let undated = unit(UnitAttrs::default());
        let resolved = resolve(vec![undated, dated], &PriorityConfig::default());
        assert_eq!(kept_index(&resolved), 1);
    }

    #[test]
    fn full_tie_preserves_file_order() {
        let members = vec![with_creation_id("same"), with_creation_id("same")];
        let resolved = resolve(members, &PriorityConfig::default());
        assert_eq!(kept_index(&resolved), 0);
    }

    #[test]
    fn resolution_is_deterministic() {
        let members = vec![
            with_creation_id("a"),
            unit(UnitAttrs {
                change_date: "20240301T000000Z".into(),
                ..UnitAttrs::default()
            }),
            with_creation_id("b"),
        ];
        let config = PriorityConfig {
            creation_ids: vec!["b".into()],
            ..PriorityConfig::default()
        };

        let first = resolve(members.clone(), &config);
        for _ in 0..5 {
            assert_eq!(resolve(members.clone(), &config), first);
        }
    }

    #[test]
    fn date_disabled_flags_skip_comparison() {
        let newer = unit(UnitAttrs {
            change_date: "20240101T000000Z".into(),
            ..UnitAttrs::default()
        });
        let older = unit(UnitAttrs {
            change_date: "20230101T000000Z".into(),
            ..UnitAttrs::default()
        });
        let config = PriorityConfig {
            prefer_latest_change_date: false,
            prefer_latest_creation_date: false,
            ..PriorityConfig::default()
        };
        // With both date preferences off the older unit wins on file order
        let resolved = resolve(vec![older, newer], &config);
        assert_eq!(kept_index(&resolved), 0);
    }
}
