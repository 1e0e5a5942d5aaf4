use structured_notes_core::models::note::{Note, NoteInput};
use structured_notes_core::models::tier::Tier;
use structured_notes_core::models::working_set::WorkingSet;
use structured_notes_core::services::rank_service::{
    classify_notes, rank, tier_for_percentile, ScoreRange, HIGH_TIER_THRESHOLD,
    MEDIUM_TIER_THRESHOLD,
};

fn scored(ticker: &str, score: Option<f64>) -> Note {
    let mut note = Note::new(NoteInput::new(ticker, 5.0, 20.0, false)).unwrap();
    note.score = score;
    note
}

fn set_with_scores(scores: &[(&str, Option<f64>)]) -> WorkingSet {
    let mut set = WorkingSet::new();
    for (ticker, _) in scores {
        set.add_note(NoteInput::new(*ticker, 5.0, 20.0, false)).unwrap();
    }
    for (note, (_, score)) in set.notes_mut().iter_mut().zip(scores) {
        note.score = *score;
    }
    set
}

// ═══════════════════════════════════════════════════════════════════
//  ScoreRange
// ═══════════════════════════════════════════════════════════════════

mod score_range {
    use super::*;

    #[test]
    fn empty_has_no_range() {
        assert_eq!(ScoreRange::from_scores(Vec::<f64>::new()), None);
        assert_eq!(ScoreRange::from_notes(&[scored("A", None)]), None);
    }

    #[test]
    fn min_and_max() {
        let range = ScoreRange::from_scores([0.3, -0.1, 0.9, 0.5]).unwrap();
        assert_eq!(range, ScoreRange { min: -0.1, max: 0.9 });
    }

    #[test]
    fn non_finite_scores_ignored() {
        let range = ScoreRange::from_scores([f64::NAN, 1.0, f64::INFINITY, 2.0]).unwrap();
        assert_eq!(range, ScoreRange { min: 1.0, max: 2.0 });
    }

    #[test]
    fn percentile_spans_zero_to_one() {
        let range = ScoreRange { min: 10.0, max: 30.0 };
        assert_eq!(range.percentile(10.0), 0.0);
        assert_eq!(range.percentile(20.0), 0.5);
        assert_eq!(range.percentile(30.0), 1.0);
    }

    #[test]
    fn degenerate_range_is_top() {
        let range = ScoreRange { min: 5.0, max: 5.0 };
        assert_eq!(range.percentile(5.0), 1.0);
        assert_eq!(range.classify(5.0), Tier::High);
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Tier thresholds
// ═══════════════════════════════════════════════════════════════════

mod thresholds {
    use super::*;

    #[test]
    fn boundaries_are_inclusive() {
        assert_eq!(tier_for_percentile(HIGH_TIER_THRESHOLD), Tier::High);
        assert_eq!(tier_for_percentile(MEDIUM_TIER_THRESHOLD), Tier::Medium);
    }

    #[test]
    fn just_below_boundaries() {
        assert_eq!(tier_for_percentile(0.6599), Tier::Medium);
        assert_eq!(tier_for_percentile(0.3299), Tier::Low);
    }

    #[test]
    fn extremes() {
        assert_eq!(tier_for_percentile(0.0), Tier::Low);
        assert_eq!(tier_for_percentile(1.0), Tier::High);
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Classification over notes
// ═══════════════════════════════════════════════════════════════════

mod classify {
    use super::*;

    #[test]
    fn three_evenly_spread_scores() {
        let notes = [
            scored("A", Some(10.0)),
            scored("B", Some(20.0)),
            scored("C", Some(30.0)),
        ];
        assert_eq!(
            classify_notes(&notes),
            vec![Some(Tier::Low), Some(Tier::Medium), Some(Tier::High)]
        );
    }

    #[test]
    fn equal_scores_are_all_high() {
        let notes = [
            scored("A", Some(5.0)),
            scored("B", Some(5.0)),
            scored("C", Some(5.0)),
        ];
        assert_eq!(classify_notes(&notes), vec![Some(Tier::High); 3]);
    }

    #[test]
    fn single_scored_note_is_high() {
        assert_eq!(classify_notes(&[scored("A", Some(-2.0))]), vec![Some(Tier::High)]);
    }

    #[test]
    fn unscored_notes_are_excluded() {
        let notes = [
            scored("A", Some(10.0)),
            scored("B", None),
            scored("C", Some(30.0)),
        ];
        assert_eq!(
            classify_notes(&notes),
            vec![Some(Tier::Low), None, Some(Tier::High)]
        );
    }

    #[test]
    fn nothing_scored() {
        let notes = [scored("A", None), scored("B", None)];
        assert_eq!(classify_notes(&notes), vec![None, None]);
        assert!(classify_notes(&[]).is_empty());
    }

    #[test]
    fn tiers_are_relative_to_the_set() {
        let mut notes = vec![scored("A", Some(10.0)), scored("B", Some(20.0))];
        assert_eq!(classify_notes(&notes)[1], Some(Tier::High));

        notes.push(scored("C", Some(40.0)));
        // 20 now sits at (20 - 10) / 30 = 0.333..
        assert_eq!(classify_notes(&notes)[1], Some(Tier::Medium));
    }
}

// ═══════════════════════════════════════════════════════════════════
//  Ranking
// ═══════════════════════════════════════════════════════════════════

mod ranking {
    use super::*;

    #[test]
    fn best_first_with_positions() {
        let set = set_with_scores(&[("A", Some(0.2)), ("B", Some(0.9)), ("C", Some(0.5))]);
        let ranked = rank(&set);

        let order: Vec<(&str, usize)> = ranked
            .iter()
            .map(|r| (r.note.ticker.as_str(), r.index))
            .collect();
        assert_eq!(order, [("B", 1), ("C", 2), ("A", 0)]);
        assert_eq!(ranked[0].tier, Tier::High);
        assert_eq!(ranked[0].percentile, 1.0);
        assert_eq!(ranked[2].tier, Tier::Low);
    }

    #[test]
    fn ties_keep_insertion_order() {
        let set = set_with_scores(&[("A", Some(0.5)), ("B", Some(0.5)), ("C", Some(0.7))]);
        let tickers: Vec<&str> = rank(&set).iter().map(|r| r.note.ticker.as_str()).collect();
        assert_eq!(tickers, ["C", "A", "B"]);
    }

    #[test]
    fn unscored_notes_left_out() {
        let set = set_with_scores(&[("A", None), ("B", Some(0.4))]);
        let ranked = rank(&set);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].index, 1);
    }

    #[test]
    fn empty_when_nothing_scored() {
        let set = set_with_scores(&[("A", None)]);
        assert!(rank(&set).is_empty());
        assert!(rank(&WorkingSet::new()).is_empty());
    }
}
