// Unit tests for the core-word estimators.
//
// Exercises the engine end to end on small corpora: single-word titles,
// normalization, convergence within the step cap, the IDF heuristic, the
// effect of the background prior, ad hoc titles, and degenerate inputs.

use toponym::model::{BackgroundPrior, CoreWordEngine, EmParams, Model, WordProbabilities};
use toponym::places::models::Place;
use toponym::places::store::PlaceStore;
use toponym::tiling::Tiling;

fn store_of(titles: &[&str]) -> PlaceStore {
    PlaceStore::from_places(
        titles
            .iter()
            .enumerate()
            .map(|(i, t)| Place::new(i as u64 + 1, *t)),
    )
}

fn engine_with(titles: &[&str], prior: BackgroundPrior) -> CoreWordEngine {
    let params = EmParams {
        background_prior: prior,
        ..EmParams::default()
    };
    CoreWordEngine::new(store_of(titles), Tiling::City, params).unwrap()
}

/// Ten places in two neighbourhoods plus one untiled landmark.
fn neighbourhoods(prior: BackgroundPrior) -> CoreWordEngine {
    let montmartre = [
        "Rue Lepic",
        "Rue Cler",
        "Rue Mouffetard",
        "Rue de Rivoli",
        "Cafe Lepic",
    ];
    let mayfair = ["Hyde Park", "Green Park", "Park Lane", "Regent Park"];

    let mut places = Vec::new();
    let mut id = 1;
    for title in montmartre {
        places.push(Place::new(id, title).with_city(1));
        id += 1;
    }
    for title in mayfair {
        places.push(Place::new(id, title).with_city(2));
        id += 1;
    }
    places.push(Place::new(id, "Louvre"));

    let params = EmParams {
        background_prior: prior,
        ..EmParams::default()
    };
    CoreWordEngine::new(PlaceStore::from_places(places), Tiling::City, params).unwrap()
}

fn p(posterior: &WordProbabilities, word: &str) -> f64 {
    posterior
        .get(word)
        .unwrap_or_else(|| panic!("{word} missing from posterior"))
}

fn assert_normalized(engine: &CoreWordEngine) {
    for (place, posterior) in engine.posteriors() {
        if posterior.is_empty() {
            continue;
        }
        let sum = posterior.sum();
        assert!(
            (sum - 1.0).abs() < 1e-9,
            "posterior of '{}' sums to {sum}",
            place.title
        );
        for (word, value) in posterior.iter() {
            assert!(
                (0.0..=1.0).contains(&value),
                "{word} in '{}' out of range: {value}",
                place.title
            );
        }
    }
}

// ============================================================
// Single-word titles and normalization
// ============================================================

#[test]
fn single_word_title_is_certain_under_every_em_model() {
    for model in [Model::Name, Model::SpatialContext] {
        let mut engine = neighbourhoods(BackgroundPrior::Uniform);
        engine.run_configured(model);
        let louvre = engine.posterior(10).unwrap();
        assert_eq!(louvre.len(), 1);
        assert!((p(louvre, "louvre") - 1.0).abs() < 1e-12, "{model}");
    }
}

#[test]
fn posteriors_sum_to_one_after_every_model() {
    for model in [Model::Name, Model::SpatialContext, Model::Idf] {
        for prior in [BackgroundPrior::Uniform, BackgroundPrior::Frequency] {
            let mut engine = neighbourhoods(prior);
            engine.run_configured(model);
            assert_normalized(&engine);
        }
    }
}

#[test]
fn repeated_word_collapses_to_one_entry() {
    let mut engine = engine_with(&["Baden Baden", "Baden Street"], BackgroundPrior::Uniform);
    engine.run_configured(Model::Name);
    let baden = engine.posterior(1).unwrap();
    assert_eq!(baden.len(), 1);
    assert!((p(baden, "baden") - 1.0).abs() < 1e-12);
    assert_eq!(engine.stats().occurrences, 4);
}

// ============================================================
// EM convergence
// ============================================================

#[test]
fn name_model_converges_within_step_cap() {
    for prior in [BackgroundPrior::Uniform, BackgroundPrior::Frequency] {
        let mut engine = neighbourhoods(prior);
        let report = engine.run(Model::Name, 100, 1e-3);
        assert!(report.converged, "{prior:?}: {report:?}");
        assert!(report.steps <= 100);
        assert!(report.final_delta < 1e-3);
    }
}

#[test]
fn spatial_model_converges_within_step_cap() {
    let mut engine = neighbourhoods(BackgroundPrior::Frequency);
    let report = engine.run(Model::SpatialContext, 100, 1e-3);
    assert!(report.converged, "{report:?}");
    assert_eq!(report.model, Model::SpatialContext);
}

#[test]
fn step_cap_bounds_the_run() {
    let mut engine = neighbourhoods(BackgroundPrior::Frequency);
    let report = engine.run(Model::Name, 2, 0.0);
    assert_eq!(report.steps, 2);
    assert!(!report.converged);
    assert_normalized(&engine);
}

#[test]
fn frequent_prefix_is_background() {
    for model in [Model::Name, Model::SpatialContext] {
        for prior in [BackgroundPrior::Uniform, BackgroundPrior::Frequency] {
            let mut engine = neighbourhoods(prior);
            engine.run_configured(model);
            let lepic = engine.posterior(1).unwrap();
            assert!(
                p(lepic, "lepic") > 0.99,
                "{model}/{prior:?}: lepic = {}",
                p(lepic, "lepic")
            );
            assert!(p(lepic, "rue") < 0.01);
        }
    }
}

// ============================================================
// Background prior on the three-place corpus
// ============================================================

#[test]
fn uniform_seeding_is_a_fixed_point_of_a_symmetric_corpus() {
    let mut engine = engine_with(
        &["Central Park", "Central Station", "Hyde Park"],
        BackgroundPrior::Uniform,
    );
    let report = engine.run_configured(Model::Name);
    assert!(report.converged);
    // Every place ends tied and ranks its words in title order
    assert_eq!(report.tied_places, 3);
    let station = engine.posterior(2).unwrap();
    assert_eq!(station.top().map(|(w, _)| w), Some("central"));
    for (_, posterior) in engine.posteriors() {
        for (word, value) in posterior.iter() {
            assert!((value - 0.5).abs() < 1e-12, "{word} = {value}");
        }
    }
}

#[test]
fn frequency_seeding_separates_rare_words() {
    let mut engine = engine_with(
        &["Central Park", "Central Station", "Hyde Park"],
        BackgroundPrior::Frequency,
    );
    let report = engine.run_configured(Model::Name);
    assert!(report.converged, "{report:?}");
    // Only Central Park is left tied
    assert_eq!(report.tied_places, 1);

    let station = engine.posterior(2).unwrap();
    assert!(p(station, "station") > p(station, "central"));
    assert!(p(station, "station") > 0.75, "station = {}", p(station, "station"));

    let hyde = engine.posterior(3).unwrap();
    assert!(p(hyde, "hyde") > p(hyde, "park"));

    // Central and Park play mirrored roles, so neither can win
    let central_park = engine.posterior(1).unwrap();
    assert!((p(central_park, "central") - 0.5).abs() < 1e-9);
    assert!((p(central_park, "park") - 0.5).abs() < 1e-9);
    assert!(central_park.top_is_tied());
    assert!(!station.top_is_tied());
}

#[test]
fn frequency_seeding_sets_initial_background_shares() {
    let engine = engine_with(
        &["Central Park", "Central Station", "Hyde Park"],
        BackgroundPrior::Frequency,
    );
    let d = engine.distributions();
    assert!((d.background_weight("central") - 2.0 / 6.0).abs() < 1e-12);
    assert!((d.background_weight("hyde") - 1.0 / 6.0).abs() < 1e-12);
    assert!((d.core_weight("hyde") - 0.25).abs() < 1e-12);
}

// ============================================================
// IDF heuristic
// ============================================================

#[test]
fn idf_ranks_unique_words_first() {
    let mut engine = neighbourhoods(BackgroundPrior::Uniform);
    let report = engine.run_configured(Model::Idf);
    assert_eq!(report.steps, 0);
    assert!(report.converged);

    let cler = engine.posterior(2).unwrap();
    assert!(p(cler, "cler") > p(cler, "rue"));
    assert_eq!(cler.top().map(|(w, _)| w), Some("cler"));

    // de and rivoli both occur once: equal scores
    let rivoli = engine.posterior(4).unwrap();
    assert!((p(rivoli, "de") - p(rivoli, "rivoli")).abs() < 1e-12);
}

#[test]
fn idf_does_not_touch_distributions() {
    let mut engine = neighbourhoods(BackgroundPrior::Uniform);
    let before = engine.distributions().clone();
    engine.run_configured(Model::Idf);
    assert_eq!(engine.distributions().core, before.core);
    assert_eq!(engine.distributions().background, before.background);
}

// ============================================================
// Ad hoc titles
// ============================================================

#[test]
fn unseen_title_is_added_and_scored() {
    for prior in [BackgroundPrior::Uniform, BackgroundPrior::Frequency] {
        let mut engine = neighbourhoods(prior);
        engine.run_configured(Model::Name);
        let places_before = engine.stats().places;

        let posterior = engine.compute_core_probability("Rue Bonaparte");
        assert!((posterior.sum() - 1.0).abs() < 1e-9);
        assert!(
            p(&posterior, "bonaparte") > 0.99,
            "{prior:?}: bonaparte = {}",
            p(&posterior, "bonaparte")
        );
        assert_eq!(engine.stats().places, places_before + 1);
        assert!(engine.index().contains_word("bonaparte"));

        // Asking again returns the stored posterior without re-indexing
        let again = engine.compute_core_probability("Rue Bonaparte");
        assert_eq!(again, posterior);
        assert_eq!(engine.stats().places, places_before + 1);
    }
}

#[test]
fn placeholder_gets_a_fresh_id() {
    let mut engine = neighbourhoods(BackgroundPrior::Uniform);
    engine.run_configured(Model::Name);
    engine.compute_core_probability("Montmartre");

    let placeholders = engine.store().get_by_title("Montmartre");
    assert_eq!(placeholders.len(), 1);
    assert_eq!(placeholders[0].id, 11);
    assert!(placeholders[0].location.is_none());

    let posterior = engine.posterior(11).unwrap();
    assert!((p(posterior, "montmartre") - 1.0).abs() < 1e-12);
}

#[test]
fn empty_title_yields_empty_posterior() {
    let mut engine = neighbourhoods(BackgroundPrior::Uniform);
    engine.run_configured(Model::Name);
    let posterior = engine.compute_core_probability("");
    assert!(posterior.is_empty());

    let again = engine.compute_core_probability(" ( / ) ");
    assert!(again.is_empty());
}

#[test]
fn late_place_joins_the_next_run() {
    let mut engine = neighbourhoods(BackgroundPrior::Frequency);
    engine.run_configured(Model::Name);
    assert!(engine.add_or_update_place(Place::new(50, "Rue Saint-Denis").with_city(1)));
    assert_eq!(engine.tile_id(50), Some(toponym::tiling::TileId(1)));
    let neighbours = engine.places_in_same_tile(50);
    assert!(neighbours.contains(&50), "{neighbours:?}");
    assert!(neighbours.contains(&1));

    let report = engine.run_configured(Model::SpatialContext);
    assert!(report.converged, "{report:?}");
    assert_normalized(&engine);
    let saint_denis = engine.posterior(50).unwrap();
    assert!(p(saint_denis, "saint-denis") > p(saint_denis, "rue"));
}

// ============================================================
// Degenerate corpora
// ============================================================

#[test]
fn empty_corpus_runs_cleanly() {
    let mut engine = engine_with(&[], BackgroundPrior::Uniform);
    let report = engine.run_configured(Model::Name);
    assert!(report.converged);
    assert_eq!(report.steps, 1);
    assert_eq!(engine.stats().places, 0);
}

#[test]
fn all_single_word_titles_have_no_background() {
    let mut engine = engine_with(&["Louvre", "Pantheon", "Louvre"], BackgroundPrior::Frequency);
    let report = engine.run_configured(Model::Name);
    assert!(report.converged);
    assert_eq!(engine.distributions().background_weight("louvre"), 0.0);
    assert_normalized(&engine);
}

#[test]
fn invalid_mixture_weight_is_rejected() {
    let params = EmParams {
        mixture_weight: 1.0,
        ..EmParams::default()
    };
    assert!(CoreWordEngine::new(store_of(&["Hyde Park"]), Tiling::City, params).is_err());
}
