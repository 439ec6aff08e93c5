use std::sync::Arc;
use std::thread;

use super::common::*;
use crate::decision::catalogue::CARRIER_PROCESSABILITY;
use crate::decision::{
    CriterionCatalogue, CriterionId, DecisionError, DecisionMechanism, Deletion, Scenario,
    ScenarioController, ScenarioId, DEFAULT_CRITERION_VALUE, START_SCENARIO_ID,
};

#[test]
fn fresh_controller_holds_start_scenario_with_defaults() {
    let controller = controller();

    let scenarios = controller.scenarios();
    assert_eq!(scenarios.len(), 1);

    let start = &scenarios[0];
    assert_eq!(start.id(), &ScenarioId::new(START_SCENARIO_ID));
    let processability = start
        .criteria()
        .iter()
        .find(|criterion| criterion.name() == "carrier processability")
        .expect("processability criterion present");
    assert_eq!(processability.value(), DEFAULT_CRITERION_VALUE);
    assert_eq!(processability.value(), 50);
    assert!(processability.is_active());
    assert_eq!(start.criteria().len(), CriterionCatalogue::standard().len());
}

#[test]
fn standard_controller_carries_every_catalogue_definition() {
    let catalogue = CriterionCatalogue::standard();
    let expected = catalogue.instantiate().expect("standard catalogue is valid");
    let controller = controller();

    let start = controller
        .scenario(&ScenarioId::new(START_SCENARIO_ID))
        .expect("start scenario");
    assert_eq!(start.criteria().len(), catalogue.len());
    for (criterion, wanted) in start.criteria().iter().zip(&expected) {
        assert_eq!(criterion.id(), wanted.id());
        assert_eq!(criterion.name(), wanted.name());
        assert_eq!(criterion.value(), wanted.value());
        assert_eq!(criterion.is_active(), wanted.is_active());
    }
}

#[test]
fn value_change_is_visible_after_synchronisation() {
    let controller = controller();
    let scenario_id = ScenarioId::new(START_SCENARIO_ID);
    let criterion_id = CriterionId::new(CARRIER_PROCESSABILITY);

    let mut snapshot = controller.scenario(&scenario_id).expect("start scenario");
    let criterion = snapshot
        .criterion_mut(&criterion_id)
        .expect("criterion present");
    criterion.set_value(60).expect("value in range");

    controller
        .update_criterion_value_change(&scenario_id, criterion)
        .expect("update succeeds");

    let refreshed = controller.scenario(&scenario_id).expect("start scenario");
    assert_eq!(
        refreshed.criterion(&criterion_id).expect("criterion").value(),
        60
    );
}

#[test]
fn last_scenario_deletion_is_refused_repeatedly() {
    let controller = controller();
    let start = ScenarioId::new(START_SCENARIO_ID);

    for _ in 0..3 {
        assert_eq!(
            controller.delete_scenario(&start),
            Ok(Deletion::RefusedLastScenario)
        );
        assert_eq!(controller.scenario_count(), 1);
    }

    let created = controller.create_new_scenario();
    assert_eq!(controller.scenario_count(), 2);

    assert_eq!(controller.delete_scenario(created.id()), Ok(Deletion::Removed));
    assert_eq!(controller.scenario_count(), 1);
    assert!(controller.scenario(&start).is_ok());
}

#[test]
fn either_scenario_may_go_when_two_exist() {
    let controller = controller();
    let created = controller.create_new_scenario();

    assert_eq!(
        controller.delete_scenario(&ScenarioId::new(START_SCENARIO_ID)),
        Ok(Deletion::Removed)
    );
    assert_eq!(
        controller.delete_scenario(created.id()),
        Ok(Deletion::RefusedLastScenario)
    );
    assert_eq!(controller.scenarios()[0].id(), created.id());
}

#[test]
fn delete_reports_unknown_scenario() {
    let controller = controller();
    controller.create_new_scenario();

    match controller.delete_scenario(&ScenarioId::new("missing")) {
        Err(DecisionError::ScenarioNotFound(id)) => assert_eq!(id.as_str(), "missing"),
        other => panic!("expected not found, got {other:?}"),
    }
    assert_eq!(controller.scenario_count(), 2);
}

#[test]
fn create_new_scenario_assigns_fresh_ids_with_catalogue_defaults() {
    let controller = controller();

    let first = controller.create_new_scenario();
    let second = controller.create_new_scenario();

    assert_ne!(first.id(), second.id());
    assert_eq!(controller.scenario_count(), 3);
    assert!(second
        .criteria()
        .iter()
        .all(|criterion| criterion.value() == DEFAULT_CRITERION_VALUE && criterion.is_active()));
}

#[test]
fn create_new_scenario_skips_ids_taken_by_added_scenarios() {
    let controller = controller();
    controller
        .add_scenario(
            Scenario::from_catalogue(
                ScenarioId::new("scenario-1"),
                "imported",
                controller.catalogue(),
            )
            .expect("valid catalogue"),
        )
        .expect("id is free");

    let created = controller.create_new_scenario();

    assert_eq!(created.id().as_str(), "scenario-2");
    assert_eq!(controller.scenario_count(), 3);
}

#[test]
fn add_scenario_rejects_duplicate_ids() {
    let controller = controller();
    let duplicate = Scenario::from_catalogue(
        ScenarioId::new(START_SCENARIO_ID),
        "copy",
        controller.catalogue(),
    )
    .expect("valid catalogue");

    match controller.add_scenario(duplicate) {
        Err(DecisionError::DuplicateScenario(id)) => assert_eq!(id.as_str(), START_SCENARIO_ID),
        other => panic!("expected duplicate error, got {other:?}"),
    }
    assert_eq!(controller.scenario_count(), 1);
    assert_eq!(
        controller
            .scenario(&ScenarioId::new(START_SCENARIO_ID))
            .expect("start scenario")
            .name(),
        "Start scenario"
    );
}

#[test]
fn activation_change_updates_owned_criterion() {
    let controller = controller();
    let scenario_id = ScenarioId::new(START_SCENARIO_ID);
    let criterion_id = CriterionId::new(CARRIER_PROCESSABILITY);

    controller
        .criterion_activation_change(&scenario_id, &criterion_id, false)
        .expect("known ids");

    let scenario = controller.scenario(&scenario_id).expect("start scenario");
    assert!(!scenario.criterion(&criterion_id).expect("criterion").is_active());
}

#[test]
fn activation_change_reports_unknown_ids() {
    let controller = controller();

    assert!(matches!(
        controller.criterion_activation_change(
            &ScenarioId::new("missing"),
            &CriterionId::new(CARRIER_PROCESSABILITY),
            false
        ),
        Err(DecisionError::ScenarioNotFound(_))
    ));
    assert!(matches!(
        controller.criterion_activation_change(
            &ScenarioId::new(START_SCENARIO_ID),
            &CriterionId::new("missing"),
            false
        ),
        Err(DecisionError::CriterionNotFound { .. })
    ));
}

#[test]
fn out_of_range_value_leaves_state_untouched() {
    let controller = controller();
    let scenario_id = ScenarioId::new(START_SCENARIO_ID);
    let criterion_id = CriterionId::new(CARRIER_PROCESSABILITY);

    assert!(matches!(
        controller.set_criterion_value(&scenario_id, &criterion_id, 101),
        Err(DecisionError::OutOfRange { value: 101, .. })
    ));

    let scenario = controller.scenario(&scenario_id).expect("start scenario");
    assert_eq!(
        scenario.criterion(&criterion_id).expect("criterion").value(),
        DEFAULT_CRITERION_VALUE
    );
}

#[test]
fn rename_changes_display_name_only() {
    let controller = controller();
    let scenario_id = ScenarioId::new(START_SCENARIO_ID);

    controller
        .rename_scenario(&scenario_id, "Long-term archive")
        .expect("known scenario");

    let scenario = controller.scenario(&scenario_id).expect("start scenario");
    assert_eq!(scenario.name(), "Long-term archive");
    assert_eq!(scenario.id(), &scenario_id);
}

#[test]
fn custom_catalogue_with_duplicate_ids_is_rejected() {
    let mut catalogue = small_catalogue();
    catalogue.definitions.push(catalogue.definitions[0].clone());

    match ScenarioController::with_catalogue(DecisionMechanism::new(), catalogue) {
        Err(DecisionError::DuplicateCriterion(id)) => assert_eq!(id, processability()),
        Err(other) => panic!("expected duplicate criterion, got {other:?}"),
        Ok(_) => panic!("expected duplicate criterion error"),
    }
}

#[test]
fn scenario_count_never_drops_below_one() {
    let controller = small_controller();
    let mut created = Vec::new();

    for round in 0..12 {
        if round % 3 == 0 {
            created.push(controller.create_new_scenario().id().clone());
        } else if let Some(id) = created.pop() {
            controller.delete_scenario(&id).expect("known id");
        } else {
            let remaining = controller.scenarios();
            controller
                .delete_scenario(remaining[0].id())
                .expect("known id");
        }
        assert!(controller.scenario_count() >= 1);
    }
}

#[test]
fn concurrent_lifecycle_keeps_at_least_one_scenario() {
    let controller = Arc::new(small_controller());

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let controller = Arc::clone(&controller);
            thread::spawn(move || {
                for _ in 0..50 {
                    let created = controller.create_new_scenario();
                    for scenario in controller.scenarios() {
                        // Another worker may already have removed it.
                        let _ = controller.delete_scenario(scenario.id());
                    }
                    let _ = controller.set_criterion_value(created.id(), &processability(), 70);
                    assert!(controller.scenario_count() >= 1);
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().expect("worker finished");
    }

    let scenarios = controller.scenarios();
    assert!(!scenarios.is_empty());
    for scenario in &scenarios {
        let mut ids: Vec<_> = scenario.criteria().iter().map(|c| c.id().clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), scenario.criteria().len());
    }
}

#[test]
fn counted_deletion_reports_count_after_its_own_removal() {
    let controller = small_controller();
    let first = controller.create_new_scenario();
    let second = controller.create_new_scenario();

    assert_eq!(
        controller.delete_scenario_counted(first.id()),
        Ok((Deletion::Removed, 2))
    );
    assert_eq!(
        controller.delete_scenario_counted(second.id()),
        Ok((Deletion::Removed, 1))
    );
    assert_eq!(
        controller.delete_scenario_counted(&ScenarioId::new(START_SCENARIO_ID)),
        Ok((Deletion::RefusedLastScenario, 1))
    );
}

#[test]
fn concurrent_counted_deletions_each_see_a_distinct_count() {
    const EXTRA: usize = 16;
    let controller = Arc::new(small_controller());
    let created: Vec<Scenario> = (0..EXTRA).map(|_| controller.create_new_scenario()).collect();

    let workers: Vec<_> = created
        .into_iter()
        .map(|scenario| {
            let controller = Arc::clone(&controller);
            thread::spawn(move || {
                controller
                    .delete_scenario_counted(scenario.id())
                    .expect("scenario exists")
            })
        })
        .collect();

    let mut remaining: Vec<usize> = workers
        .into_iter()
        .map(|worker| {
            let (deletion, remaining) = worker.join().expect("worker finished");
            assert_eq!(deletion, Deletion::Removed);
            remaining
        })
        .collect();
    remaining.sort_unstable();

    assert_eq!(remaining, (1..=EXTRA).collect::<Vec<_>>());
    assert_eq!(controller.scenario_count(), 1);
}

#[test]
fn ranking_through_controller_excludes_deactivated_criterion() {
    let controller = small_controller();
    let registry = registry();
    let scenario_id = ScenarioId::new(START_SCENARIO_ID);

    controller
        .set_criterion_value(&scenario_id, &processability(), 100)
        .expect("value in range");
    controller
        .set_criterion_value(&scenario_id, &authenticity(), 30)
        .expect("value in range");
    let before = controller.rank(&scenario_id, &registry).expect("ranking");
    assert_eq!(ranked_ids(&before), vec!["embedder", "archiver"]);

    controller
        .criterion_activation_change(&scenario_id, &processability(), false)
        .expect("known ids");
    let after = controller.rank(&scenario_id, &registry).expect("ranking");

    assert_eq!(ranked_ids(&after), vec!["archiver", "embedder"]);
    assert!(after
        .iter()
        .all(|entry| entry.score.components.iter().all(|c| c.criterion != processability())));
}
