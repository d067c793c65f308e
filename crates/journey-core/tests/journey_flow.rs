use chrono::{TimeZone, Utc};
use journey_core::{
    ChildEditor, Collection, FaultKind, InlineTarget, KeyInput, MetricDraft, NoticeLevel,
    PainPointDraft, PersonaToggle, RecordId, Severity, TouchpointDraft, TouchpointType,
};
use journey_test_utils::{audit_row, demo_fixture, empty_fixture, load_audits, unconfigured_fixture};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

#[tokio::test]
async fn stages_follow_order_and_group_steps() {
    let (fixture, demo) = demo_fixture().await;
    let state = fixture.controller.state();

    let names: Vec<_> = state.stages.iter().map(|s| s.stage.name.as_str()).collect();
    assert_eq!(names, ["Discover", "Evaluate", "Adopt"]);

    for stage in &state.stages {
        for step in &stage.steps {
            assert_eq!(&step.step.stage_id, stage.id());
        }
    }
    let step_counts: Vec<_> = state.stages.iter().map(|s| s.steps.len()).collect();
    assert_eq!(step_counts, [2, 2, 1]);
    assert_eq!(state.personas.len(), demo.personas.len());
}

#[tokio::test]
async fn toggling_twice_restores_associations() {
    let (fixture, demo) = demo_fixture().await;
    let step = demo.steps[1].clone();
    let persona = demo.personas[2].clone();
    let before = fixture.gateway.count(Collection::PersonaSteps);

    let first = fixture.controller.toggle_persona(&step, &persona).await.unwrap();
    assert_eq!(first, PersonaToggle::Added);
    assert!(fixture.controller.read(|s| s.step(&step).unwrap().has_persona(&persona)));

    let second = fixture.controller.toggle_persona(&step, &persona).await.unwrap();
    assert_eq!(second, PersonaToggle::Removed);
    assert!(!fixture.controller.read(|s| s.step(&step).unwrap().has_persona(&persona)));
    assert_eq!(fixture.gateway.count(Collection::PersonaSteps), before);
}

#[tokio::test]
async fn deleting_a_stage_cascades() {
    let (fixture, demo) = demo_fixture().await;
    let discover = demo.stages[0].clone();
    load_audits(
        &fixture.gateway,
        [audit_row(
            &demo.steps[0],
            Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap(),
            "Renamed action",
        )],
    );

    let deleted = fixture.controller.delete_stage(&discover).await.unwrap();
    assert!(deleted);
    assert_eq!(fixture.surface.prompts().len(), 1);

    let state = fixture.controller.state();
    assert_eq!(state.stages.len(), 2);
    assert!(state.stage(&discover).is_none());
    assert!(state.step(&demo.steps[0]).is_none());

    // Discover owned one pain point, one touchpoint and one metric
    assert_eq!(fixture.gateway.count(Collection::Steps), 3);
    assert_eq!(fixture.gateway.count(Collection::PainPoints), 3);
    assert_eq!(fixture.gateway.count(Collection::Metrics), 2);
    assert_eq!(fixture.gateway.count(Collection::Touchpoints), 3);
    assert_eq!(fixture.gateway.count(Collection::JourneyAudits), 0);
    let removed = [demo.steps[0].as_str(), demo.steps[1].as_str()];
    assert!(fixture
        .gateway
        .rows(Collection::PersonaSteps)
        .iter()
        .all(|row| !removed.iter().any(|id| row["step_id"] == *id)));
}

#[tokio::test]
async fn declined_confirmation_deletes_nothing() {
    let (fixture, demo) = demo_fixture().await;
    fixture.surface.set_answer(false);
    let writes = fixture.gateway.write_count();

    let deleted = fixture.controller.delete_step(&demo.steps[0]).await.unwrap();
    assert!(!deleted);
    assert_eq!(fixture.gateway.write_count(), writes);
    assert!(fixture.controller.read(|s| s.step(&demo.steps[0]).is_some()));
}

#[tokio::test]
async fn confirmed_step_delete_removes_its_children() {
    let (fixture, demo) = demo_fixture().await;
    let quickstart = demo.steps[2].clone();

    let deleted = fixture.controller.delete_step(&quickstart).await.unwrap();
    assert!(deleted);
    assert_eq!(fixture.surface.prompts().len(), 1);

    // the quickstart step had one pain point, two touchpoints, one metric and two personas
    assert_eq!(fixture.gateway.count(Collection::Steps), 4);
    assert_eq!(fixture.gateway.count(Collection::PainPoints), 3);
    assert_eq!(fixture.gateway.count(Collection::Touchpoints), 2);
    assert_eq!(fixture.gateway.count(Collection::Metrics), 2);
    assert_eq!(fixture.gateway.count(Collection::PersonaSteps), 6);

    let state = fixture.controller.state();
    assert!(state.step(&quickstart).is_none());
    let evaluate = state.stage(&demo.stages[1]).unwrap();
    let actions: Vec<_> = evaluate.steps.iter().map(|s| s.step.user_action.as_str()).collect();
    assert_eq!(actions, ["Reviews pricing"]);
}

#[tokio::test]
async fn child_deletes_refetch_the_tree() {
    let (fixture, demo) = demo_fixture().await;
    let search = demo.steps[0].clone();
    let quickstart = demo.steps[2].clone();
    let state = fixture.controller.state();
    let pain = state.step(&search).unwrap().pain_points[0].id.clone();
    let guide = state
        .step(&quickstart)
        .unwrap()
        .touchpoints
        .iter()
        .find(|t| t.title == "Getting started")
        .unwrap()
        .id
        .clone();

    fixture.controller.delete_pain_point(&pain).await.unwrap();
    assert_eq!(fixture.gateway.count(Collection::PainPoints), 3);
    assert!(fixture
        .controller
        .read(|s| s.step(&search).unwrap().pain_points.is_empty()));

    fixture.controller.delete_touchpoint(&guide).await.unwrap();
    assert_eq!(fixture.gateway.count(Collection::Touchpoints), 3);
    let titles = fixture.controller.read(|s| {
        s.step(&quickstart)
            .unwrap()
            .touchpoints
            .iter()
            .map(|t| t.title.clone())
            .collect::<Vec<_>>()
    });
    assert_eq!(titles, ["Five minute quickstart"]);

    // child deletes do not ask for confirmation
    assert!(fixture.surface.prompts().is_empty());
}

#[tokio::test]
async fn closing_child_editor_discards_the_draft() {
    let (fixture, demo) = demo_fixture().await;
    let controller = &fixture.controller;
    let quickstart = demo.steps[2].clone();
    let guide = controller.read(|s| {
        s.step(&quickstart)
            .unwrap()
            .touchpoints
            .iter()
            .find(|t| t.title == "Getting started")
            .unwrap()
            .id
            .clone()
    });
    let writes = fixture.gateway.write_count();

    controller
        .open_touchpoint_editor(&quickstart, Some(&guide))
        .unwrap();
    match controller.state().child_editor {
        Some(ChildEditor::Touchpoint(draft)) => {
            assert_eq!(draft.id.as_ref(), Some(&guide));
            assert_eq!(draft.title, "Getting started");
            assert_eq!(draft.touchpoint_type, TouchpointType::Docs);
        }
        other => panic!("expected touchpoint editor, got {other:?}"),
    }
    controller
        .update_child_draft(|e| {
            if let ChildEditor::Touchpoint(d) = e {
                d.title = "Renamed guide".into();
            }
        })
        .unwrap();

    controller.close_child_editor();
    assert!(controller.state().child_editor.is_none());
    assert_eq!(fixture.gateway.write_count(), writes);
    let still_there = controller.read(|s| {
        s.step(&quickstart)
            .unwrap()
            .touchpoints
            .iter()
            .any(|t| t.title == "Getting started")
    });
    assert!(still_there);

    controller.open_touchpoint_editor(&quickstart, None).unwrap();
    assert_eq!(
        controller.state().child_editor,
        Some(ChildEditor::Touchpoint(TouchpointDraft::new(quickstart)))
    );
}

#[tokio::test]
async fn seeding_through_the_controller_refreshes_and_notifies() {
    let fixture = empty_fixture();

    let demo = fixture.controller.seed_demo().await.unwrap();
    assert_eq!(demo.steps.len(), 5);
    assert_eq!(fixture.controller.state().stages.len(), 3);

    let notices = fixture.surface.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Info);
    assert_eq!(notices[0].message, "Seeded 3 stages, 5 steps and 3 personas");
}

#[tokio::test]
async fn unconfigured_mutation_is_visible_and_harmless() {
    let (surface, controller) = unconfigured_fixture();

    let err = controller.add_stage().await.unwrap_err();
    assert!(err.is_configuration());
    assert!(controller.state().stages.is_empty());

    let messages = surface.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].starts_with("Add stage failed"));
    assert!(!controller.refresh().await);
}

#[tokio::test]
async fn audits_are_newest_first() {
    let (fixture, demo) = demo_fixture().await;
    let step = demo.steps[2].clone();
    load_audits(
        &fixture.gateway,
        [
            audit_row(&step, Utc.with_ymd_and_hms(2026, 1, 5, 8, 0, 0).unwrap(), "older"),
            audit_row(&step, Utc.with_ymd_and_hms(2026, 2, 5, 8, 0, 0).unwrap(), "newer"),
        ],
    );
    fixture.controller.refresh().await;

    let changes = fixture.controller.read(|s| {
        s.step(&step)
            .unwrap()
            .audits
            .iter()
            .map(|a| a.change_description.clone())
            .collect::<Vec<_>>()
    });
    assert_eq!(changes, ["newer", "older"]);
}

#[tokio::test]
async fn child_records_edit_in_place() {
    let fixture = empty_fixture();
    let controller = &fixture.controller;
    let stage = controller.add_stage().await.unwrap();
    let step = controller.add_step(&stage).await.unwrap();

    let pain = controller
        .save_pain_point(
            PainPointDraft::new(step.clone())
                .with_description("CLI install, \"quietly\" fails")
                .with_severity(Severity::Low),
        )
        .await
        .unwrap();
    let mut draft =
        controller.read(|s| PainPointDraft::from(&s.step(&step).unwrap().pain_points[0]));
    draft.severity = Some(Severity::High);
    let same = controller.save_pain_point(draft).await.unwrap();
    assert_eq!(same, pain);
    assert_eq!(fixture.gateway.count(Collection::PainPoints), 1);

    controller
        .save_touchpoint(
            TouchpointDraft::new(step.clone())
                .with_title("Install guide")
                .with_type(TouchpointType::Docs),
        )
        .await
        .unwrap();
    let metric = controller
        .save_metric(MetricDraft::new(step.clone()).with_name("Installs"))
        .await
        .unwrap();

    let state = controller.state();
    let node = state.step(&step).unwrap();
    assert_eq!(node.pain_points[0].severity, Some(Severity::High));
    assert_eq!(node.touchpoints[0].touchpoint_type, TouchpointType::Docs);
    assert_eq!(node.metrics[0].metric_goal, None);

    controller.delete_metric(&metric).await.unwrap();
    assert!(controller.read(|s| s.step(&step).unwrap().metrics.is_empty()));
}

#[tokio::test]
async fn inline_edit_commits_on_enter_and_discards_on_escape() {
    let (fixture, demo) = demo_fixture().await;
    let controller = &fixture.controller;
    let stage = demo.stages[1].clone();

    controller.begin_inline_edit(InlineTarget::stage_name(stage.clone()), "Evaluate");
    controller.update_inline_draft("Trial").unwrap();
    controller.handle_inline_key(KeyInput::Escape).await.unwrap();
    assert_eq!(controller.read(|s| s.stage(&stage).unwrap().stage.name.clone()), "Evaluate");

    controller.begin_inline_edit(InlineTarget::stage_name(stage.clone()), "Evaluate");
    controller.update_inline_draft("Trial").unwrap();
    controller
        .handle_inline_key(KeyInput::Enter { shift: false })
        .await
        .unwrap();
    let state = controller.state();
    assert_eq!(state.stage(&stage).unwrap().stage.name, "Trial");
    assert!(state.inline_editor.is_none());
}

#[tokio::test]
async fn failed_stage_fetch_empties_the_tree() {
    let (fixture, _demo) = demo_fixture().await;
    fixture
        .gateway
        .fail(Collection::Stages, FaultKind::Read, "statement timeout");

    assert!(!fixture.controller.refresh().await);
    let state = fixture.controller.state();
    assert!(state.stages.is_empty());
    assert_eq!(state.personas.len(), 3);
    assert!(!state.loading);
}

#[tokio::test]
async fn write_failure_reports_gateway_message() {
    let (fixture, demo) = demo_fixture().await;
    fixture
        .gateway
        .fail(Collection::Steps, FaultKind::Write, "row-level security violation");

    let err = fixture
        .controller
        .update_step_goal(&demo.steps[0], "anything")
        .await
        .unwrap_err();
    assert!(err.is_gateway());
    assert_eq!(
        fixture.surface.messages(),
        ["Update user goal failed: row-level security violation"]
    );
}

fn run<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
        .block_on(future)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_even_toggles_leave_links_unchanged(
        step_idx in 0usize..5,
        persona_idx in 0usize..3,
        rounds in 1usize..4,
    ) {
        run(async {
            let (fixture, demo) = demo_fixture().await;
            let step: RecordId = demo.steps[step_idx].clone();
            let persona = demo.personas[persona_idx].clone();
            let before = fixture.controller.read(|s| s.step(&step).unwrap().has_persona(&persona));

            for _ in 0..rounds * 2 {
                fixture.controller.toggle_persona(&step, &persona).await.unwrap();
            }

            let after = fixture.controller.read(|s| s.step(&step).unwrap().has_persona(&persona));
            assert_eq!(before, after);
        });
    }
}
