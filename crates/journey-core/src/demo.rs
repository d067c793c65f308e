//! Demo journey seeding
//!
//! Writes a small but complete journey through any [`Gateway`]: three
//! stages, steps with shared personas, and a mix of pain points,
//! touchpoints and metrics. Used by the CLI's demo mode and by tests.

use crate::error::GatewayError;
use crate::gateway::{to_row, Collection, Gateway};
use crate::types::{MeasurementType, RecordId, Severity, TouchpointType};
use serde_json::{json, Value};

/// Ids of the seeded records
#[derive(Debug, Clone)]
pub struct DemoJourney {
    pub stages: Vec<RecordId>,
    pub steps: Vec<RecordId>,
    pub personas: Vec<RecordId>,
}

async fn put(
    gateway: &dyn Gateway,
    collection: Collection,
    value: Value,
) -> Result<RecordId, GatewayError> {
    let row = to_row(collection, &value)?;
    gateway.insert(collection, row).await
}

/// Seed the demo journey
///
/// # Errors
/// - the first gateway error encountered; earlier writes are not rolled back
pub async fn seed_demo(gateway: &dyn Gateway) -> Result<DemoJourney, GatewayError> {
    let mut personas = Vec::new();
    for (name, role) in [
        ("Backend Developer", "Individual contributor"),
        ("Engineering Manager", "Buyer"),
        ("Platform Engineer", "Operator"),
    ] {
        personas.push(
            put(
                gateway,
                Collection::Personas,
                json!({ "name": name, "role": role }),
            )
            .await?,
        );
    }

    let mut stages = Vec::new();
    for (order, name) in [(1, "Discover"), (2, "Evaluate"), (3, "Adopt")] {
        stages.push(
            put(
                gateway,
                Collection::Stages,
                json!({ "name": name, "order": order }),
            )
            .await?,
        );
    }

    let step_specs = [
        (0, "Searches for a managed queue", "Find a tool that fits the stack", vec![0, 1]),
        (0, "Reads a comparison blog post", "Understand trade-offs", vec![0]),
        (1, "Runs the quickstart", "See it working locally", vec![0, 2]),
        (1, "Reviews pricing", "Estimate monthly cost", vec![1]),
        (2, "Deploys to staging", "Validate with real traffic", vec![2, 0]),
    ];

    let mut steps = Vec::new();
    for (stage_idx, action, goal, persona_idx) in step_specs {
        let step = put(
            gateway,
            Collection::Steps,
            json!({
                "stage_id": stages[stage_idx].as_str(),
                "user_action": action,
                "user_goal": goal,
            }),
        )
        .await?;
        for idx in persona_idx {
            put(
                gateway,
                Collection::PersonaSteps,
                json!({ "persona_id": personas[idx].as_str(), "step_id": step.as_str() }),
            )
            .await?;
        }
        steps.push(step);
    }

    let pain_points = [
        (0, "Hard to tell \"managed\" from self-hosted offerings", Some(Severity::Medium)),
        (2, "Quickstart assumes Docker, which is blocked on corporate laptops", Some(Severity::High)),
        (3, "Pricing page hides egress costs", Some(Severity::High)),
        (4, "Staging credentials expire without warning", None),
    ];
    for (step_idx, description, severity) in pain_points {
        put(
            gateway,
            Collection::PainPoints,
            json!({
                "step_id": steps[step_idx].as_str(),
                "description": description,
                "severity": severity,
            }),
        )
        .await?;
    }

    let touchpoints = [
        (1, "Queues compared, 2026 edition", TouchpointType::BlogPost, Some("https://example.com/blog/queues")),
        (2, "Five minute quickstart", TouchpointType::VideoTutorial, None),
        (2, "Getting started", TouchpointType::Docs, Some("https://example.com/docs/start")),
        (4, "Production checklist", TouchpointType::Webinar, None),
    ];
    for (step_idx, title, kind, url) in touchpoints {
        put(
            gateway,
            Collection::Touchpoints,
            json!({
                "step_id": steps[step_idx].as_str(),
                "title": title,
                "touchpoint_type": kind,
                "content_url": url,
            }),
        )
        .await?;
    }

    let metrics = [
        (0, "Organic search visits", Some(25000.0), MeasurementType::Count),
        (2, "Quickstart completion", Some(60.0), MeasurementType::Percentage),
        (4, "Time to first deploy", None, MeasurementType::Duration),
    ];
    for (step_idx, name, goal, kind) in metrics {
        put(
            gateway,
            Collection::Metrics,
            json!({
                "step_id": steps[step_idx].as_str(),
                "metric_name": name,
                "metric_goal": goal,
                "measurement_type": kind,
            }),
        )
        .await?;
    }

    let cfps = [
        ("RustConf", "Typed dashboards without the ceremony", "2026-06-01"),
        ("KubeCon", "Queues at the edge", "2026-12-15"),
    ];
    for (conference, title, deadline) in cfps {
        put(
            gateway,
            Collection::CfpSubmissions,
            json!({
                "conference_name": conference,
                "talk_title": title,
                "deadline": deadline,
                "status": "draft",
            }),
        )
        .await?;
    }

    tracing::info!(
        stages = stages.len(),
        steps = steps.len(),
        personas = personas.len(),
        "demo journey seeded"
    );
    Ok(DemoJourney {
        stages,
        steps,
        personas,
    })
}
