//! Plain-text rendering of the journey and its reports

use journey_core::{AppState, JourneyStep};
use journey_report::{
    format_metric_goal, CfpEntry, JourneyOverview, PainPointReport, PersonaSummary,
    TouchpointReport,
};
use std::fmt::{self, Write};

pub(crate) fn overview(out: &mut String, overview: &JourneyOverview) -> fmt::Result {
    writeln!(
        out,
        "{} stages, {} steps, {} of {} personas active, {} pain points, {} touchpoints, {} metrics",
        overview.stages,
        overview.steps,
        overview.active_personas,
        overview.personas,
        overview.pain_points,
        overview.touchpoints,
        overview.metrics,
    )
}

/// Full tree, one block per stage
pub(crate) fn tree(out: &mut String, state: &AppState) -> fmt::Result {
    if state.stages.is_empty() {
        return writeln!(out, "(no stages)");
    }
    for stage in &state.stages {
        writeln!(
            out,
            "\n{}. {} [{}]",
            stage.stage.order, stage.stage.name, stage.stage.id
        )?;
        if stage.steps.is_empty() {
            writeln!(out, "   (no steps)")?;
        }
        for step in &stage.steps {
            step_block(out, step)?;
        }
    }
    Ok(())
}

fn step_block(out: &mut String, step: &JourneyStep) -> fmt::Result {
    writeln!(
        out,
        "   - {} -> {} [{}]",
        step.step.user_action, step.step.user_goal, step.step.id
    )?;
    if !step.personas.is_empty() {
        let names: Vec<_> = step.personas.iter().map(|p| p.name.as_str()).collect();
        writeln!(out, "     personas: {}", names.join(", "))?;
    }
    for pain in &step.pain_points {
        let severity = pain.severity.map_or("none", |s| s.as_str());
        writeln!(out, "     pain [{severity}]: {}", pain.description)?;
    }
    for touch in &step.touchpoints {
        write!(out, "     touchpoint [{}]: {}", touch.touchpoint_type, touch.title)?;
        match &touch.content_url {
            Some(url) => writeln!(out, " <{url}>")?,
            None => writeln!(out)?,
        }
    }
    for metric in &step.metrics {
        writeln!(
            out,
            "     metric: {} = {} ({})",
            metric.metric_name,
            format_metric_goal(metric),
            metric.measurement_type
        )?;
    }
    if let Some(audit) = step.audits.first() {
        writeln!(
            out,
            "     last change: {} by {}: {}",
            audit.created_at.format("%Y-%m-%d %H:%M"),
            audit.changed_by,
            audit.change_description
        )?;
    }
    Ok(())
}

pub(crate) fn personas(out: &mut String, summary: &[PersonaSummary]) -> fmt::Result {
    for stage in summary {
        writeln!(out, "{}: {} personas", stage.stage_name, stage.count())?;
        for name in &stage.personas {
            writeln!(out, "  - {name}")?;
        }
    }
    Ok(())
}

pub(crate) fn pain_points(out: &mut String, report: &PainPointReport) -> fmt::Result {
    let counts: Vec<_> = report
        .by_severity
        .iter()
        .map(|(bucket, n)| format!("{bucket}={n}"))
        .collect();
    writeln!(out, "{} pain points ({})", report.rows.len(), counts.join(", "))?;
    for row in &report.rows {
        let severity = row.pain_point.severity.map_or("none", |s| s.as_str());
        writeln!(
            out,
            "  [{severity}] {} / {}: {}",
            row.stage_name, row.user_action, row.pain_point.description
        )?;
    }
    Ok(())
}

pub(crate) fn touchpoints(out: &mut String, report: &TouchpointReport) -> fmt::Result {
    let counts: Vec<_> = report
        .by_type
        .iter()
        .filter(|(_, n)| **n > 0)
        .map(|(kind, n)| format!("{kind}={n}"))
        .collect();
    writeln!(out, "{} touchpoints ({})", report.rows.len(), counts.join(", "))?;
    for row in &report.rows {
        writeln!(
            out,
            "  [{}] {} / {}: {}",
            row.touchpoint.touchpoint_type, row.stage_name, row.user_action, row.touchpoint.title
        )?;
    }
    Ok(())
}

pub(crate) fn schedule(out: &mut String, entries: &[CfpEntry]) -> fmt::Result {
    if entries.is_empty() {
        return writeln!(out, "(no CFP submissions)");
    }
    for entry in entries {
        let s = &entry.submission;
        let urgent = entry.status.as_ref().is_ok_and(|st| st.is_urgent());
        writeln!(
            out,
            "{} {:<14} {} - {} ({})",
            if urgent { "!" } else { " " },
            entry.label(),
            s.conference_name,
            s.talk_title,
            s.status.as_deref().unwrap_or("unknown"),
        )?;
    }
    Ok(())
}
