use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use journey_core::{
    fetch_cfp_submissions, gateway_from_config, seed_demo, Gateway, InMemoryGateway,
    JourneyConfig, JourneyController, RecordId, TracingSurface,
};
use journey_report::{
    cfp_schedule, journey_overview, pain_point_report, pain_points_csv, persona_summary,
    touchpoint_report, touchpoints_csv, write_export, ReportScope,
};
use std::path::PathBuf;
use std::sync::Arc;

mod logging;
mod render;

fn stage_arg() -> Arg {
    Arg::new("stage")
        .long("stage")
        .value_name("ID")
        .help("Limit to one stage")
}

fn cli() -> Command {
    Command::new("journeyctl")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Inspect, report on and export the developer journey")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
        .arg(
            Arg::new("demo")
                .long("demo")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Use a seeded in-memory store instead of the configured gateway"),
        )
        .subcommand(Command::new("show").about("Print the journey tree"))
        .subcommand(
            Command::new("report")
                .about("Print a report")
                .arg(
                    Arg::new("kind")
                        .required(true)
                        .value_parser(["personas", "pain-points", "touchpoints"]),
                )
                .arg(stage_arg())
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        )
        .subcommand(
            Command::new("export")
                .about("Write a CSV export")
                .arg(
                    Arg::new("kind")
                        .required(true)
                        .value_parser(["pain-points", "touchpoints"]),
                )
                .arg(stage_arg())
                .arg(
                    Arg::new("out")
                        .long("out")
                        .value_name("DIR")
                        .value_parser(value_parser!(PathBuf))
                        .help("Output directory (default: export_dir from config, else .)"),
                ),
        )
        .subcommand(
            Command::new("deadlines")
                .about("Print the CFP submission schedule")
                .arg(
                    Arg::new("today")
                        .long("today")
                        .value_name("YYYY-MM-DD")
                        .value_parser(|s: &str| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
                        .help("Classify against this date instead of today's local date"),
                ),
        )
        .subcommand(
            Command::new("seed-demo").about("Insert the demo journey through the controller"),
        )
}

struct Session {
    config: JourneyConfig,
    gateway: Option<Arc<dyn Gateway>>,
    controller: JourneyController,
}

impl Session {
    async fn open(matches: &ArgMatches) -> Result<Self> {
        let path = matches.get_one::<PathBuf>("config");
        let config = JourneyConfig::load(path.map(PathBuf::as_path))
            .context("failed to load configuration")?;

        let gateway: Option<Arc<dyn Gateway>> = if matches.get_flag("demo") {
            let memory = Arc::new(InMemoryGateway::new());
            seed_demo(memory.as_ref()).await?;
            let memory: Arc<dyn Gateway> = memory;
            Some(memory)
        } else {
            gateway_from_config(&config)?
        };

        let surface = Arc::new(TracingSurface::default());
        let controller = JourneyController::new(gateway.clone(), surface)
            .with_placeholders(config.placeholders.clone());
        Ok(Self {
            config,
            gateway,
            controller,
        })
    }

    fn gateway(&self) -> Result<&dyn Gateway> {
        match &self.gateway {
            Some(gateway) => Ok(gateway.as_ref()),
            None => bail!(
                "no gateway configured: set {} and {}, or pass --demo",
                journey_core::config::ENV_GATEWAY_URL,
                journey_core::config::ENV_GATEWAY_KEY
            ),
        }
    }

    async fn load(&self) -> Result<()> {
        self.gateway()?;
        if !self.controller.refresh().await {
            tracing::warn!("journey loaded incompletely; see errors above");
        }
        Ok(())
    }
}

/// `--today`, else the local calendar date
fn today(args: &ArgMatches) -> NaiveDate {
    args.get_one::<NaiveDate>("today")
        .copied()
        .unwrap_or_else(|| Local::now().date_naive())
}

fn scope(args: &ArgMatches) -> ReportScope {
    ReportScope::from_stage(args.get_one::<String>("stage").map(|s| RecordId::new(s.as_str())))
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    logging::init(matches.get_flag("log-json"));

    let session = Session::open(&matches).await?;
    let mut out = String::new();

    match matches.subcommand() {
        Some(("show", _)) => {
            session.load().await?;
            let state = session.controller.state();
            render::overview(&mut out, &journey_overview(&state.stages, &state.personas))?;
            render::tree(&mut out, &state)?;
        }
        Some(("report", args)) => {
            session.load().await?;
            let state = session.controller.state();
            let scope = scope(args);
            let json = args.get_flag("json");
            match args.get_one::<String>("kind").map(String::as_str) {
                Some("personas") => {
                    let summary = persona_summary(&state.stages, &scope)?;
                    if json {
                        out = serde_json::to_string_pretty(&summary)?;
                    } else {
                        render::personas(&mut out, &summary)?;
                    }
                }
                Some("pain-points") => {
                    let report = pain_point_report(&state.stages, &scope)?;
                    if json {
                        out = serde_json::to_string_pretty(&report)?;
                    } else {
                        render::pain_points(&mut out, &report)?;
                    }
                }
                Some("touchpoints") => {
                    let report = touchpoint_report(&state.stages, &scope)?;
                    if json {
                        out = serde_json::to_string_pretty(&report)?;
                    } else {
                        render::touchpoints(&mut out, &report)?;
                    }
                }
                other => bail!("unknown report {other:?}"),
            }
        }
        Some(("export", args)) => {
            session.load().await?;
            let state = session.controller.state();
            let scope = scope(args);
            let export = match args.get_one::<String>("kind").map(String::as_str) {
                Some("pain-points") => {
                    pain_points_csv(&pain_point_report(&state.stages, &scope)?.rows)
                }
                Some("touchpoints") => {
                    touchpoints_csv(&touchpoint_report(&state.stages, &scope)?.rows)
                }
                other => bail!("unknown export {other:?}"),
            };
            let dir = args
                .get_one::<PathBuf>("out")
                .cloned()
                .or_else(|| session.config.export_dir.clone())
                .unwrap_or_else(|| PathBuf::from("."));
            let path = write_export(&dir, &export)?;
            out = format!("wrote {}\n", path.display());
        }
        Some(("deadlines", args)) => {
            let submissions = fetch_cfp_submissions(session.gateway()?).await?;
            render::schedule(&mut out, &cfp_schedule(submissions, today(args)))?;
        }
        Some(("seed-demo", _)) => {
            session.gateway()?;
            let demo = session.controller.seed_demo().await?;
            out = format!(
                "seeded {} stages, {} steps, {} personas\n",
                demo.stages.len(),
                demo.steps.len(),
                demo.personas.len()
            );
        }
        _ => bail!("no command given; see --help"),
    }

    print!("{out}");
    if !out.ends_with('\n') {
        println!();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        cli().debug_assert();
    }

    #[test]
    fn parses_report_with_stage() {
        let matches = cli()
            .try_get_matches_from([
                "journeyctl",
                "--demo",
                "report",
                "touchpoints",
                "--stage",
                "st1",
            ])
            .unwrap();
        assert!(matches.get_flag("demo"));
        let (name, args) = matches.subcommand().unwrap();
        assert_eq!(name, "report");
        assert_eq!(scope(args), ReportScope::Stage("st1".into()));
    }

    #[test]
    fn rejects_bad_dates() {
        let result = cli().try_get_matches_from(["journeyctl", "deadlines", "--today", "May 5"]);
        assert!(result.is_err());
    }

    #[test]
    fn today_defaults_to_local_date() {
        let matches = cli().try_get_matches_from(["journeyctl", "deadlines"]).unwrap();
        let (_, args) = matches.subcommand().unwrap();
        let before = Local::now().date_naive();
        let resolved = today(args);
        let after = Local::now().date_naive();
        assert!(resolved == before || resolved == after);

        let matches = cli()
            .try_get_matches_from(["journeyctl", "deadlines", "--today", "2026-05-20"])
            .unwrap();
        let (_, args) = matches.subcommand().unwrap();
        assert_eq!(today(args), NaiveDate::from_ymd_opt(2026, 5, 20).unwrap());
    }

    #[tokio::test]
    async fn seed_demo_goes_through_controller() {
        let gateway: Arc<dyn Gateway> = Arc::new(InMemoryGateway::new());
        let session = Session {
            config: JourneyConfig::new(),
            gateway: Some(gateway.clone()),
            controller: JourneyController::new(
                Some(gateway),
                Arc::new(TracingSurface::default()),
            ),
        };
        let demo = session.controller.seed_demo().await.unwrap();
        assert_eq!(demo.stages.len(), 3);
        assert_eq!(session.controller.state().stages.len(), 3);
    }

    #[tokio::test]
    async fn demo_session_loads() {
        let matches = cli().try_get_matches_from(["journeyctl", "--demo", "show"]).unwrap();
        let session = Session::open(&matches).await.unwrap();
        session.load().await.unwrap();
        assert_eq!(session.controller.state().stages.len(), 3);
    }

    #[tokio::test]
    async fn unconfigured_session_refuses_to_load() {
        let session = Session {
            config: JourneyConfig::new(),
            gateway: None,
            controller: JourneyController::new(None, Arc::new(TracingSurface::default())),
        };
        assert!(session.load().await.is_err());
    }
}
