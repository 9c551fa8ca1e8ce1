//! ruz - HSE RUZ timetable CLI.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde_json::Value as JsonValue;
use tracing::instrument;
use tracing_subscriber::filter::EnvFilter;
#[cfg(not(feature = "otel"))]
use tracing_subscriber::fmt;
#[cfg(feature = "otel")]
use tracing_subscriber::layer::SubscriberExt;
#[cfg(feature = "otel")]
use tracing_subscriber::util::SubscriberInitExt;
use url::Url;

use ruz_api::ruz::{
    Language, Lesson, LocalRuzApi, PersonType, RuzClient, ScheduleParams, SearchType,
    student_schedule,
};

/// CLI argument parser.
#[derive(Parser)]
#[command(about, version)]
struct Cli {
    /// Override the API base URL (default: `http://ruz.hse.ru/api/`).
    #[arg(long, global = true)]
    base_url: Option<Url>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Search students, lecturers, groups or auditoriums.
    Search(SearchArgs),
    /// Resolve a student by email.
    Info(InfoArgs),
    /// Fetch the schedule of a student or lecturer by ID.
    Schedule(ScheduleArgs),
    /// Fetch a student's schedule by email.
    StudentSchedule(StudentScheduleArgs),
}

/// Arguments for the `search` subcommand.
#[derive(clap::Args)]
struct SearchArgs {
    /// Search query (e.g. "Иванов").
    #[arg(long, required = true)]
    query: String,
    /// Entity type: student, lecturer, group or auditorium.
    #[arg(long = "type", default_value = "student")]
    search_type: SearchType,
}

/// Arguments for the `info` subcommand.
#[derive(clap::Args)]
struct InfoArgs {
    /// Student email (e.g. "iivanov@edu.hse.ru").
    #[arg(long, required = true)]
    email: String,
}

/// Date window and language shared by schedule subcommands.
#[derive(clap::Args)]
struct WindowArgs {
    /// First day, "YYYY-MM-DD" (default: today).
    #[arg(long)]
    from: Option<NaiveDate>,
    /// Last day, "YYYY-MM-DD" (default: first day + 7 days).
    #[arg(long, conflicts_with = "days")]
    to: Option<NaiveDate>,
    /// Window length in days counted from the first day.
    #[arg(long, allow_negative_numbers = true)]
    days: Option<i64>,
    /// Response language: ru or en.
    #[arg(long, default_value = "ru")]
    language: Language,
}

/// Arguments for the `schedule` subcommand.
#[derive(clap::Args)]
struct ScheduleArgs {
    /// Person type: student or lecturer.
    #[arg(long = "type", required = true)]
    person_type: PersonType,
    /// RUZ person ID.
    #[arg(long, required = true)]
    id: u64,
    /// Date window.
    #[command(flatten)]
    window: WindowArgs,
}

/// Arguments for the `student-schedule` subcommand.
#[derive(clap::Args)]
struct StudentScheduleArgs {
    /// Student email (e.g. "iivanov@edu.hse.ru").
    #[arg(long, required = true)]
    email: String,
    /// Date window.
    #[command(flatten)]
    window: WindowArgs,
}

impl WindowArgs {
    /// Converts CLI flags into request parameters.
    fn to_params(&self) -> ScheduleParams {
        let mut params = ScheduleParams::new().language(self.language);
        if let Some(from) = self.from {
            params = params.start(from);
        }
        if let Some(to) = self.to {
            params = params.until(to);
        } else if let Some(days) = self.days {
            params = params.days(days);
        }
        params
    }
}

/// Builds the API client, honoring `--base-url`.
fn build_client(base_url: Option<Url>) -> Result<RuzClient> {
    let mut builder = RuzClient::builder().user_agent(concat!(
        env!("CARGO_PKG_NAME"),
        "/",
        env!("CARGO_PKG_VERSION")
    ));
    if let Some(url) = base_url {
        builder = builder.base_url(url);
    }
    builder.build().context("failed to build API client")
}

/// Renders one search hit as a tab-separated line.
fn format_search_hit(hit: &JsonValue) -> String {
    let field = |key: &str| match hit.get(key) {
        Some(JsonValue::String(s)) => s.clone(),
        Some(JsonValue::Null) | None => String::from("-"),
        Some(other) => other.to_string(),
    };
    format!(
        "{}\t{}\t{}",
        field("id"),
        field("label"),
        field("description")
    )
}

/// Logs lessons as a table.
fn print_lessons(lessons: &[Lesson]) {
    tracing::info!("Start\t\t\t\tEnd\tDiscipline\tKind\tAuditorium\tLecturer");
    for lesson in lessons {
        let start = lesson.starts_at().map_or_else(
            |e| {
                tracing::warn!("{e}");
                format!("{} {}", lesson.date, lesson.begin_lesson)
            },
            |dt| dt.to_rfc3339(),
        );
        tracing::info!(
            "{}\t{}\t{}\t{}\t{}\t{}{}",
            start,
            lesson.end_lesson.format("%H:%M"),
            lesson.discipline,
            lesson.kind_of_work,
            lesson.auditorium,
            lesson.lecturer,
            if lesson.is_ban { "\t(cancelled)" } else { "" },
        );
    }
    tracing::info!("Total: {} lessons", lessons.len());
}

/// Runs the `search` subcommand.
#[instrument(skip_all)]
async fn run_search(args: &SearchArgs, base_url: Option<Url>) -> Result<()> {
    let client = build_client(base_url)?;
    let hits = client
        .search(&args.query, args.search_type)
        .await
        .context("failed to search")?;

    tracing::info!("ID\tLabel\tDescription");
    for hit in &hits {
        tracing::info!("{}", format_search_hit(hit));
    }
    tracing::info!("Total: {} results", hits.len());

    Ok(())
}

/// Runs the `info` subcommand.
#[instrument(skip_all)]
async fn run_info(args: &InfoArgs, base_url: Option<Url>) -> Result<()> {
    let client = build_client(base_url)?;
    let info = client
        .student_info(&args.email)
        .await
        .context("failed to fetch student info")?;

    tracing::info!("ID:\t{}", info.id);
    tracing::info!("Name:\t{}", info.fio);
    tracing::info!("Email:\t{}", info.email);
    tracing::info!("UNS:\t{}", info.uns.as_deref().unwrap_or("-"));
    tracing::info!("Info:\t{}", info.info.as_deref().unwrap_or("-"));

    Ok(())
}

/// Runs the `schedule` subcommand.
#[instrument(skip_all)]
async fn run_schedule(args: &ScheduleArgs, base_url: Option<Url>) -> Result<()> {
    let client = build_client(base_url)?;
    let lessons = client
        .schedule(args.person_type, args.id, &args.window.to_params())
        .await
        .context("failed to fetch schedule")?;

    print_lessons(&lessons);
    Ok(())
}

/// Runs the `student-schedule` subcommand.
#[instrument(skip_all)]
async fn run_student_schedule(args: &StudentScheduleArgs, base_url: Option<Url>) -> Result<()> {
    let client = build_client(base_url)?;
    let lessons = student_schedule(&client, &args.email, &args.window.to_params())
        .await
        .context("failed to fetch student schedule")?;

    print_lessons(&lessons);
    Ok(())
}

/// Entry point.
///
/// # Errors
///
/// Returns an error if subcommand execution fails.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    #[cfg(not(feature = "otel"))]
    {
        fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_target(false)
            .init();
    }

    #[cfg(feature = "otel")]
    {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);

        let otel_layer = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
            .ok()
            .and_then(|_| {
                let exporter = opentelemetry_otlp::SpanExporter::builder()
                    .with_http()
                    .build()
                    .ok()?;

                let tracer_provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
                    .with_simple_exporter(exporter)
                    .build();

                let tracer = opentelemetry::trace::TracerProvider::tracer(
                    &tracer_provider,
                    env!("CARGO_PKG_NAME"),
                );
                opentelemetry::global::set_tracer_provider(tracer_provider);

                Some(tracing_opentelemetry::layer().with_tracer(tracer))
            });

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .with(otel_layer)
            .init();
    }

    let cli = Cli::parse();
    match cli.command {
        Commands::Search(args) => run_search(&args, cli.base_url).await,
        Commands::Info(args) => run_info(&args, cli.base_url).await,
        Commands::Schedule(args) => run_schedule(&args, cli.base_url).await,
        Commands::StudentSchedule(args) => run_student_schedule(&args, cli.base_url).await,
    }
}
